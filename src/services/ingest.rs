use crate::db::models::{BatchKind, KycRecord, RecordStatus};
use crate::errors::ApiError;
use crate::validation;
use crate::Result;
use calamine::{Data, Reader, Xlsx};
use serde_json::{Map, Value};
use std::io::Cursor;

/// Spreadsheet columns the importer recognizes; anything else is carried
/// through as an extra field
#[derive(Debug, Clone, PartialEq, Eq)]
enum Column {
    HolderName,
    Pan,
    Aadhaar,
    Email,
    Phone,
    DateOfBirth,
    Extra(String),
}

/// One spreadsheet row mapped to record fields, before validation
#[derive(Debug, Default, Clone)]
pub struct RecordDraft {
    pub row_index: i32,
    pub holder_name: String,
    pub pan_number: Option<String>,
    pub aadhaar_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub extra_fields: Option<Value>,
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

fn map_header(header: &str) -> Column {
    match normalize_header(header).as_str() {
        "name" | "holdername" | "fullname" | "nameasperpan" => Column::HolderName,
        "pan" | "pannumber" | "panno" => Column::Pan,
        "aadhaar" | "aadhaarnumber" | "aadhaarno" | "aadhar" | "aadharnumber" | "aadharno" => {
            Column::Aadhaar
        }
        "email" | "emailid" => Column::Email,
        "phone" | "phonenumber" | "mobile" | "mobilenumber" => Column::Phone,
        "dob" | "dateofbirth" => Column::DateOfBirth,
        _ => Column::Extra(header.trim().to_string()),
    }
}

/// Parses an uploaded spreadsheet into record drafts.
///
/// The first row is the header row. Rows that are entirely empty are
/// skipped; everything else becomes a draft, valid or not, so the caller
/// can persist invalid rows with a remark instead of silently dropping
/// them.
pub fn parse_upload(
    file_name: &str,
    bytes: &[u8],
    kind: BatchKind,
    max_rows: usize,
) -> Result<Vec<RecordDraft>> {
    let extension = file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    let (headers, rows) = match extension.as_str() {
        "xlsx" | "xlsm" => read_xlsx(bytes)?,
        "csv" => read_csv(bytes)?,
        other => {
            return Err(ApiError::Ingest(format!(
                "Unsupported file type: .{other}"
            )))
        }
    };

    rows_to_drafts(&headers, rows, kind, max_rows)
}

fn read_xlsx(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ApiError::Ingest("Workbook has no worksheets".to_string()))??;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|row| row.iter().map(cell_to_string).collect())
        .unwrap_or_default();
    let data = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok((headers, data))
}

fn read_csv(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let mut data = Vec::new();
    for row in reader.records() {
        let row = row?;
        data.push(row.iter().map(|cell| cell.trim().to_string()).collect());
    }

    Ok((headers, data))
}

/// Renders a spreadsheet cell the way the operator typed it. Identity
/// numbers arrive as numeric cells, so integral floats must not keep a
/// trailing `.0`.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn rows_to_drafts(
    headers: &[String],
    rows: Vec<Vec<String>>,
    kind: BatchKind,
    max_rows: usize,
) -> Result<Vec<RecordDraft>> {
    let columns: Vec<Column> = headers.iter().map(|header| map_header(header)).collect();

    let has_pan = columns.contains(&Column::Pan);
    let has_aadhaar = columns.contains(&Column::Aadhaar);
    let has_name = columns.contains(&Column::HolderName);

    match kind {
        BatchKind::PanKyc if !has_pan || !has_name => {
            return Err(ApiError::Ingest(
                "PAN KYC uploads require a name column and a PAN column".to_string(),
            ))
        }
        BatchKind::AadhaarPan if !has_pan || !has_aadhaar => {
            return Err(ApiError::Ingest(
                "Aadhaar-PAN uploads require both an Aadhaar column and a PAN column".to_string(),
            ))
        }
        _ => {}
    }

    let mut drafts = Vec::new();
    for (index, row) in rows.into_iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        // Spreadsheet row number: 1-based, after the header row
        let mut draft = RecordDraft {
            row_index: (index + 2) as i32,
            ..RecordDraft::default()
        };
        let mut extra = Map::new();

        for (column, value) in columns.iter().zip(row.into_iter()) {
            if value.is_empty() {
                continue;
            }
            match column {
                Column::HolderName => draft.holder_name = value,
                Column::Pan => draft.pan_number = Some(value.to_uppercase()),
                Column::Aadhaar => draft.aadhaar_number = Some(value),
                Column::Email => draft.email = Some(value),
                Column::Phone => draft.phone = Some(value),
                Column::DateOfBirth => draft.date_of_birth = Some(value),
                Column::Extra(name) => {
                    extra.insert(name.clone(), Value::String(value));
                }
            }
        }

        if !extra.is_empty() {
            draft.extra_fields = Some(Value::Object(extra));
        }
        drafts.push(draft);
    }

    if drafts.is_empty() {
        return Err(ApiError::Ingest(
            "The uploaded file contains no data rows".to_string(),
        ));
    }
    if drafts.len() > max_rows {
        return Err(ApiError::Ingest(format!(
            "The uploaded file has {} data rows, more than the limit of {max_rows}",
            drafts.len()
        )));
    }

    Ok(drafts)
}

/// Turns a draft into a persistable record, applying field validation.
/// Rows that fail validation are stored as `invalid` with a remark naming
/// the failing field, so the operator sees them in the batch listing.
pub fn draft_into_record(
    draft: RecordDraft,
    batch_id: Option<String>,
    kind: BatchKind,
) -> KycRecord {
    let (status, remarks) = match validate_draft(&draft, kind) {
        Ok(()) => (RecordStatus::Pending, None),
        Err(reason) => (RecordStatus::Invalid, Some(reason)),
    };

    KycRecord {
        id: uuid::Uuid::new_v4().to_string(),
        batch_id,
        row_index: draft.row_index,
        holder_name: draft.holder_name,
        pan_number: draft.pan_number,
        aadhaar_number: draft.aadhaar_number,
        email: draft.email,
        phone: draft.phone,
        date_of_birth: draft.date_of_birth,
        extra_fields: draft.extra_fields,
        status: status.into(),
        remarks,
        verified_at: None,
        created_at: chrono::Utc::now().naive_utc(),
    }
}

fn validate_draft(draft: &RecordDraft, kind: BatchKind) -> std::result::Result<(), String> {
    match kind {
        BatchKind::PanKyc => {
            if draft.holder_name.trim().is_empty() {
                return Err("Holder name is missing".to_string());
            }
            let pan = draft
                .pan_number
                .as_deref()
                .ok_or_else(|| "PAN is missing".to_string())?;
            validation::validate_pan(pan)?;
        }
        BatchKind::AadhaarPan => {
            let pan = draft
                .pan_number
                .as_deref()
                .ok_or_else(|| "PAN is missing".to_string())?;
            validation::validate_pan(pan)?;
            let aadhaar = draft
                .aadhaar_number
                .as_deref()
                .ok_or_else(|| "Aadhaar number is missing".to_string())?;
            validation::validate_aadhaar(aadhaar)?;
        }
    }

    if let Some(email) = &draft.email {
        validation::validate_email(email)?;
    }
    if let Some(phone) = &draft.phone {
        validation::validate_phone(phone)?;
    }
    if let Some(dob) = &draft.date_of_birth {
        validation::validate_date_of_birth(dob)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_CSV: &str = "\
Name,PAN,Aadhaar,Email,Branch
Asha Devi,abcde1234f,234567890123,asha@example.com,Pune
Rohan Mehta,FGHIJ5678K,,rohan@example.com,Delhi
,,,,
Priya Nair,INVALIDPAN,345678901234,priya@example.com,Kochi
";

    #[test]
    fn test_header_mapping() {
        assert_eq!(map_header("Name"), Column::HolderName);
        assert_eq!(map_header("Name as per PAN"), Column::HolderName);
        assert_eq!(map_header("PAN Number"), Column::Pan);
        assert_eq!(map_header("Aadhar No"), Column::Aadhaar);
        assert_eq!(map_header("Mobile Number"), Column::Phone);
        assert_eq!(map_header("Date Of Birth"), Column::DateOfBirth);
        assert_eq!(
            map_header("Branch"),
            Column::Extra("Branch".to_string())
        );
    }

    #[test]
    fn test_parse_csv_upload() {
        let drafts =
            parse_upload("records.csv", SAMPLE_CSV.as_bytes(), BatchKind::PanKyc, 100).unwrap();

        // The fully-empty row is skipped
        assert_eq!(drafts.len(), 3);

        assert_eq!(drafts[0].row_index, 2);
        assert_eq!(drafts[0].holder_name, "Asha Devi");
        // PAN is uppercased on ingest
        assert_eq!(drafts[0].pan_number.as_deref(), Some("ABCDE1234F"));
        assert_eq!(
            drafts[0].extra_fields.as_ref().unwrap()["Branch"],
            "Pune"
        );

        assert_eq!(drafts[1].aadhaar_number, None);
        assert_eq!(drafts[2].row_index, 5);
    }

    #[test]
    fn test_parse_csv_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CSV.as_bytes()).unwrap();

        let bytes = std::fs::read(file.path()).unwrap();
        let drafts = parse_upload("records.csv", &bytes, BatchKind::PanKyc, 100).unwrap();
        assert_eq!(drafts.len(), 3);
    }

    #[test]
    fn test_missing_required_columns() {
        let csv = "Email,Branch\nasha@example.com,Pune\n";
        let err = parse_upload("records.csv", csv.as_bytes(), BatchKind::PanKyc, 100).unwrap_err();
        assert!(err.to_string().contains("PAN column"));

        let csv = "Name,PAN\nAsha,ABCDE1234F\n";
        let err =
            parse_upload("records.csv", csv.as_bytes(), BatchKind::AadhaarPan, 100).unwrap_err();
        assert!(err.to_string().contains("Aadhaar column"));
    }

    #[test]
    fn test_row_limit_and_empty_uploads() {
        let csv = "Name,PAN\nAsha,ABCDE1234F\nRohan,FGHIJ5678K\n";
        let err = parse_upload("records.csv", csv.as_bytes(), BatchKind::PanKyc, 1).unwrap_err();
        assert!(err.to_string().contains("limit"));

        let csv = "Name,PAN\n";
        let err = parse_upload("records.csv", csv.as_bytes(), BatchKind::PanKyc, 100).unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }

    #[test]
    fn test_unsupported_file_type() {
        let err = parse_upload("records.pdf", b"%PDF-", BatchKind::PanKyc, 100).unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }

    #[test]
    fn test_cell_to_string_numeric_identity() {
        // Aadhaar numbers come out of Excel as floats
        assert_eq!(cell_to_string(&Data::Float(234567890123.0)), "234567890123");
        assert_eq!(cell_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&Data::String("  ABCDE1234F ".to_string())), "ABCDE1234F");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn test_draft_into_record_validation() {
        let drafts =
            parse_upload("records.csv", SAMPLE_CSV.as_bytes(), BatchKind::PanKyc, 100).unwrap();

        let valid = draft_into_record(drafts[0].clone(), Some("b1".to_string()), BatchKind::PanKyc);
        assert_eq!(valid.status, "pending");
        assert!(valid.remarks.is_none());
        assert_eq!(valid.batch_id.as_deref(), Some("b1"));

        let invalid =
            draft_into_record(drafts[2].clone(), Some("b1".to_string()), BatchKind::PanKyc);
        assert_eq!(invalid.status, "invalid");
        assert!(invalid.remarks.unwrap().contains("Invalid PAN"));
    }
}
