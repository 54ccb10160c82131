use crate::schema::{batches, kyc_records, provider_logs};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone,
    Debug,
    Serialize,
    Deserialize,
    Insertable,
    Identifiable,
    Queryable,
    QueryableByName,
    AsChangeset,
)]
#[diesel(table_name = batches, primary_key(id))]
pub struct Batch {
    pub id: String,
    pub file_name: String,
    pub kind: String,
    pub total_rows: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
}

impl Batch {
    pub fn new(file_name: String, kind: BatchKind, total_rows: i32) -> Self {
        Batch {
            id: uuid::Uuid::new_v4().to_string(),
            file_name,
            kind: kind.as_str().to_string(),
            total_rows,
            status: BatchStatus::Processing.into(),
            created_at: Utc::now().naive_utc(),
        }
    }
}

#[derive(
    Clone,
    Debug,
    Serialize,
    Deserialize,
    Insertable,
    Identifiable,
    Queryable,
    QueryableByName,
    AsChangeset,
)]
#[diesel(table_name = kyc_records, primary_key(id))]
pub struct KycRecord {
    pub id: String,
    pub batch_id: Option<String>,
    pub row_index: i32,
    pub holder_name: String,
    pub pan_number: Option<String>,
    pub aadhaar_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub extra_fields: Option<serde_json::Value>,
    pub status: String,
    pub remarks: Option<String>,
    pub verified_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, Insertable, Queryable, AsChangeset)]
#[diesel(table_name = provider_logs, primary_key(id))]
pub struct ProviderLog {
    pub id: String,
    pub record_id: String,
    pub endpoint: String,
    pub outcome: String,
    pub message: String,
    pub created_at: NaiveDateTime,
}

/// Lifecycle status of a verification record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "verified")]
    Verified,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "invalid")]
    Invalid,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Processing => "processing",
            RecordStatus::Verified => "verified",
            RecordStatus::Failed => "failed",
            RecordStatus::Invalid => "invalid",
        }
    }
}

impl From<RecordStatus> for String {
    fn from(status: RecordStatus) -> Self {
        status.as_str().to_string()
    }
}

impl From<String> for RecordStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "pending" => RecordStatus::Pending,
            "processing" => RecordStatus::Processing,
            "verified" => RecordStatus::Verified,
            "failed" => RecordStatus::Failed,
            "invalid" => RecordStatus::Invalid,
            _ => panic!("Invalid record status"),
        }
    }
}

/// Aggregate status of a batch, derived from its records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "completed")]
    Completed,
}

impl From<BatchStatus> for String {
    fn from(status: BatchStatus) -> Self {
        match status {
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
        }
        .to_string()
    }
}

/// Which verification flow a batch belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchKind {
    #[serde(rename = "pan_kyc")]
    PanKyc,
    #[serde(rename = "aadhaar_pan")]
    AadhaarPan,
}

impl BatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchKind::PanKyc => "pan_kyc",
            BatchKind::AadhaarPan => "aadhaar_pan",
        }
    }
}

impl TryFrom<&str> for BatchKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pan_kyc" => Ok(BatchKind::PanKyc),
            "aadhaar_pan" => Ok(BatchKind::AadhaarPan),
            other => Err(format!("Unknown batch kind: {other}")),
        }
    }
}

/// Outcome tag for provider audit log rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCallOutcome {
    Success,
    Failure,
}

impl ProviderCallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderCallOutcome::Success => "success",
            ProviderCallOutcome::Failure => "failure",
        }
    }
}

/// Row shape for the per-batch status aggregation query
#[derive(Debug, QueryableByName)]
pub struct BatchStatusCount {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub batch_id: String,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub status: String,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub count: i64,
}

/// Row shape for COUNT(*) queries issued through sql_query
#[derive(Debug, QueryableByName)]
pub struct CountRow {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_status_round_trip() {
        for status in [
            RecordStatus::Pending,
            RecordStatus::Processing,
            RecordStatus::Verified,
            RecordStatus::Failed,
            RecordStatus::Invalid,
        ] {
            let as_string: String = status.into();
            assert_eq!(RecordStatus::from(as_string), status);
        }
    }

    #[test]
    fn test_batch_kind_parsing() {
        assert_eq!(BatchKind::try_from("pan_kyc"), Ok(BatchKind::PanKyc));
        assert_eq!(BatchKind::try_from("aadhaar_pan"), Ok(BatchKind::AadhaarPan));
        assert!(BatchKind::try_from("driving_license").is_err());
    }

    #[test]
    fn test_new_batch_starts_processing() {
        let batch = Batch::new("upload.xlsx".to_string(), BatchKind::PanKyc, 42);
        assert_eq!(batch.status, "processing");
        assert_eq!(batch.kind, "pan_kyc");
        assert_eq!(batch.total_rows, 42);
        assert!(!batch.id.is_empty());
    }
}
