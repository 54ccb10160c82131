use crate::db::models::{ApiResponse, Batch, BatchKind, KycRecord, RecordStatus, UploadData};
use crate::db::DbClient;
use crate::errors::ErrorMessages;
use crate::logging::log_to_file;
use crate::services::ingest;
use crate::{Result, CONFIG};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{error, info, warn};

/// Handler for uploading a PAN KYC spreadsheet
///
/// # Endpoint: POST /pan-kyc/upload
///
/// Accepts a multipart form with one `.xlsx` or `.csv` file field. Rows
/// become verification records in a new batch; rows failing validation are
/// stored as `invalid` with a remark.
pub(crate) async fn upload_pan_kyc(
    State(db): State<DbClient>,
    multipart: Multipart,
) -> (StatusCode, Json<ApiResponse<UploadData>>) {
    handle_upload(db, multipart, BatchKind::PanKyc, "/pan-kyc/upload").await
}

/// Handler for uploading an Aadhaar-PAN link check spreadsheet
///
/// # Endpoint: POST /aadhaar-pan/upload
pub(crate) async fn upload_aadhaar_pan(
    State(db): State<DbClient>,
    multipart: Multipart,
) -> (StatusCode, Json<ApiResponse<UploadData>>) {
    handle_upload(db, multipart, BatchKind::AadhaarPan, "/aadhaar-pan/upload").await
}

async fn handle_upload(
    db: DbClient,
    mut multipart: Multipart,
    kind: BatchKind,
    route: &str,
) -> (StatusCode, Json<ApiResponse<UploadData>>) {
    log_to_file("POST", route, None);

    let (file_name, bytes) = match read_file_field(&mut multipart).await {
        Ok(upload) => upload,
        Err(err) => {
            warn!("Rejected upload on {}: {}", route, err);
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::failure(ErrorMessages::InvalidUpload.to_string())),
            );
        }
    };

    let drafts = match ingest::parse_upload(&file_name, &bytes, kind, CONFIG.max_upload_rows) {
        Ok(drafts) => drafts,
        Err(err) => {
            warn!("Failed to parse upload {}: {}", file_name, err);
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::failure(format!(
                    "{} {}",
                    ErrorMessages::InvalidUpload, err
                ))),
            );
        }
    };

    let batch = Batch::new(file_name.clone(), kind, drafts.len() as i32);
    let records: Vec<KycRecord> = drafts
        .into_iter()
        .map(|draft| ingest::draft_into_record(draft, Some(batch.id.clone()), kind))
        .collect();

    let pending = records
        .iter()
        .filter(|record| record.status == RecordStatus::Pending.as_str())
        .count() as i64;
    let invalid = records.len() as i64 - pending;

    if let Err(err) = db.insert_batch(&batch).await {
        error!("Error inserting batch into database: {:?}", err);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::failure(ErrorMessages::DB.to_string())),
        );
    }
    if let Err(err) = db.insert_records(&records).await {
        error!("Error inserting records into database: {:?}", err);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::failure(ErrorMessages::DB.to_string())),
        );
    }

    // A batch with only invalid rows is already terminal
    if let Err(err) = db.refresh_batch_status(&batch.id).await {
        warn!("Failed to settle status of batch {}: {}", batch.id, err);
    }

    info!(
        "Created batch {} from {} with {} pending and {} invalid records",
        batch.id, file_name, pending, invalid
    );

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            "File uploaded successfully",
            UploadData {
                batch_id: batch.id,
                file_name,
                total_rows: records.len() as i64,
                pending,
                invalid,
            },
        )),
    )
}

/// Pulls the first file field out of the multipart payload
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") || field.file_name().is_some() {
            let file_name = field
                .file_name()
                .unwrap_or("upload.xlsx")
                .to_string();
            let bytes = field.bytes().await?;
            return Ok((file_name, bytes.to_vec()));
        }
    }
    Err(crate::errors::ApiError::Ingest(
        "No file field present in multipart payload".to_string(),
    ))
}
