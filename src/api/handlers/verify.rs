use crate::db::models::{ApiResponse, BatchKind, VerifyQueuedData, VerifyRequest};
use crate::db::DbClient;
use crate::errors::ErrorMessages;
use crate::logging::log_to_file;
use crate::services::verification::queue_batch_verification;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::to_value;
use tracing::error;

/// Handler for queueing verification of a PAN KYC batch
///
/// # Endpoint: POST /pan-kyc/verify
///
/// Claims the batch's pending and failed records (optionally narrowed to
/// `record_ids`) and verifies them in the background. Responds immediately
/// with the number of records queued.
pub(crate) async fn verify_pan_batch(
    State(db): State<DbClient>,
    Json(payload): Json<VerifyRequest>,
) -> (StatusCode, Json<ApiResponse<VerifyQueuedData>>) {
    handle_verify(db, payload, BatchKind::PanKyc, "/pan-kyc/verify").await
}

/// Handler for queueing Aadhaar-PAN link checks for a batch
///
/// # Endpoint: POST /aadhaar-pan/verify
pub(crate) async fn verify_aadhaar_pan_batch(
    State(db): State<DbClient>,
    Json(payload): Json<VerifyRequest>,
) -> (StatusCode, Json<ApiResponse<VerifyQueuedData>>) {
    handle_verify(db, payload, BatchKind::AadhaarPan, "/aadhaar-pan/verify").await
}

async fn handle_verify(
    db: DbClient,
    payload: VerifyRequest,
    kind: BatchKind,
    route: &str,
) -> (StatusCode, Json<ApiResponse<VerifyQueuedData>>) {
    log_to_file("POST", route, to_value(&payload).ok().as_ref());

    let batch = match db.get_batch(&payload.batch_id).await {
        Ok(batch) => batch,
        Err(err) => {
            error!("Failed to load batch {}: {}", payload.batch_id, err);
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::failure(ErrorMessages::BatchNotFound.to_string())),
            );
        }
    };

    if batch.kind != kind.as_str() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::failure(ErrorMessages::KindMismatch.to_string())),
        );
    }

    match queue_batch_verification(&db, &batch, payload.record_ids).await {
        Ok(0) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                "No verifiable records in the batch",
                VerifyQueuedData {
                    batch_id: batch.id,
                    queued: 0,
                },
            )),
        ),
        Ok(queued) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                "Verification started",
                VerifyQueuedData {
                    batch_id: batch.id,
                    queued,
                },
            )),
        ),
        Err(err) => {
            error!("Error queueing verification: {:?}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure(ErrorMessages::DB.to_string())),
            )
        }
    }
}
