use crate::db::models::{ApiResponse, RecordDetailData};
use crate::db::DbClient;
use crate::errors::ErrorMessages;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::error;

// Route handler for GET /pan-kyc/records/:record_id which returns one
// record with its provider log trail
pub(crate) async fn get_record_detail(
    State(db): State<DbClient>,
    Path(record_id): Path<String>,
) -> (StatusCode, Json<ApiResponse<RecordDetailData>>) {
    let record = match db.get_record(&record_id).await {
        Ok(record) => record,
        Err(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::failure(
                    ErrorMessages::RecordNotFound.to_string(),
                )),
            )
        }
    };

    let provider_logs = db
        .get_logs_for_record(&record_id)
        .await
        .unwrap_or_else(|err| {
            error!("Failed to fetch provider logs for {}: {}", record_id, err);
            Vec::new()
        });

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            "Record retrieved",
            RecordDetailData {
                record,
                provider_logs,
            },
        )),
    )
}
