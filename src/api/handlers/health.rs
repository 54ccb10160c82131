use crate::db::models::ApiResponse;
use crate::db::DbClient;
use crate::services::background_jobs::{job_health, BackgroundJobHealth};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

// Route handler for GET /health which reports liveness and background job health
pub(crate) async fn health(
    State(db): State<DbClient>,
) -> (StatusCode, Json<ApiResponse<BackgroundJobHealth>>) {
    let jobs = job_health(&db).await;
    (
        StatusCode::OK,
        Json(ApiResponse::success("Service is healthy", jobs)),
    )
}
