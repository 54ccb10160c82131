use crate::api::handlers::is_authorized;
use crate::db::batches::PER_PAGE;
use crate::db::models::{
    ApiResponse, BatchDetailData, BatchListData, BatchSummary, ListQuery, PaginationMeta,
};
use crate::db::DbClient;
use crate::errors::ErrorMessages;
use crate::logging::log_to_file;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use tracing::{error, info, warn};

/// Handler for listing batches
///
/// # Endpoint: GET /pan-kyc/batches
///
/// # Arguments
/// * `query` - Optional `page` (1-based) and `search` (file name filter)
///
/// # Returns
/// * Paginated batches, newest first, each with aggregated record counts
pub(crate) async fn get_batches_list(
    State(db): State<DbClient>,
    Query(query): Query<ListQuery>,
) -> (StatusCode, Json<ApiResponse<BatchListData>>) {
    let page = query.page.unwrap_or(1).max(1);

    let (batches, total) = match db.get_batches_page(page, query.search.as_deref()).await {
        Ok(result) => result,
        Err(err) => {
            error!("Failed to fetch batches: {}", err);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure(ErrorMessages::DB.to_string())),
            );
        }
    };

    let batch_ids: Vec<String> = batches.iter().map(|batch| batch.id.clone()).collect();
    let counts = db
        .get_batch_status_counts(&batch_ids)
        .await
        .unwrap_or_else(|err| {
            error!("Failed to aggregate batch counts: {}", err);
            Vec::new()
        });

    let summaries = batches
        .into_iter()
        .map(|batch| BatchSummary::from_batch(batch, &counts))
        .collect::<Vec<_>>();

    info!("Retrieved {} batches (page {})", summaries.len(), page);
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            "Batches retrieved",
            BatchListData {
                meta: PaginationMeta::new(total, page, PER_PAGE),
                batches: summaries,
            },
        )),
    )
}

/// Handler for one batch with its records
///
/// # Endpoint: GET /pan-kyc/batches/:batch_id
///
/// # Arguments
/// * `batch_id` - Batch to fetch
/// * `query` - Optional `page` and `search` (holder name / PAN / Aadhaar)
pub(crate) async fn get_batch_detail(
    State(db): State<DbClient>,
    Path(batch_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> (StatusCode, Json<ApiResponse<BatchDetailData>>) {
    let batch = match db.get_batch(&batch_id).await {
        Ok(batch) => batch,
        Err(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::failure(ErrorMessages::BatchNotFound.to_string())),
            )
        }
    };

    let page = query.page.unwrap_or(1).max(1);
    let (records, total) = match db
        .get_records_page(&batch_id, page, query.search.as_deref())
        .await
    {
        Ok(result) => result,
        Err(err) => {
            error!("Failed to fetch records for batch {}: {}", batch_id, err);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure(ErrorMessages::DB.to_string())),
            );
        }
    };

    let counts = db
        .get_batch_status_counts(std::slice::from_ref(&batch_id))
        .await
        .unwrap_or_else(|err| {
            error!("Failed to aggregate batch counts: {}", err);
            Vec::new()
        });

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            "Batch retrieved",
            BatchDetailData {
                batch: BatchSummary::from_batch(batch, &counts),
                meta: PaginationMeta::new(total, page, PER_PAGE),
                records,
            },
        )),
    )
}

/// Handler for deleting a batch with its records and log trail
///
/// # Endpoint: DELETE /pan-kyc/batches/:batch_id
///
/// # Security
/// Requires valid authorization header matching CONFIG.auth_secret
pub(crate) async fn delete_batch(
    State(db): State<DbClient>,
    Path(batch_id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<ApiResponse<Value>>) {
    log_to_file("DELETE", &format!("/pan-kyc/batches/{batch_id}"), None);

    if !is_authorized(&headers) {
        warn!(target: "save_to_log_file", "Unauthorized batch delete attempt");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::failure(
                "Missing or invalid authorization header",
            )),
        );
    }

    if db.get_batch(&batch_id).await.is_err() {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::failure(ErrorMessages::BatchNotFound.to_string())),
        );
    }

    match db.delete_batch(&batch_id).await {
        Ok(removed_records) => {
            info!(target: "save_to_log_file", "Deleted batch {} ({} records)", batch_id, removed_records);
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    "Batch deleted",
                    json!({
                        "batch_id": batch_id,
                        "records_removed": removed_records,
                    }),
                )),
            )
        }
        Err(err) => {
            error!("Failed to delete batch {}: {}", batch_id, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure(ErrorMessages::DB.to_string())),
            )
        }
    }
}
