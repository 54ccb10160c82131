use crate::db::DbClient;
use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::{Method, StatusCode},
    routing::{get, post},
    BoxError, Router,
};
use std::time::Duration;
use tower::{buffer::BufferLayer, limit::RateLimitLayer, ServiceBuilder};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use super::{handlers::*, index::index};

/// Spreadsheet uploads can exceed axum's default body limit
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn initialize_router(db: DbClient) -> Router {
    let error_handler = || {
        ServiceBuilder::new().layer(HandleErrorLayer::new(|err: BoxError| async move {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Unhandled error: {}", err),
            )
        }))
    };

    let global_rate_limit = |req_per_sec: u64| {
        ServiceBuilder::new()
            .layer(error_handler())
            .layer(BufferLayer::new(1024))
            .layer(RateLimitLayer::new(req_per_sec, Duration::from_secs(1)))
    };

    let rate_limit_per_ip = |timeout: u64, limit: u32| {
        let config = Box::new(
            GovernorConfigBuilder::default()
                .per_second(timeout)
                .burst_size(limit)
                .use_headers()
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .unwrap(),
        );

        ServiceBuilder::new()
            .layer(error_handler())
            .layer(GovernorLayer {
                config: Box::leak(config),
            })
    };

    let cors = |method: Method| {
        ServiceBuilder::new().layer(CorsLayer::new().allow_methods(method).allow_origin(Any))
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().include_headers(true))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Define routes with their rate limits
    Router::new()
        // Verification routes (stricter rate limits, they fan out to the provider)
        .route("/pan-kyc/verify", post(verify_pan_batch))
        .route("/aadhaar-pan/verify", post(verify_aadhaar_pan_batch))
        .route(
            "/aadhaar-verification/generate-otp",
            post(generate_aadhaar_otp),
        )
        .route(
            "/aadhaar-verification/verify-single",
            post(verify_aadhaar_single),
        )
        .layer(
            global_rate_limit(5)
                .layer(rate_limit_per_ip(30, 1))
                .layer(cors(Method::POST))
                .layer(CompressionLayer::new().zstd(true)),
        )
        // Upload routes carry spreadsheet payloads
        .route("/pan-kyc/upload", post(upload_pan_kyc))
        .route("/aadhaar-pan/upload", post(upload_aadhaar_pan))
        .layer(
            global_rate_limit(10)
                .layer(rate_limit_per_ip(10, 5))
                .layer(cors(Method::POST))
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        // Read routes
        .route("/pan-kyc/batches", get(get_batches_list))
        .route(
            "/pan-kyc/batches/:batch_id",
            get(get_batch_detail).delete(delete_batch),
        )
        .route("/pan-kyc/records/:record_id", get(get_record_detail))
        .layer(
            global_rate_limit(10000)
                .layer(rate_limit_per_ip(1, 100))
                .layer(cors(Method::GET))
                .layer(CompressionLayer::new().zstd(true)),
        )
        // Base route
        .route("/", get(|| async { index() }))
        .route("/health", get(health))
        // Apply common middleware
        .layer(trace_layer)
        .with_state(db)
}
