use crate::db::models::{
    AadhaarVerificationData, ApiResponse, GenerateOtpRequest, KycRecord, OtpData,
    ProviderCallOutcome, RecordStatus, VerifyOtpRequest,
};
use crate::db::DbClient;
use crate::errors::{ApiError, ErrorMessages};
use crate::logging::log_to_file;
use crate::services::sandbox::{mask_aadhaar, SandboxClient, AADHAAR_OTP_VERIFY_PATH};
use crate::validation;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::{error, info};

/// OTP references are valid for ten minutes on the provider side
const OTP_REFERENCE_TTL_SECONDS: u64 = 10 * 60;

fn otp_cache_key(reference_id: &str) -> String {
    format!("aadhaar_otp:{reference_id}")
}

/// Maps a provider failure to an HTTP response
fn provider_error_response(err: &ApiError) -> (StatusCode, String) {
    match err {
        ApiError::Provider(message) => (StatusCode::BAD_REQUEST, message.clone()),
        _ => (
            StatusCode::BAD_GATEWAY,
            ErrorMessages::ProviderUnavailable.to_string(),
        ),
    }
}

/// Handler for requesting an Aadhaar e-KYC OTP
///
/// # Endpoint: POST /aadhaar-verification/generate-otp
///
/// Asks the provider to send an OTP to the holder's registered mobile
/// number and caches the returned reference id for the verify step.
pub(crate) async fn generate_aadhaar_otp(
    State(db): State<DbClient>,
    Json(payload): Json<GenerateOtpRequest>,
) -> (StatusCode, Json<ApiResponse<OtpData>>) {
    // The Aadhaar number itself stays out of the audit log
    log_to_file("POST", "/aadhaar-verification/generate-otp", None);

    if let Err(reason) = validation::validate_aadhaar(&payload.aadhaar_number) {
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::failure(reason)));
    }

    let client = SandboxClient::from_config(db.clone());
    match client.generate_otp(&payload.aadhaar_number).await {
        Ok(reference_id) => {
            if let Err(err) = db
                .set_cache(
                    &otp_cache_key(&reference_id),
                    &payload.aadhaar_number,
                    OTP_REFERENCE_TTL_SECONDS,
                )
                .await
            {
                error!("Failed to cache OTP reference: {}", err);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::failure(ErrorMessages::Unexpected.to_string())),
                );
            }

            info!(
                "OTP requested for Aadhaar {}",
                mask_aadhaar(&payload.aadhaar_number)
            );
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    "OTP sent to the registered mobile number",
                    OtpData { reference_id },
                )),
            )
        }
        Err(err) => {
            error!("Failed to generate Aadhaar OTP: {}", err);
            let (status, message) = provider_error_response(&err);
            (status, Json(ApiResponse::failure(message)))
        }
    }
}

/// Handler for completing a single Aadhaar e-KYC verification
///
/// # Endpoint: POST /aadhaar-verification/verify-single
///
/// Verifies the OTP against the cached reference id. On success a
/// standalone verified record (no batch) is persisted along with its
/// provider log row, and the reference id is invalidated.
pub(crate) async fn verify_aadhaar_single(
    State(db): State<DbClient>,
    Json(payload): Json<VerifyOtpRequest>,
) -> (StatusCode, Json<ApiResponse<AadhaarVerificationData>>) {
    log_to_file("POST", "/aadhaar-verification/verify-single", None);

    let cache_key = otp_cache_key(&payload.reference_id);
    let aadhaar_number = match db.get_cache(&cache_key).await {
        Ok(number) => number,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::failure(ErrorMessages::OtpExpired.to_string())),
            )
        }
    };

    let client = SandboxClient::from_config(db.clone());
    let holder = match client.verify_otp(&payload.reference_id, &payload.otp).await {
        Ok(holder) => holder,
        Err(err) => {
            error!("Aadhaar OTP verification failed: {}", err);
            let (status, message) = provider_error_response(&err);
            return (status, Json(ApiResponse::failure(message)));
        }
    };

    let now = chrono::Utc::now().naive_utc();
    let record = KycRecord {
        id: uuid::Uuid::new_v4().to_string(),
        batch_id: None,
        row_index: 0,
        holder_name: holder.name.clone(),
        pan_number: None,
        aadhaar_number: Some(aadhaar_number.clone()),
        email: None,
        phone: None,
        date_of_birth: holder.date_of_birth.clone(),
        extra_fields: None,
        status: RecordStatus::Verified.into(),
        remarks: None,
        verified_at: Some(now),
        created_at: now,
    };

    if let Err(err) = db.insert_record(&record).await {
        error!("Failed to persist Aadhaar verification record: {}", err);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::failure(ErrorMessages::DB.to_string())),
        );
    }

    if let Err(err) = db
        .insert_provider_log(
            &record.id,
            AADHAAR_OTP_VERIFY_PATH,
            ProviderCallOutcome::Success,
            "Aadhaar e-KYC verified",
        )
        .await
    {
        error!("Failed to write provider log: {}", err);
    }

    // Reference ids are single use
    let _ = db.delete_cache(&cache_key).await;

    info!(
        "Aadhaar {} verified via OTP",
        mask_aadhaar(&aadhaar_number)
    );
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            "Aadhaar verified successfully",
            AadhaarVerificationData {
                record_id: record.id,
                holder,
            },
        )),
    )
}
