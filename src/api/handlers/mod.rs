//! API request handlers for the KYC verification service.
//! Each module corresponds to a specific API endpoint or related group of endpoints.

// Batch workflow handlers
pub mod batches; // Batch listing, detail and deletion
pub mod upload; // Spreadsheet ingestion
pub mod verify; // Batch verification

// Single-record handlers
pub mod aadhaar_otp; // Aadhaar OTP e-KYC
pub mod records; // Record detail with provider log trail

// Service handlers
pub mod health; // Liveness and background job health

// Re-export handlers for easier access
pub(crate) use aadhaar_otp::{generate_aadhaar_otp, verify_aadhaar_single};
use axum::http::HeaderMap;
pub(crate) use batches::{delete_batch, get_batch_detail, get_batches_list};
pub(crate) use health::health;
pub(crate) use records::get_record_detail;
pub(crate) use upload::{upload_aadhaar_pan, upload_pan_kyc};
pub(crate) use verify::{verify_aadhaar_pan_batch, verify_pan_batch};

use crate::CONFIG;

/// Validates the authorization header against the configured secret
pub fn is_authorized(headers: &HeaderMap) -> bool {
    headers
        .get("AUTHORIZATION")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|header_value| header_value == CONFIG.auth_secret)
}
