use serde::{Deserialize, Serialize};

/// Request body for batch verification endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Batch to verify
    pub batch_id: String,
    /// Optional narrowing to specific records of the batch
    #[serde(default)]
    pub record_ids: Option<Vec<String>>,
}

/// Request body for POST /aadhaar-verification/generate-otp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOtpRequest {
    pub aadhaar_number: String,
}

/// Request body for POST /aadhaar-verification/verify-single
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub reference_id: String,
    pub otp: String,
}

/// Common query parameters for paginated listings
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub search: Option<String>,
}
