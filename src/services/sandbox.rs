use crate::db::DbClient;
use crate::errors::ApiError;
use crate::{Result, CONFIG};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info, warn};

const SANDBOX_API_VERSION: &str = "2.0";
const REQUEST_TIMEOUT_SECONDS: u64 = 30;

const ACCESS_TOKEN_CACHE_KEY: &str = "sandbox:access_token";
/// Provider tokens live 24h; refresh well before expiry
const ACCESS_TOKEN_TTL_SECONDS: u64 = 12 * 60 * 60;
const PAN_RESULT_TTL_SECONDS: u64 = 60 * 60;

pub const PAN_VERIFY_PATH: &str = "/kyc/pan/verify";
pub const AADHAAR_PAN_STATUS_PATH: &str = "/kyc/aadhaar-pan/status";
pub const AADHAAR_OTP_PATH: &str = "/kyc/aadhaar/okyc/otp";
pub const AADHAAR_OTP_VERIFY_PATH: &str = "/kyc/aadhaar/okyc/otp/verify";

/// Response envelope used by every Sandbox endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEnvelope {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Outcome of a PAN status verification call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanVerificationOutcome {
    pub pan_status: String,
    pub name_match: bool,
    pub dob_match: bool,
    pub message: String,
}

impl PanVerificationOutcome {
    pub fn is_valid(&self) -> bool {
        self.pan_status.eq_ignore_ascii_case("valid")
    }
}

/// Outcome of an Aadhaar-PAN link status call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AadhaarPanLinkOutcome {
    pub linked: bool,
    pub message: String,
}

/// Holder profile returned by Aadhaar OTP verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AadhaarHolder {
    pub name: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
}

/// HTTP client for the Sandbox verification provider.
///
/// Holds the shared DbClient so access tokens and per-PAN results can be
/// cached in Redis across calls.
#[derive(Clone)]
pub struct SandboxClient {
    http: Client,
    base_url: String,
    db: DbClient,
}

impl SandboxClient {
    pub fn from_config(db: DbClient) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()
            .expect("Failed to build HTTP client");

        SandboxClient {
            http,
            base_url: CONFIG.sandbox_api_url.trim_end_matches('/').to_string(),
            db,
        }
    }

    /// Authenticates against the provider and caches the access token
    pub async fn authenticate(&self) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/authenticate", self.base_url))
            .header("x-api-key", &CONFIG.sandbox_api_key)
            .header("x-api-secret", &CONFIG.sandbox_api_secret)
            .header("x-api-version", SANDBOX_API_VERSION)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Provider(format!(
                "Authentication failed with HTTP {}",
                response.status()
            )));
        }

        let envelope: ProviderEnvelope = response.json().await?;
        let token = envelope
            .data
            .as_ref()
            .and_then(|data| data_str(data, "access_token"))
            .ok_or_else(|| {
                ApiError::Provider("Authentication response missing access token".to_string())
            })?;

        let _ = self
            .db
            .set_cache(ACCESS_TOKEN_CACHE_KEY, &token, ACCESS_TOKEN_TTL_SECONDS)
            .await;

        Ok(token)
    }

    async fn access_token(&self) -> Result<String> {
        if let Ok(token) = self.db.get_cache(ACCESS_TOKEN_CACHE_KEY).await {
            return Ok(token);
        }
        self.authenticate().await
    }

    async fn send(&self, path: &str, body: &Value, token: &str) -> Result<reqwest::Response> {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .header("authorization", token)
            .header("x-api-key", &CONFIG.sandbox_api_key)
            .header("x-api-version", SANDBOX_API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                error!("Provider request to {} failed: {}", path, err);
                ApiError::from(err)
            })
    }

    /// POSTs to an authorized provider endpoint, re-authenticating once on 401
    async fn post_authorized(&self, path: &str, body: &Value) -> Result<ProviderEnvelope> {
        let token = self.access_token().await?;
        let mut response = self.send(path, body, &token).await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            info!("Sandbox access token rejected, re-authenticating");
            let token = self.authenticate().await?;
            response = self.send(path, body, &token).await?;
        }

        let http_status = response.status();
        if !http_status.is_success() {
            // The provider reports failures inside the envelope when it can
            if let Ok(envelope) = response.json::<ProviderEnvelope>().await {
                return Err(ApiError::Provider(envelope_message(
                    &envelope,
                    http_status.as_u16(),
                )));
            }
            return Err(ApiError::Provider(format!(
                "Provider returned HTTP {http_status}"
            )));
        }

        response.json::<ProviderEnvelope>().await.map_err(Into::into)
    }

    /// Verifies a PAN against the provider, with a per-PAN result cache
    pub async fn verify_pan(
        &self,
        pan: &str,
        holder_name: &str,
        date_of_birth: Option<&str>,
    ) -> Result<PanVerificationOutcome> {
        let cache_key = format!("pan_status:{pan}");

        if let Ok(cached) = self.db.get_cache(&cache_key).await {
            if let Ok(outcome) = serde_json::from_str::<PanVerificationOutcome>(&cached) {
                info!("Cache hit for PAN {}", mask_pan(pan));
                return Ok(outcome);
            }
            warn!("Cache found but failed to deserialize, falling back...");
        }

        let body = json!({
            "pan": pan,
            "name_as_per_pan": holder_name,
            "date_of_birth": date_of_birth,
            "consent": "Y",
            "reason": "KYC verification",
        });

        let envelope = self.post_authorized(PAN_VERIFY_PATH, &body).await?;
        let outcome = parse_pan_outcome(&envelope)?;

        if let Ok(serialized) = serde_json::to_string(&outcome) {
            let _ = self
                .db
                .set_cache(&cache_key, &serialized, PAN_RESULT_TTL_SECONDS)
                .await;
        }

        Ok(outcome)
    }

    /// Checks whether an Aadhaar number is linked to a PAN
    pub async fn aadhaar_pan_status(
        &self,
        aadhaar_number: &str,
        pan: &str,
    ) -> Result<AadhaarPanLinkOutcome> {
        let body = json!({
            "aadhaar_number": aadhaar_number,
            "pan": pan,
            "consent": "Y",
            "reason": "KYC verification",
        });

        let envelope = self.post_authorized(AADHAAR_PAN_STATUS_PATH, &body).await?;
        parse_link_outcome(&envelope)
    }

    /// Requests an OTP for Aadhaar e-KYC; returns the provider reference id
    pub async fn generate_otp(&self, aadhaar_number: &str) -> Result<String> {
        let body = json!({
            "aadhaar_number": aadhaar_number,
            "consent": "y",
            "reason": "KYC verification",
        });

        let envelope = self.post_authorized(AADHAAR_OTP_PATH, &body).await?;
        parse_reference_id(&envelope)
    }

    /// Completes Aadhaar e-KYC with the OTP entered by the holder
    pub async fn verify_otp(&self, reference_id: &str, otp: &str) -> Result<AadhaarHolder> {
        let body = json!({
            "reference_id": reference_id,
            "otp": otp,
        });

        let envelope = self.post_authorized(AADHAAR_OTP_VERIFY_PATH, &body).await?;
        parse_holder(&envelope)
    }
}

/// Reads a value from provider data, tolerating string and numeric forms
fn data_str(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn envelope_message(envelope: &ProviderEnvelope, http_status: u16) -> String {
    envelope
        .message
        .clone()
        .unwrap_or_else(|| format!("Provider returned HTTP {http_status}"))
}

fn require_ok(envelope: &ProviderEnvelope) -> Result<&Value> {
    if envelope.code != Some(200) {
        return Err(ApiError::Provider(envelope_message(
            envelope,
            envelope.code.unwrap_or_default() as u16,
        )));
    }
    envelope
        .data
        .as_ref()
        .ok_or_else(|| ApiError::Provider("Provider response missing data".to_string()))
}

pub(crate) fn parse_pan_outcome(envelope: &ProviderEnvelope) -> Result<PanVerificationOutcome> {
    let data = require_ok(envelope)?;

    let pan_status = data_str(data, "status")
        .unwrap_or_else(|| "invalid".to_string())
        .to_lowercase();
    let name_match = data
        .get("name_as_per_pan_match")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    // Absent when no date of birth was submitted
    let dob_match = data
        .get("date_of_birth_match")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let message = data_str(data, "remarks")
        .or_else(|| envelope.message.clone())
        .unwrap_or_else(|| format!("PAN status: {pan_status}"));

    Ok(PanVerificationOutcome {
        pan_status,
        name_match,
        dob_match,
        message,
    })
}

pub(crate) fn parse_link_outcome(envelope: &ProviderEnvelope) -> Result<AadhaarPanLinkOutcome> {
    let data = require_ok(envelope)?;

    let seeding_status = data_str(data, "aadhaar_seeding_status").unwrap_or_default();
    let linked = seeding_status.eq_ignore_ascii_case("y");
    let message = data_str(data, "message")
        .or_else(|| envelope.message.clone())
        .unwrap_or_else(|| {
            if linked {
                "Aadhaar is linked to the PAN".to_string()
            } else {
                "Aadhaar is not linked to the PAN".to_string()
            }
        });

    Ok(AadhaarPanLinkOutcome { linked, message })
}

pub(crate) fn parse_reference_id(envelope: &ProviderEnvelope) -> Result<String> {
    let data = require_ok(envelope)?;
    data_str(data, "reference_id")
        .ok_or_else(|| ApiError::Provider("OTP response missing reference id".to_string()))
}

pub(crate) fn parse_holder(envelope: &ProviderEnvelope) -> Result<AadhaarHolder> {
    let data = require_ok(envelope)?;

    let name = data_str(data, "name")
        .ok_or_else(|| ApiError::Provider("e-KYC response missing holder name".to_string()))?;
    let address = match data.get("address") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(other @ Value::Object(_)) => Some(other.to_string()),
        _ => None,
    };

    Ok(AadhaarHolder {
        name,
        gender: data_str(data, "gender"),
        date_of_birth: data_str(data, "date_of_birth"),
        address,
    })
}

/// Masks a PAN for log output, keeping the first and last character
pub fn mask_pan(pan: &str) -> String {
    if pan.len() < 3 {
        return "*".repeat(pan.len());
    }
    let masked: String = "*".repeat(pan.len() - 2);
    format!("{}{}{}", &pan[..1], masked, &pan[pan.len() - 1..])
}

/// Masks an Aadhaar number for log output, keeping the last four digits
pub fn mask_aadhaar(aadhaar: &str) -> String {
    if aadhaar.len() <= 4 {
        return "*".repeat(aadhaar.len());
    }
    format!(
        "{}{}",
        "*".repeat(aadhaar.len() - 4),
        &aadhaar[aadhaar.len() - 4..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope_from(value: Value) -> ProviderEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_pan_outcome() {
        let envelope = envelope_from(serde_json::json!({
            "code": 200,
            "transaction_id": "txn-1",
            "data": {
                "status": "VALID",
                "name_as_per_pan_match": true,
                "date_of_birth_match": true,
                "remarks": "Record found"
            }
        }));

        let outcome = parse_pan_outcome(&envelope).unwrap();
        assert!(outcome.is_valid());
        assert!(outcome.name_match);
        assert!(outcome.dob_match);
        assert_eq!(outcome.message, "Record found");
    }

    #[test]
    fn test_parse_pan_outcome_rejects_provider_failure() {
        let envelope = envelope_from(serde_json::json!({
            "code": 422,
            "message": "Invalid PAN pattern"
        }));

        let err = parse_pan_outcome(&envelope).unwrap_err();
        assert!(err.to_string().contains("Invalid PAN pattern"));
    }

    #[test]
    fn test_parse_link_outcome() {
        let envelope = envelope_from(serde_json::json!({
            "code": 200,
            "data": { "aadhaar_seeding_status": "y" }
        }));
        let outcome = parse_link_outcome(&envelope).unwrap();
        assert!(outcome.linked);

        let envelope = envelope_from(serde_json::json!({
            "code": 200,
            "data": { "aadhaar_seeding_status": "n", "message": "Not linked" }
        }));
        let outcome = parse_link_outcome(&envelope).unwrap();
        assert!(!outcome.linked);
        assert_eq!(outcome.message, "Not linked");
    }

    #[test]
    fn test_parse_reference_id_accepts_numeric_ids() {
        let envelope = envelope_from(serde_json::json!({
            "code": 200,
            "data": { "reference_id": 1234567890u64 }
        }));
        assert_eq!(parse_reference_id(&envelope).unwrap(), "1234567890");
    }

    #[test]
    fn test_parse_holder() {
        let envelope = envelope_from(serde_json::json!({
            "code": 200,
            "data": {
                "name": "Asha Devi",
                "gender": "F",
                "date_of_birth": "12/03/1985",
                "address": { "district": "Pune", "state": "Maharashtra" }
            }
        }));

        let holder = parse_holder(&envelope).unwrap();
        assert_eq!(holder.name, "Asha Devi");
        assert_eq!(holder.gender.as_deref(), Some("F"));
        assert!(holder.address.unwrap().contains("Pune"));
    }

    #[test]
    fn test_masking() {
        assert_eq!(mask_pan("ABCDE1234F"), "A********F");
        assert_eq!(mask_aadhaar("234567890123"), "********0123");
        assert_eq!(mask_aadhaar("123"), "***");
    }
}
