use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Batch, BatchStatusCount, KycRecord, ProviderLog};
use crate::services::sandbox::AadhaarHolder;

/// Standard response envelope for every JSON endpoint
///
/// The frontend expects `{success, message, data}` on success and failure
/// alike, with `data` null on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Pagination metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
    pub items_per_page: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, items_per_page: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + items_per_page - 1) / items_per_page
        };
        PaginationMeta {
            total,
            page,
            total_pages,
            items_per_page,
            has_next_page: page < total_pages,
            has_prev_page: page > 1 && total > 0,
        }
    }
}

/// Per-status record counts for a batch
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub pending: i64,
    pub processing: i64,
    pub verified: i64,
    pub failed: i64,
    pub invalid: i64,
}

impl StatusBreakdown {
    /// Folds aggregation rows for one batch into a breakdown
    pub fn from_counts(batch_id: &str, counts: &[BatchStatusCount]) -> Self {
        let mut breakdown = StatusBreakdown::default();
        for row in counts.iter().filter(|row| row.batch_id == batch_id) {
            match row.status.as_str() {
                "pending" => breakdown.pending += row.count,
                "processing" => breakdown.processing += row.count,
                "verified" => breakdown.verified += row.count,
                "failed" => breakdown.failed += row.count,
                "invalid" => breakdown.invalid += row.count,
                other => tracing::warn!("Unknown record status in aggregation: {}", other),
            }
        }
        breakdown
    }

    pub fn total(&self) -> i64 {
        self.pending + self.processing + self.verified + self.failed + self.invalid
    }
}

/// One batch with its aggregated record counts
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchSummary {
    pub id: String,
    pub file_name: String,
    pub kind: String,
    pub status: String,
    pub total_rows: i32,
    pub created_at: NaiveDateTime,
    pub counts: StatusBreakdown,
}

impl BatchSummary {
    pub fn from_batch(batch: Batch, counts: &[BatchStatusCount]) -> Self {
        let breakdown = StatusBreakdown::from_counts(&batch.id, counts);
        BatchSummary {
            id: batch.id,
            file_name: batch.file_name,
            kind: batch.kind,
            status: batch.status,
            total_rows: batch.total_rows,
            created_at: batch.created_at,
            counts: breakdown,
        }
    }
}

/// Payload for POST /pan-kyc/upload and /aadhaar-pan/upload responses
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadData {
    pub batch_id: String,
    pub file_name: String,
    pub total_rows: i64,
    pub pending: i64,
    pub invalid: i64,
}

/// Payload for batch verification responses
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyQueuedData {
    pub batch_id: String,
    pub queued: usize,
}

/// Payload for GET /pan-kyc/batches
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchListData {
    pub meta: PaginationMeta,
    pub batches: Vec<BatchSummary>,
}

/// Payload for GET /pan-kyc/batches/:batch_id
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchDetailData {
    pub batch: BatchSummary,
    pub meta: PaginationMeta,
    pub records: Vec<KycRecord>,
}

/// Payload for GET /pan-kyc/records/:record_id
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordDetailData {
    pub record: KycRecord,
    pub provider_logs: Vec<ProviderLog>,
}

/// Payload for POST /aadhaar-verification/generate-otp
#[derive(Debug, Serialize, Deserialize)]
pub struct OtpData {
    pub reference_id: String,
}

/// Payload for POST /aadhaar-verification/verify-single
#[derive(Debug, Serialize, Deserialize)]
pub struct AadhaarVerificationData {
    pub record_id: String,
    pub holder: AadhaarHolder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(45, 2, 20);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next_page);
        assert!(meta.has_prev_page);

        let first = PaginationMeta::new(45, 1, 20);
        assert!(first.has_next_page);
        assert!(!first.has_prev_page);

        let empty = PaginationMeta::new(0, 1, 20);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);

        let exact = PaginationMeta::new(40, 2, 20);
        assert_eq!(exact.total_pages, 2);
        assert!(!exact.has_next_page);
    }

    #[test]
    fn test_status_breakdown_from_counts() {
        let counts = vec![
            BatchStatusCount {
                batch_id: "b1".to_string(),
                status: "pending".to_string(),
                count: 3,
            },
            BatchStatusCount {
                batch_id: "b1".to_string(),
                status: "verified".to_string(),
                count: 7,
            },
            BatchStatusCount {
                batch_id: "b2".to_string(),
                status: "failed".to_string(),
                count: 5,
            },
        ];

        let breakdown = StatusBreakdown::from_counts("b1", &counts);
        assert_eq!(breakdown.pending, 3);
        assert_eq!(breakdown.verified, 7);
        assert_eq!(breakdown.failed, 0);
        assert_eq!(breakdown.total(), 10);
    }

    #[test]
    fn test_envelope_serialization() {
        let ok = ApiResponse::success("Upload accepted", serde_json::json!({"batch_id": "b1"}));
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Upload accepted");
        assert_eq!(value["data"]["batch_id"], "b1");

        let err: ApiResponse<serde_json::Value> = ApiResponse::failure("Batch not found");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["success"], false);
        assert!(value["data"].is_null());
    }
}
