use crate::db::models::{Batch, BatchKind, BatchStatus, KycRecord, ProviderCallOutcome, RecordStatus};
use crate::db::DbClient;
use crate::errors::ApiError;
use crate::services::sandbox::{
    mask_aadhaar, SandboxClient, AADHAAR_PAN_STATUS_PATH, PAN_VERIFY_PATH,
};
use crate::Result;
use futures::stream::{self, StreamExt};
use tracing::{error, info};

/// Provider calls in flight per verification run. The vendor throttles
/// aggressively, so this stays conservative.
pub const VERIFY_CONCURRENCY: usize = 4;

/// Claims a batch's verifiable records and spawns the verification run.
///
/// Returns the number of records queued; the HTTP handler responds
/// immediately while the run proceeds in the background.
pub async fn queue_batch_verification(
    db: &DbClient,
    batch: &Batch,
    record_ids: Option<Vec<String>>,
) -> Result<usize> {
    let kind = BatchKind::try_from(batch.kind.as_str()).map_err(ApiError::Custom)?;

    let claimed = db
        .claim_records_for_verification(&batch.id, record_ids)
        .await?;
    if claimed.is_empty() {
        return Ok(0);
    }

    db.update_batch_status(&batch.id, BatchStatus::Processing)
        .await?;

    let queued = claimed.len();
    let db_client = db.clone();
    let batch_id = batch.id.clone();
    tokio::spawn(async move {
        info!(
            "Starting verification run for batch {} with {} records",
            batch_id, queued
        );
        run_batch_verification(db_client, batch_id, kind, claimed).await;
    });

    Ok(queued)
}

async fn run_batch_verification(
    db: DbClient,
    batch_id: String,
    kind: BatchKind,
    records: Vec<KycRecord>,
) {
    let client = SandboxClient::from_config(db.clone());

    stream::iter(records)
        .map(|record| {
            let db = db.clone();
            let client = client.clone();
            async move {
                if let Err(err) = verify_record(&db, &client, kind, &record).await {
                    error!(
                        "Failed to persist verification outcome for record {}: {}",
                        record.id, err
                    );
                }
            }
        })
        .buffer_unordered(VERIFY_CONCURRENCY)
        .collect::<Vec<_>>()
        .await;

    if let Err(err) = db.refresh_batch_status(&batch_id).await {
        error!("Failed to refresh status of batch {}: {}", batch_id, err);
    } else {
        info!("Verification run finished for batch {}", batch_id);
    }
}

/// Runs one provider call for a record and writes back status, remark and
/// an audit log row
async fn verify_record(
    db: &DbClient,
    client: &SandboxClient,
    kind: BatchKind,
    record: &KycRecord,
) -> Result<()> {
    let (endpoint, result) = match kind {
        BatchKind::PanKyc => (PAN_VERIFY_PATH, verify_pan_record(client, record).await),
        BatchKind::AadhaarPan => (
            AADHAAR_PAN_STATUS_PATH,
            verify_link_record(client, record).await,
        ),
    };

    match result {
        Ok((verified, message)) => {
            let (status, remark) = record_outcome(verified, &message);
            db.update_record_outcome(&record.id, status, remark).await?;
            db.insert_provider_log(&record.id, endpoint, ProviderCallOutcome::Success, &message)
                .await?;
        }
        Err(err) => {
            let message = err.to_string();
            db.update_record_outcome(&record.id, RecordStatus::Failed, Some(message.clone()))
                .await?;
            db.insert_provider_log(&record.id, endpoint, ProviderCallOutcome::Failure, &message)
                .await?;
        }
    }

    Ok(())
}

/// Maps a provider verdict to the record status written back
fn record_outcome(verified: bool, message: &str) -> (RecordStatus, Option<String>) {
    if verified {
        (RecordStatus::Verified, None)
    } else {
        (RecordStatus::Failed, Some(message.to_string()))
    }
}

async fn verify_pan_record(
    client: &SandboxClient,
    record: &KycRecord,
) -> Result<(bool, String)> {
    // Claimed records passed upload validation, so a missing PAN here is a bug
    let pan = record
        .pan_number
        .as_deref()
        .ok_or_else(|| ApiError::Custom(format!("Record {} has no PAN", record.id)))?;

    let outcome = client
        .verify_pan(pan, &record.holder_name, record.date_of_birth.as_deref())
        .await?;

    if !outcome.is_valid() {
        return Ok((false, outcome.message));
    }
    if !outcome.name_match {
        return Ok((false, "Name does not match PAN records".to_string()));
    }
    if !outcome.dob_match {
        return Ok((false, "Date of birth does not match PAN records".to_string()));
    }
    Ok((true, outcome.message))
}

async fn verify_link_record(
    client: &SandboxClient,
    record: &KycRecord,
) -> Result<(bool, String)> {
    let pan = record
        .pan_number
        .as_deref()
        .ok_or_else(|| ApiError::Custom(format!("Record {} has no PAN", record.id)))?;
    let aadhaar = record
        .aadhaar_number
        .as_deref()
        .ok_or_else(|| ApiError::Custom(format!("Record {} has no Aadhaar number", record.id)))?;

    info!(
        "Checking Aadhaar-PAN link for {}",
        mask_aadhaar(aadhaar)
    );

    let outcome = client.aadhaar_pan_status(aadhaar, pan).await?;
    Ok((outcome.linked, outcome.message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcome_mapping() {
        let (status, remark) = record_outcome(true, "Record found");
        assert_eq!(status, RecordStatus::Verified);
        assert!(remark.is_none());

        let (status, remark) = record_outcome(false, "Name does not match PAN records");
        assert_eq!(status, RecordStatus::Failed);
        assert_eq!(remark.as_deref(), Some("Name does not match PAN records"));
    }
}
