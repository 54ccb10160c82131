use crate::{db::DbClient, Result, CONFIG};
use std::time::Duration;
use tokio::time;
use tracing::{error, info, warn};

const LAST_EXECUTION_CACHE_KEY: &str = "background_job:last_execution";
const LAST_EXECUTION_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const LAST_EXECUTION_TTL_SECONDS: u64 = 24 * 60 * 60;

/// Background job manager for periodic tasks
pub struct BackgroundJobManager {
    db_client: DbClient,
}

impl BackgroundJobManager {
    /// Create a new background job manager
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    /// Get background job health status
    pub async fn get_health_status(&self) -> BackgroundJobHealth {
        job_health(&self.db_client).await
    }

    /// Store the timestamp when the background job last executed
    async fn store_job_execution_time(&self, execution_time: chrono::NaiveDateTime) -> Result<()> {
        let timestamp_str = execution_time.format(LAST_EXECUTION_FORMAT).to_string();
        self.db_client
            .set_cache(
                LAST_EXECUTION_CACHE_KEY,
                &timestamp_str,
                LAST_EXECUTION_TTL_SECONDS,
            )
            .await?;
        Ok(())
    }

    /// Start all background jobs
    pub async fn start_all_jobs(&self) {
        info!("Starting background job manager");

        // Start batch status aggregation job
        let db_client = self.db_client.clone();
        tokio::spawn(async move {
            batch_status_update_job(db_client).await;
        });

        // Start health monitoring job
        let db_client_health = self.db_client.clone();
        tokio::spawn(async move {
            health_monitoring_job(db_client_health).await;
        });

        info!("All background jobs started successfully");
    }
}

/// Computes job health from the last recorded execution timestamp.
/// Shared with the /health endpoint.
pub async fn job_health(db_client: &DbClient) -> BackgroundJobHealth {
    match get_last_job_execution_time(db_client).await {
        Ok(last_batch_check) => {
            let now = chrono::Utc::now().naive_utc();
            let time_since_check = now - last_batch_check;
            let expected_interval =
                chrono::Duration::seconds(CONFIG.batch_status_update_interval_seconds as i64);

            if time_since_check > expected_interval * 2 {
                BackgroundJobHealth {
                    status: "inactive".to_string(),
                    last_batch_check: Some(last_batch_check),
                    message: format!(
                        "Last batch status check was {} seconds ago, expected interval is {} seconds",
                        time_since_check.num_seconds(),
                        CONFIG.batch_status_update_interval_seconds
                    ),
                }
            } else {
                BackgroundJobHealth {
                    status: "active".to_string(),
                    last_batch_check: Some(last_batch_check),
                    message: "Background jobs are running normally".to_string(),
                }
            }
        }
        Err(_) => BackgroundJobHealth {
            status: "unknown".to_string(),
            last_batch_check: None,
            message: "Unable to determine when batch statuses were last checked".to_string(),
        },
    }
}

/// Get the timestamp when the background job last executed
async fn get_last_job_execution_time(db_client: &DbClient) -> Result<chrono::NaiveDateTime> {
    let timestamp_str = db_client.get_cache(LAST_EXECUTION_CACHE_KEY).await?;

    chrono::NaiveDateTime::parse_from_str(&timestamp_str, LAST_EXECUTION_FORMAT)
        .map_err(|e| crate::errors::ApiError::Custom(format!("Failed to parse timestamp: {e}")))
}

/// Background job that periodically recomputes batch aggregate statuses
async fn batch_status_update_job(db_client: DbClient) {
    let mut interval = time::interval(Duration::from_secs(
        CONFIG.batch_status_update_interval_seconds,
    ));

    info!(
        "Batch status update job started with interval: {} seconds",
        CONFIG.batch_status_update_interval_seconds
    );

    let bg_manager = BackgroundJobManager::new(db_client.clone());

    loop {
        interval.tick().await;

        let execution_time = chrono::Utc::now().naive_utc();
        if let Err(e) = bg_manager.store_job_execution_time(execution_time).await {
            warn!("Failed to store job execution time: {:?}", e);
        }

        match db_client.refresh_batch_statuses().await {
            Ok(updated_count) => {
                info!(
                    "Batch status update completed: {} batches updated",
                    updated_count
                );
            }
            Err(e) => {
                error!("Batch status update failed: {:?}", e);
            }
        }
    }
}

/// Health monitoring job that periodically logs background job status
async fn health_monitoring_job(db_client: DbClient) {
    // Run health checks every 30 minutes
    let mut interval = time::interval(Duration::from_secs(1800));

    info!("Health monitoring job started with 30-minute intervals");

    loop {
        interval.tick().await;

        let health_status = job_health(&db_client).await;
        match health_status.status.as_str() {
            "active" => info!("Background jobs health check: {}", health_status.message),
            "inactive" => warn!(
                "Background jobs health check INACTIVE: {}",
                health_status.message
            ),
            _ => warn!(
                "Background jobs health check UNKNOWN: {}",
                health_status.message
            ),
        }
    }
}

/// Background job health status
#[derive(Debug, Clone, serde::Serialize)]
pub struct BackgroundJobHealth {
    pub status: String,
    pub last_batch_check: Option<chrono::NaiveDateTime>,
    pub message: String,
}
