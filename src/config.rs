use serde::Deserialize;

/// Configuration for the API server
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// PostgreSQL database URL
    pub database_url: String,
    /// Redis URL
    pub redis_url: String,
    /// Base URL of the Sandbox verification provider
    pub sandbox_api_url: String,
    /// Sandbox API key
    pub sandbox_api_key: String,
    /// Sandbox API secret
    pub sandbox_api_secret: String,
    /// Auth secret for admin endpoints
    pub auth_secret: String,
    /// Port to run the server on
    pub port: u16,
    /// Maximum number of data rows accepted per uploaded spreadsheet
    #[serde(default = "default_max_upload_rows")]
    pub max_upload_rows: usize,
    /// Interval for the batch status aggregation job
    #[serde(default = "default_batch_status_interval")]
    pub batch_status_update_interval_seconds: u64,
}

fn default_max_upload_rows() -> usize {
    5000
}

fn default_batch_status_interval() -> u64 {
    300
}
