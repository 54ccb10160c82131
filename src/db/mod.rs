pub mod batches;
pub mod connection;
pub mod models;
pub mod provider_logs;
pub mod records;
pub mod redis;

pub use connection::DbClient;
