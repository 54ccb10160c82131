use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Io(#[from] tokio::io::Error),

    #[error("Failed parsing upload: {0}")]
    Ingest(String),

    #[error("Unexpected Error: {0}")]
    Custom(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Spreadsheet(#[from] calamine::XlsxError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),

    #[error(transparent)]
    RedisError(#[from] redis::RedisError),

    #[error(transparent)]
    DbPool(#[from] diesel_async::pooled_connection::deadpool::PoolError),

    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Error messages for the API Responses
pub enum ErrorMessages {
    Unexpected,
    DB,
    InvalidUpload,
    BatchNotFound,
    RecordNotFound,
    KindMismatch,
    OtpExpired,
    ProviderUnavailable,
}

// Use the ErrorMessages enum to display error messages for the API Responses
impl fmt::Display for ErrorMessages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorMessages::Unexpected => "We encountered an unexpected error during the verification process.",
            ErrorMessages::DB => "An unforeseen database error has occurred, preventing the operation from completing. Kindly try again after some time.",
            ErrorMessages::InvalidUpload => "The uploaded file could not be processed. Please upload a valid .xlsx or .csv file with the expected columns.",
            ErrorMessages::BatchNotFound => "The requested batch was not found. Please check the batch id and try again.",
            ErrorMessages::RecordNotFound => "The requested record was not found. Please check the record id and try again.",
            ErrorMessages::KindMismatch => "The requested batch does not belong to this verification flow.",
            ErrorMessages::OtpExpired => "The OTP reference has expired or was already used. Please generate a new OTP.",
            ErrorMessages::ProviderUnavailable => "The verification provider could not be reached. Kindly try again after some time.",
        };
        write!(f, "{message}")
    }
}
