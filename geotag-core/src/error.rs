use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeotagError {
    #[error("Drive API error: {0}")]
    DriveError(String),

    #[error("Credential error: {0}")]
    CredentialError(String),

    #[error("Image processing error: {0}")]
    ImageError(String),

    #[error("Listing stopped after {pages} pages with more results pending")]
    PageLimitExceeded { pages: u32 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, GeotagError>;
