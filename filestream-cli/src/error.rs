use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] filestream::StoreError),

    #[error("Download error: {0}")]
    Download(#[from] filestream::DownloadError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),
}

impl From<filestream::digest::UnknownAlgorithm> for AppError {
    fn from(error: filestream::digest::UnknownAlgorithm) -> Self {
        AppError::InvalidInput(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        AppError::InvalidInput(format!("Invalid URL: {error}"))
    }
}
