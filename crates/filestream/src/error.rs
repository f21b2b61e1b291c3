use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

/// Errors raised while setting up a store. These surface at the call site.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to create store root {path:?}: {source}")]
    CreateRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not find a local storage directory (last candidate: {0:?})")]
    NoLocalStorage(PathBuf),
}

/// Failure of the last materialization tier.
#[derive(Debug, thiserror::Error)]
#[error("Couldn't copy {origin:?} to {target:?}: {source}")]
pub struct RewriteError {
    pub origin: PathBuf,
    pub target: PathBuf,
    #[source]
    pub source: std::io::Error,
}

// Sources are held in `Arc` so every clone of a download handle can observe the
// same outcome.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DownloadError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] Arc<reqwest::Error>),

    #[error("Error while opening connection to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: Arc<reqwest::Error>,
    },

    #[error("Server returned status code {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("Error while downloading {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: Arc<reqwest::Error>,
    },

    #[error("Error while preparing store object {path:?}: {source}")]
    PrepareObject {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("Error while writing to {path:?}: {source}")]
    WriteObject {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("Error while computing hash of {path:?}: {source}")]
    Digest {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("Materialization failed: {0}")]
    Materialize(#[source] Arc<RewriteError>),

    #[error("No tokio runtime available to run downloads")]
    Runtime,

    #[error("Download was cancelled")]
    Cancelled,

    #[error("Timed out after {0:?} waiting for download")]
    Timeout(Duration),

    #[error("Download task ended without producing a result")]
    TaskAborted,
}

impl DownloadError {
    pub(crate) fn prepare(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PrepareObject {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteObject {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn digest(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Digest {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Whether this error came from the network side of a fetch.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Status { .. } | Self::Read { .. }
        )
    }
}

impl From<RewriteError> for DownloadError {
    fn from(err: RewriteError) -> Self {
        DownloadError::Materialize(Arc::new(err))
    }
}
