use std::path::Path;

use tokio::fs;
use tracing::trace;

use crate::digest::DigestAlgorithm;
use crate::error::DownloadError;

/// Expected digest of an artifact and the algorithm that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashProvider {
    hash: String,
    algorithm: DigestAlgorithm,
}

impl HashProvider {
    pub fn new(hash: impl Into<String>, algorithm: DigestAlgorithm) -> Self {
        Self {
            hash: hash.into(),
            algorithm,
        }
    }

    pub fn sha256(hash: impl Into<String>) -> Self {
        Self::new(hash, DigestAlgorithm::Sha256)
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Case-insensitive comparison against a computed hex digest
    pub fn matches(&self, computed: &str) -> bool {
        self.hash.trim().eq_ignore_ascii_case(computed)
    }
}

/// Whether the object at `path` can be reused.
///
/// Requires the file to exist, a hash provider, and matching digests. Without a
/// provider an object is never considered valid.
pub async fn is_valid(path: &Path, hash: Option<&HashProvider>) -> Result<bool, DownloadError> {
    trace!(path = ?path, "Checking if object is valid");

    let exists = fs::try_exists(path)
        .await
        .map_err(|e| DownloadError::digest(path, e))?;
    if !exists {
        trace!(path = ?path, "Object does not exist, invalid");
        return Ok(false);
    }

    let Some(hash) = hash else {
        trace!(path = ?path, "No hash provider, assuming invalid");
        return Ok(false);
    };

    let computed = hash
        .algorithm()
        .digest_file(path)
        .await
        .map_err(|e| DownloadError::digest(path, e))?;

    let valid = hash.matches(&computed);
    trace!(
        path = ?path,
        expected = hash.hash(),
        computed = %computed,
        valid,
        "Compared object digest"
    );
    Ok(valid)
}
