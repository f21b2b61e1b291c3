use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::download::validity::HashProvider;
use crate::store::Store;

/// Progress sink: `(bytes_read_so_far, announced_total)`.
///
/// The total is `None` when the server did not announce a length.
pub type ProgressCallback = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Where a downloaded artifact should be exposed besides the download store.
#[derive(Debug, Clone)]
pub enum Target {
    /// An explicit path
    Path(PathBuf),
    /// The root of another store, under a name derived from the URL
    Store(Store),
}

/// A single fetch-or-reuse request
#[derive(Clone)]
pub struct DownloadRequest {
    pub(crate) url: Url,
    pub(crate) target: Option<Target>,
    pub(crate) hash: Option<HashProvider>,
    pub(crate) progress: Option<ProgressCallback>,
}

impl DownloadRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            target: None,
            hash: None,
            progress: None,
        }
    }

    /// Materialize the artifact at `path`
    pub fn to_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = Some(Target::Path(path.into()));
        self
    }

    /// Materialize the artifact inside `store` under a name derived from the URL
    pub fn into_store(mut self, store: Store) -> Self {
        self.target = Some(Target::Store(store));
        self
    }

    pub fn target(mut self, target: Option<Target>) -> Self {
        self.target = target;
        self
    }

    /// Expected digest used to decide whether a cached object can be reused
    pub fn with_hash(mut self, hash: HashProvider) -> Self {
        self.hash = Some(hash);
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(u64, Option<u64>) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl From<Url> for DownloadRequest {
    fn from(url: Url) -> Self {
        Self::new(url)
    }
}

impl fmt::Debug for DownloadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("url", &self.url.as_str())
            .field("target", &self.target)
            .field("hash", &self.hash)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
