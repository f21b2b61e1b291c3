use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use reqwest::Client;
use tokio::fs;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::DownloaderConfig;
use crate::builder::DownloaderBuilder;
use crate::digest::DigestAlgorithm;
use crate::download::handle::{Control, Download};
use crate::download::network;
use crate::download::request::{DownloadRequest, ProgressCallback, Target};
use crate::download::validity::is_valid;
use crate::error::DownloadError;
use crate::rewriter::Rewriter;
use crate::store::Store;

/// Staging files untouched for this long belong to a writer that is gone
const STALE_PART_AGE: Duration = Duration::from_secs(10 * 60);

/// Fetches remote resources into a [`Store`], reusing hash-valid objects.
///
/// Every call to [`Downloader::download`] spawns one task and returns at once.
/// Concurrent downloads of the same URL are not de-duplicated.
#[derive(Clone)]
pub struct Downloader {
    inner: Arc<Inner>,
    runtime: Handle,
}

struct Inner {
    store: Store,
    client: Client,
    config: Arc<DownloaderConfig>,
    rewriter: Arc<dyn Rewriter>,
}

impl Downloader {
    /// Downloader with default settings on the current tokio runtime
    pub fn new(store: Store) -> Result<Self, DownloadError> {
        DownloaderBuilder::new(store).build()
    }

    pub fn builder(store: Store) -> DownloaderBuilder {
        DownloaderBuilder::new(store)
    }

    pub(crate) fn from_parts(
        store: Store,
        client: Client,
        config: Arc<DownloaderConfig>,
        runtime: Handle,
        rewriter: Arc<dyn Rewriter>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                client,
                config,
                rewriter,
            }),
            runtime,
        }
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.inner.config
    }

    /// Start a download and return its handle immediately.
    pub fn download(&self, request: impl Into<DownloadRequest>) -> Download {
        let request = request.into();
        let control = Arc::new(Control::default());
        let (tx, rx) = watch::channel(None);
        let handle = Download::new(request.url.clone(), control.clone(), rx);

        let inner = self.inner.clone();
        self.runtime.spawn(async move {
            let result = if control.cancelled.is_cancelled() {
                debug!(url = %request.url, "Download cancelled before it started");
                Err(DownloadError::Cancelled)
            } else {
                inner.run(request, &control.interrupt).await
            };

            if let Err(e) = &result {
                if !matches!(e, DownloadError::Cancelled) {
                    warn!(error = %e, "Download failed");
                }
            }
            // Nobody may be listening any more
            let _ = tx.send(Some(result));
        });

        handle
    }
}

impl Inner {
    async fn run(
        &self,
        request: DownloadRequest,
        interrupt: &CancellationToken,
    ) -> Result<PathBuf, DownloadError> {
        let DownloadRequest {
            url,
            target,
            hash,
            progress,
        } = request;
        info!(url = %url, "Starting download");

        let object = self.store.object(url.as_str());
        trace!(object = ?object, "Resolved download store object");

        if is_valid(&object, hash.as_ref()).await? {
            debug!(url = %url, object = ?object, "Valid local object, skipping fetch");
        } else {
            trace!(url = %url, object = ?object, "Invalid local object, downloading");
            self.fetch(&url, &object, interrupt, progress.as_ref()).await?;
            trace!(url = %url, "Finished downloading");
        }

        let Some(target) = target else {
            trace!(object = ?object, "No linking required");
            return Ok(object);
        };

        let target = match target {
            Target::Path(path) => path,
            Target::Store(store) => store
                .root()
                .join(DigestAlgorithm::Sha256.hash_str(url.as_str())),
        };

        Ok(self.rewriter.rewrite(&object, &target).await?)
    }

    async fn fetch(
        &self,
        url: &Url,
        object: &Path,
        interrupt: &CancellationToken,
        progress: Option<&ProgressCallback>,
    ) -> Result<(), DownloadError> {
        let response = tokio::select! {
            biased;
            _ = interrupt.cancelled() => {
                trace!(url = %url, "Interrupted while connecting");
                return Err(DownloadError::Cancelled);
            }
            response = network::connect(&self.client, url) => response?,
        };

        // The existing object must survive a cancelled fetch
        if interrupt.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }
        prepare_object(object).await?;

        let body = network::read_body(
            response,
            url,
            interrupt,
            progress,
            self.config.trace_bytes,
        )
        .await?;

        trace!(bytes = body.len(), object = ?object, "Writing store object");
        commit_object(object, &body).await
    }
}

/// Create parent directories and drop any stale object from an earlier attempt.
async fn prepare_object(object: &Path) -> Result<(), DownloadError> {
    trace!(object = ?object, "Creating download store object");
    if let Some(parent) = object.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::prepare(object, e))?;
        sweep_stale_parts(parent, object).await;
    }

    match fs::remove_file(object).await {
        Ok(()) => {
            trace!(object = ?object, "Removed stale store object");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DownloadError::prepare(object, e)),
    }
}

/// Remove staging files of `object` abandoned by a crashed writer.
///
/// Only files older than [`STALE_PART_AGE`] are touched; failures are logged.
async fn sweep_stale_parts(parent: &Path, object: &Path) {
    let Some(object_name) = object.file_name().and_then(|n| n.to_str()) else {
        return;
    };

    let mut entries = match fs::read_dir(parent).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = ?parent, error = %e, "Couldn't list store directory");
            return;
        }
    };

    let now = SystemTime::now();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !is_staging_file(object_name, name) {
            continue;
        }

        let age = entry
            .metadata()
            .await
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if !age.is_some_and(|age| age >= STALE_PART_AGE) {
            continue;
        }

        let path = entry.path();
        match fs::remove_file(&path).await {
            Ok(()) => debug!(path = ?path, "Removed abandoned staging file"),
            Err(e) => warn!(path = ?path, error = %e, "Couldn't remove abandoned staging file"),
        }
    }
}

/// Whether `candidate` is named like a [`temp_path`] sibling of `object_name`
fn is_staging_file(object_name: &str, candidate: &str) -> bool {
    let Some(middle) = candidate
        .strip_prefix(object_name)
        .and_then(|rest| rest.strip_prefix('.'))
        .and_then(|rest| rest.strip_suffix(".part"))
    else {
        return false;
    };

    let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    matches!(middle.split_once('.'), Some((pid, n)) if is_number(pid) && is_number(n))
}

/// Write the full body next to the object, then rename it into place.
async fn commit_object(object: &Path, body: &[u8]) -> Result<(), DownloadError> {
    let temp = temp_path(object);

    if let Err(e) = fs::write(&temp, body).await {
        let _ = fs::remove_file(&temp).await;
        return Err(DownloadError::write(object, e));
    }

    if let Err(e) = fs::rename(&temp, object).await {
        warn!(from = ?temp, to = ?object, error = %e, "Failed to rename temporary object file");
        let _ = fs::remove_file(&temp).await;
        return Err(DownloadError::write(object, e));
    }

    Ok(())
}

/// Unique staging sibling of `object`
fn temp_path(object: &Path) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let mut name = object.file_name().unwrap_or_default().to_os_string();
    name.push(format!(
        ".{}.{}.part",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    object.with_file_name(name)
}
