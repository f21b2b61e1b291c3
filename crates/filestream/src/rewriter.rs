//! # Rewriter
//!
//! Exposes a store object at an arbitrary path using the cheapest mechanism that
//! works: a symbolic link, then a hard link, then a full copy.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{error, trace, warn};

use crate::error::RewriteError;

/// Makes `origin`'s bytes available at `target`.
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(&self, origin: &Path, target: &Path) -> Result<PathBuf, RewriteError>;
}

/// Filesystem primitives used by [`LinkRewriter`].
#[async_trait]
pub trait LinkBackend: Send + Sync {
    async fn symlink(&self, origin: &Path, target: &Path) -> io::Result<()>;

    async fn hard_link(&self, origin: &Path, target: &Path) -> io::Result<()>;

    async fn copy(&self, origin: &Path, target: &Path) -> io::Result<u64>;
}

/// [`LinkBackend`] backed by `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsBackend;

#[async_trait]
impl LinkBackend for FsBackend {
    async fn symlink(&self, origin: &Path, target: &Path) -> io::Result<()> {
        #[cfg(unix)]
        {
            fs::symlink(origin, target).await
        }
        #[cfg(windows)]
        {
            fs::symlink_file(origin, target).await
        }
        #[cfg(not(any(unix, windows)))]
        {
            let _ = (origin, target);
            Err(io::Error::from(io::ErrorKind::Unsupported))
        }
    }

    async fn hard_link(&self, origin: &Path, target: &Path) -> io::Result<()> {
        fs::hard_link(origin, target).await
    }

    async fn copy(&self, origin: &Path, target: &Path) -> io::Result<u64> {
        fs::copy(origin, target).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Symbolic,
    Hard,
}

impl LinkKind {
    fn label(self) -> &'static str {
        match self {
            LinkKind::Symbolic => "Symbolic links",
            LinkKind::Hard => "Hard links",
        }
    }
}

/// Symlink, then hard link, then copy. An existing target is returned untouched.
#[derive(Debug, Clone, Default)]
pub struct LinkRewriter<B = FsBackend> {
    backend: B,
}

impl LinkRewriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: LinkBackend> LinkRewriter<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    async fn try_link(&self, kind: LinkKind, origin: &Path, target: &Path) -> bool {
        trace!(kind = ?kind, origin = ?origin, target = ?target, "Trying to create link");
        let result = match kind {
            LinkKind::Symbolic => self.backend.symlink(origin, target).await,
            LinkKind::Hard => self.backend.hard_link(origin, target).await,
        };

        match result {
            Ok(()) => {
                trace!(kind = ?kind, target = ?target, "Created link");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::Unsupported => {
                warn!("{} are not supported on this platform, falling back", kind.label());
                false
            }
            Err(e) => {
                error!(kind = ?kind, target = ?target, error = %e, "Couldn't create link, falling back");
                false
            }
        }
    }
}

#[async_trait]
impl<B: LinkBackend> Rewriter for LinkRewriter<B> {
    async fn rewrite(&self, origin: &Path, target: &Path) -> Result<PathBuf, RewriteError> {
        if let Some(parent) = target.parent() {
            trace!(target = ?target, "Creating parent directories");
            if let Err(e) = fs::create_dir_all(parent).await {
                error!(target = ?target, error = %e, "Couldn't create parent directories");
            }
        }

        if fs::try_exists(target).await.unwrap_or(false) {
            trace!(target = ?target, "Target already exists, skipping");
            return Ok(target.to_path_buf());
        }

        for kind in [LinkKind::Symbolic, LinkKind::Hard] {
            if self.try_link(kind, origin, target).await {
                return Ok(target.to_path_buf());
            }
        }

        trace!(origin = ?origin, target = ?target, "Trying to copy file");
        match self.backend.copy(origin, target).await {
            Ok(bytes) => {
                trace!(target = ?target, bytes, "Copied file");
                Ok(target.to_path_buf())
            }
            Err(source) => Err(RewriteError {
                origin: origin.to_path_buf(),
                target: target.to_path_buf(),
                source,
            }),
        }
    }
}
