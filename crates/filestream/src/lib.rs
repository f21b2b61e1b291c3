//! # Filestream
//!
//! A local content-addressed artifact cache with a concurrent downloader.
//! Remote resources are fetched into a deduplicated on-disk [`Store`], checked
//! against an expected digest, and exposed at caller-chosen paths through a
//! symlink, hard link or copy.
//!
//! ## Features
//!
//! - Direct and hash-sharded object naming
//! - Fetch-or-reuse downloads driven by digest validation
//! - Cancellable, cloneable download handles
//! - Link-fallback materialization
//!
//! ## Example
//!
//! ```no_run
//! use filestream::{DownloadRequest, Downloader, HashProvider, ObjectSchema, Store};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Store::new(std::env::temp_dir(), ".artifacts", ObjectSchema::SHA256_SHARDED)?;
//! let downloader = Downloader::new(store)?;
//!
//! let request = DownloadRequest::new("https://example.test/jdk.zip".parse()?)
//!     .with_hash(HashProvider::sha256("9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"))
//!     .to_path("tools/jdk.zip");
//!
//! let path = downloader.download(request).get().await?;
//! println!("available at {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod context;
pub mod digest;
pub mod download;
pub mod error;
pub mod platform;
pub mod rewriter;
pub mod store;

pub use builder::{DownloaderBuilder, DownloaderConfigBuilder};
pub use config::DownloaderConfig;
pub use context::AppContext;
pub use digest::DigestAlgorithm;
pub use download::{
    Download, DownloadRequest, Downloader, HashProvider, ProgressCallback, Target, is_valid,
};
pub use error::{DownloadError, RewriteError, StoreError};
pub use platform::{Architecture, OperatingSystem, Platform};
pub use rewriter::{LinkRewriter, Rewriter};
pub use store::{ObjectSchema, Store};
