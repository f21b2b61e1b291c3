//! # Builders
//!
//! Fluent construction of [`DownloaderConfig`] and [`Downloader`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use filestream::{Downloader, DownloaderConfig, Store};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DownloaderConfig::builder()
//!     .with_connect_timeout(Duration::from_secs(5))
//!     .with_user_agent("installer/2.0")
//!     .with_header("X-Channel", "stable")
//!     .build();
//!
//! let store = Store::direct(std::env::temp_dir(), "artifacts")?;
//! let downloader = Downloader::builder(store).config(config).build()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tokio::runtime::Handle;

use crate::download::Downloader;
use crate::download::network::create_client;
use crate::error::DownloadError;
use crate::rewriter::{LinkRewriter, Rewriter};
use crate::store::Store;
use crate::DownloaderConfig;

/// Builder for creating DownloaderConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct DownloaderConfigBuilder {
    config: DownloaderConfig,
}

impl DownloaderConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: DownloaderConfig::default(),
        }
    }

    /// Set the connection timeout (time to establish initial connection)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the read timeout (maximum time between receiving data chunks)
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header; invalid names or values are ignored
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<reqwest::header::HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.headers.insert(name, value);
        }
        self
    }

    /// Set all HTTP headers, replacing any existing headers
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.config.headers = headers;
        self
    }

    /// Enable or disable hex dumps of received chunks
    pub fn with_trace_bytes(mut self, enabled: bool) -> Self {
        self.config.trace_bytes = enabled;
        self
    }

    /// Build the DownloaderConfig instance
    pub fn build(self) -> DownloaderConfig {
        self.config
    }
}

impl Default for DownloaderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Binds a [`Store`] to an HTTP client, a runtime and a rewriter.
pub struct DownloaderBuilder {
    store: Store,
    config: DownloaderConfig,
    runtime: Option<Handle>,
    rewriter: Option<Arc<dyn Rewriter>>,
}

impl DownloaderBuilder {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            config: DownloaderConfig::default(),
            runtime: None,
            rewriter: None,
        }
    }

    pub fn config(mut self, config: DownloaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Run downloads on this runtime instead of the one current at `build` time
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn rewriter(mut self, rewriter: Arc<dyn Rewriter>) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    pub fn build(self) -> Result<Downloader, DownloadError> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| DownloadError::Runtime)?,
        };
        let client = create_client(&self.config)?;
        let rewriter: Arc<dyn Rewriter> = match self.rewriter {
            Some(rewriter) => rewriter,
            None => Arc::new(LinkRewriter::new()),
        };

        Ok(Downloader::from_parts(
            self.store,
            client,
            Arc::new(self.config),
            runtime,
            rewriter,
        ))
    }
}
