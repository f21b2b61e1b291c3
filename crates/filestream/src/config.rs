use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

/// Identifies this tool to remote servers
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Connect and read timeout applied to every fetch
pub const NETWORK_TIMEOUT: Duration = Duration::from_secs(15);

/// Environment variable enabling hex dumps of every received chunk at trace level
pub const TRACE_BYTES_ENV: &str = "FILESTREAM_TRACE_BYTES";

/// Options for the HTTP side of the downloader
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Read timeout (maximum time between receiving data chunks)
    pub read_timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Headers sent with every request, in addition to `Host` and `Referer`
    pub headers: HeaderMap,

    /// Log every received chunk as hex at trace level
    pub trace_bytes: bool,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            connect_timeout: NETWORK_TIMEOUT,
            read_timeout: NETWORK_TIMEOUT,
            user_agent: USER_AGENT.to_owned(),
            headers: DownloaderConfig::get_default_headers(),
            trace_bytes: trace_bytes_from_env(),
        }
    }
}

impl DownloaderConfig {
    pub fn builder() -> crate::builder::DownloaderConfigBuilder {
        crate::builder::DownloaderConfigBuilder::new()
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));

        default_headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate"),
        );

        default_headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.5"),
        );

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );
        default_headers
    }
}

fn trace_bytes_from_env() -> bool {
    std::env::var(TRACE_BYTES_ENV)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
