use std::sync::Arc;

use bytes::BytesMut;
use reqwest::header::{HOST, HeaderValue, REFERER};
use reqwest::{Client, Response};
use tokio_util::sync::CancellationToken;
use tracing::trace;
use url::Url;

use crate::DownloaderConfig;
use crate::download::request::ProgressCallback;
use crate::error::DownloadError;

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &DownloaderConfig) -> Result<Client, DownloadError> {
    let mut client_builder = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone());

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    if !config.read_timeout.is_zero() {
        client_builder = client_builder.read_timeout(config.read_timeout);
    }

    client_builder
        .build()
        .map_err(|e| DownloadError::Client(Arc::new(e)))
}

/// `Host` header value: the host plus any explicit port
pub(crate) fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Send the GET request and check the status line.
pub(crate) async fn connect(client: &Client, url: &Url) -> Result<Response, DownloadError> {
    trace!(url = %url, "Opening connection");

    let mut request = client.get(url.clone());
    if let Some(host) = host_header(url).and_then(|h| HeaderValue::from_str(&h).ok()) {
        request = request.header(HOST, host);
    }
    if let Ok(referer) = HeaderValue::from_str(url.as_str()) {
        request = request.header(REFERER, referer);
    }

    let response = request.send().await.map_err(|e| DownloadError::Connect {
        url: url.to_string(),
        source: Arc::new(e),
    })?;

    if !response.status().is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    Ok(response)
}

/// Read the whole body into memory, reporting progress after every chunk.
///
/// Returns [`DownloadError::Cancelled`] as soon as `interrupt` fires.
pub(crate) async fn read_body(
    mut response: Response,
    url: &Url,
    interrupt: &CancellationToken,
    callback: Option<&ProgressCallback>,
    trace_bytes: bool,
) -> Result<BytesMut, DownloadError> {
    let total = response.content_length();
    trace!(url = %url, total = ?total, "Connection opened");

    let mut buffer = BytesMut::with_capacity(total.unwrap_or(0).min(64 * 1024 * 1024) as usize);
    let mut total_read: u64 = 0;

    loop {
        let chunk = tokio::select! {
            biased;
            _ = interrupt.cancelled() => {
                trace!(url = %url, total_read, "Transfer interrupted");
                return Err(DownloadError::Cancelled);
            }
            chunk = response.chunk() => chunk.map_err(|e| DownloadError::Read {
                url: url.to_string(),
                source: Arc::new(e),
            })?,
        };

        let Some(chunk) = chunk else {
            break;
        };

        total_read += chunk.len() as u64;
        if trace_bytes {
            trace!(read = chunk.len(), total_read, buffer = %hex::encode_upper(&chunk), "Received chunk");
        }
        buffer.extend_from_slice(&chunk);

        if let Some(callback) = callback {
            callback(total_read, total);
        }
    }

    Ok(buffer)
}
