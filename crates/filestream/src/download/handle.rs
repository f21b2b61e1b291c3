use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::DownloadError;

pub(crate) type Outcome = Option<Result<PathBuf, DownloadError>>;

/// Cancellation signals shared between a handle and its task.
#[derive(Debug, Default)]
pub(crate) struct Control {
    /// Set by any successful `cancel`; checked before the task starts working
    pub(crate) cancelled: CancellationToken,
    /// Set by `cancel(true)`; observed by the read loop
    pub(crate) interrupt: CancellationToken,
}

/// Caller-facing token for an in-progress or completed download.
///
/// Cloning is cheap; every clone observes the same outcome.
#[derive(Debug, Clone)]
pub struct Download {
    source: Url,
    control: Arc<Control>,
    outcome: watch::Receiver<Outcome>,
}

impl Download {
    pub(crate) fn new(source: Url, control: Arc<Control>, outcome: watch::Receiver<Outcome>) -> Self {
        Self {
            source,
            control,
            outcome,
        }
    }

    pub fn source(&self) -> &Url {
        &self.source
    }

    /// Cancel the download.
    ///
    /// A download that has not started yet never starts. A running transfer is
    /// only abandoned when `force_if_running` is set; otherwise it keeps running
    /// but its result is discarded. Returns `false` if the download had already
    /// finished or been cancelled.
    pub fn cancel(&self, force_if_running: bool) -> bool {
        if self.is_done() {
            return false;
        }

        self.control.cancelled.cancel();
        if force_if_running {
            self.control.interrupt.cancel();
        }
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.cancelled.is_cancelled()
    }

    /// True once the download finished, failed or was cancelled
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.outcome.borrow().is_some()
    }

    /// Wait for the final artifact path.
    pub async fn get(&self) -> Result<PathBuf, DownloadError> {
        if self.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        let mut outcome = self.outcome.clone();
        tokio::select! {
            _ = self.control.cancelled.cancelled() => Err(DownloadError::Cancelled),
            result = outcome.wait_for(Option::is_some) => match result {
                Ok(value) => match value.as_ref() {
                    Some(result) => result.clone(),
                    None => Err(DownloadError::TaskAborted),
                },
                Err(_) => Err(DownloadError::TaskAborted),
            },
        }
    }

    /// Like [`Download::get`], giving up after `timeout`.
    ///
    /// Timing out does not cancel the download.
    pub async fn get_timeout(&self, timeout: Duration) -> Result<PathBuf, DownloadError> {
        tokio::time::timeout(timeout, self.get())
            .await
            .map_err(|_| DownloadError::Timeout(timeout))?
    }
}
