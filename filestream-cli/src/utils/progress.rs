use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::utils::format_bytes;

fn download_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} {msg}\n[{elapsed_precise}] [{bar:40.green/white}] {bytes}/{total_bytes} @ {bytes_per_sec}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg} [{elapsed_precise}] {bytes} @ {bytes_per_sec}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Progress bar fed by the download progress callback.
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
    disabled: bool,
}

impl ProgressManager {
    pub fn new(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(spinner_style());
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(500));

        Self {
            bar,
            disabled: false,
        }
    }

    pub fn new_disabled() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            disabled: true,
        }
    }

    /// Handle a `(bytes_read, total)` progress report
    pub fn update(&self, read: u64, total: Option<u64>) {
        if self.disabled {
            return;
        }

        if let Some(total) = total {
            if self.bar.length() != Some(total) {
                self.bar.set_style(download_style());
                self.bar.set_length(total);
            }
        }
        self.bar.set_position(read);
    }

    pub fn finish(&self, size: u64) {
        if !self.disabled {
            self.bar
                .finish_with_message(format!("Finished ({})", format_bytes(size)));
        }
    }

    pub fn abandon(&self, reason: &str) {
        if !self.disabled {
            self.bar.abandon_with_message(reason.to_string());
        }
    }
}
