//! # Downloads
//!
//! Fetch-or-reuse of remote resources into a store, with cancellable handles.

mod downloader;
mod handle;
pub(crate) mod network;
mod request;
mod validity;

pub use downloader::Downloader;
pub use handle::Download;
pub use network::create_client;
pub use request::{DownloadRequest, ProgressCallback, Target};
pub use validity::{HashProvider, is_valid};
