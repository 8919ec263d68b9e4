//! HTTP access to tuners and sequential recording downloads.
//!
//! - [`HttpClient`] wraps `reqwest` with the timeouts, user agent and error
//!   mapping shared by every device call.
//! - [`DownloadManager`] runs a batch of downloads one after another and
//!   reports a single progress value weighted by each file's size.
//!
//! # Example
//!
//! ```no_run
//! use dvrsync_core::download::{DownloadManager, HttpClient};
//! use std::path::Path;
//! use std::sync::atomic::AtomicBool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = DownloadManager::new(HttpClient::new());
//! manager.add("http://192.168.1.20:5004/recorded/play?id=1", Path::new("/media/a.mpg"), 1).await;
//! let interrupted = AtomicBool::new(false);
//! while let Some(outcome) = manager.download_next(&interrupted, &mut |p: f64| println!("{p:.1}%")).await {
//!     println!("job {} -> {:?}", outcome.key, outcome.result);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod manager;

pub use client::HttpClient;
pub use error::DownloadError;
pub use manager::{DownloadJob, DownloadManager, DownloadStats, JobOutcome};

// Use `Result<T, DownloadError>` explicitly in function signatures.
