//! HTTP client wrapper for tuner traffic and recording downloads.
//!
//! This module provides the `HttpClient` struct which handles JSON requests
//! against tuner endpoints, metadata-only size probes, device commands, and
//! streaming downloads with proper timeout configuration and error handling.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, MIB, PROGRESS_LOG_INTERVAL_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// HTTP client shared by the device client, the download manager and the
/// artwork fetcher.
///
/// Create it once per run and reuse it so connections to each tuner are
/// pooled.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes between received chunks
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// The read timeout applies per read, not to the whole transfer, so a
    /// multi-gigabyte recording is never cut off while bytes keep flowing.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Fetches `url` and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` on transport failure, a non-2xx status, or a
    /// body that is not valid JSON.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, DownloadError> {
        let response = self.send(self.client.get(url), url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(url, e))?;
        serde_json::from_slice(&body).map_err(|e| DownloadError::decode(url, e))
    }

    /// Issues a metadata-only request and returns the advertised
    /// `Content-Length`, if any.
    ///
    /// Tries `HEAD` first. A device that rejects `HEAD` with an error status
    /// is asked with a `GET` whose body is dropped unread once the headers
    /// arrive.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` on transport failure or when both requests
    /// answer with a non-2xx status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn probe_content_length(&self, url: &str) -> Result<Option<u64>, DownloadError> {
        let length = match self.send(self.client.head(url), url).await {
            Ok(response) => header_content_length(&response),
            Err(DownloadError::HttpStatus { status, .. }) => {
                debug!(url = %url, status, "HEAD rejected, probing with GET");
                let response = self.send(self.client.get(url), url).await?;
                let length = header_content_length(&response);
                drop(response);
                length
            }
            Err(e) => return Err(e),
        };
        if length.is_none() {
            warn!(url = %url, "unable to determine Content-Length");
        }
        Ok(length)
    }

    /// Sends a bodiless `POST` to a device command URL.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::HttpStatus` when the device rejects the
    /// command, or another `DownloadError` on transport failure.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn post_command(&self, url: &str) -> Result<(), DownloadError> {
        self.send(self.client.post(url), url).await?;
        Ok(())
    }

    /// Streams `url` into the file at `path`, truncating any previous
    /// content.
    ///
    /// `on_progress` receives the running byte count for this transfer after
    /// every chunk. The `interrupted` flag is checked between chunks; when it
    /// is set the transfer stops with [`DownloadError::Interrupted`]. A failed
    /// or interrupted transfer removes the partial file.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Writing to disk fails
    /// - The transfer is interrupted
    #[instrument(skip(self, interrupted, on_progress), fields(url = %url, path = %path.display()))]
    pub async fn download_to_path(
        &self,
        url: &str,
        path: &Path,
        interrupted: &AtomicBool,
        on_progress: &mut (dyn FnMut(u64) + Send),
    ) -> Result<u64, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self.send(self.client.get(url), url).await?;
        let expected = response.content_length();
        match expected {
            Some(size) => info!(path = %path.display(), size_mib = size / MIB, "downloading"),
            None => {
                warn!(url = %url, "unable to determine Content-Length");
                info!(path = %path.display(), "downloading");
            }
        }

        let mut file = File::create(path)
            .await
            .map_err(|e| DownloadError::io(path, e))?;

        let result =
            stream_to_file(&mut file, response, url, path, expected, interrupted, on_progress).await;

        if result.is_err() {
            debug!(path = %path.display(), "cleaning up partial file after error");
            drop(file);
            let _ = tokio::fs::remove_file(path).await;
        }

        let bytes = result?;
        info!(path = %path.display(), bytes, "download complete");
        Ok(bytes)
    }

    /// Downloads a small file (artwork) to `path`.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`download_to_path`](Self::download_to_path).
    pub async fn download_small(&self, url: &str, path: &Path) -> Result<u64, DownloadError> {
        let never = AtomicBool::new(false);
        self.download_to_path(url, path, &never, &mut |_| {}).await
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, DownloadError> {
        let response = request
            .send()
            .await
            .map_err(|e| map_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

fn header_content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

fn map_transport_error(url: &str, error: reqwest::Error) -> DownloadError {
    if error.is_timeout() {
        DownloadError::timeout(url)
    } else {
        DownloadError::network(url, error)
    }
}

/// Streams response body to file, returning bytes written.
///
/// Extracted so the caller can clean up on error.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    expected: Option<u64>,
    interrupted: &AtomicBool,
    on_progress: &mut (dyn FnMut(u64) + Send),
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;
    let log_interval = Duration::from_secs(PROGRESS_LOG_INTERVAL_SECS);
    let mut last_log = Instant::now();

    while let Some(chunk_result) = stream.next().await {
        if interrupted.load(Ordering::SeqCst) {
            return Err(DownloadError::interrupted(url));
        }

        let chunk = chunk_result.map_err(|e| map_transport_error(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
        on_progress(bytes_written);

        if last_log.elapsed() >= log_interval {
            last_log = Instant::now();
            match expected {
                Some(total) => debug!(done_mib = bytes_written / MIB, total_mib = total / MIB, "downloaded"),
                None => debug!(done_mib = bytes_written / MIB, "downloaded"),
            }
        }
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
