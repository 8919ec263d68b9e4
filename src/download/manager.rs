//! Sequential batch downloads with one aggregated progress value.
//!
//! Jobs run strictly in the order they were added, one at a time, so a
//! tuner never serves more than one recording stream to this process. Each
//! job carries its expected byte size, probed up front, and progress is the
//! share of the batch's total expected bytes that has been transferred:
//!
//! ```text
//! (bytes of finished jobs + bytes of current job) * 100 / total expected bytes
//! ```
//!
//! When the batch has no known size at all, progress is not reported.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use tracing::{debug, info, instrument, warn};

use super::{DownloadError, HttpClient};

/// One queued transfer.
#[derive(Debug, Clone)]
pub struct DownloadJob<K> {
    pub url: String,
    pub destination: PathBuf,
    /// Size used to weight this job's share of the batch progress.
    pub expected_size: u64,
    /// Caller-side identity of the job (e.g. a catalog row id).
    pub key: K,
}

/// Result of running one job.
#[derive(Debug)]
pub struct JobOutcome<K> {
    pub key: K,
    pub destination: PathBuf,
    /// Bytes written, or why the transfer failed.
    pub result: Result<u64, DownloadError>,
}

/// Statistics from a download batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadStats {
    completed: usize,
    failed: usize,
}

impl DownloadStats {
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    fn record(&mut self, ok: bool) {
        if ok {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Runs a queue of downloads in order, reporting weighted progress.
#[derive(Debug)]
pub struct DownloadManager<K> {
    client: HttpClient,
    jobs: VecDeque<DownloadJob<K>>,
    total_size: u64,
    finished_size: u64,
    stats: DownloadStats,
}

impl<K> DownloadManager<K> {
    /// Creates an empty batch.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            jobs: VecDeque::new(),
            total_size: 0,
            finished_size: 0,
            stats: DownloadStats::default(),
        }
    }

    /// Probes `url` for its size and queues it, returning the size used.
    ///
    /// A missing `Content-Length` or a failed probe queues the job with size
    /// zero; the transfer itself decides whether the recording is reachable.
    #[instrument(skip(self, destination, key), fields(url = %url))]
    pub async fn add(&mut self, url: &str, destination: &Path, key: K) -> u64 {
        let size = match self.client.probe_content_length(url).await {
            Ok(length) => length.unwrap_or(0),
            Err(e) => {
                warn!(url = %url, error = %e, "size probe failed, queueing without size");
                0
            }
        };
        self.add_with_size(url, destination, key, size);
        size
    }

    /// Queues a job whose size is already known.
    pub fn add_with_size(&mut self, url: &str, destination: &Path, key: K, expected_size: u64) {
        debug!(url = %url, expected_size, "queued download");
        self.total_size += expected_size;
        self.jobs.push_back(DownloadJob {
            url: url.to_string(),
            destination: destination.to_path_buf(),
            expected_size,
            key,
        });
    }

    /// Number of jobs not yet run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Sum of every queued job's expected size, including finished ones.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    #[must_use]
    pub fn stats(&self) -> DownloadStats {
        self.stats
    }

    /// Batch progress with `current` bytes done in the running job, or
    /// `None` when the batch has no known size.
    #[must_use]
    pub fn progress_percent(&self, current: u64) -> Option<f64> {
        batch_percent(self.finished_size, current, self.total_size)
    }

    /// Runs the next job, feeding `progress` with the batch percentage.
    ///
    /// A finished job counts with its full expected size whether it
    /// succeeded or not, so later progress never moves backwards. Returns
    /// `None` once the queue is empty.
    pub async fn download_next(
        &mut self,
        interrupted: &AtomicBool,
        progress: &mut (dyn FnMut(f64) + Send),
    ) -> Option<JobOutcome<K>> {
        let job = self.jobs.pop_front()?;
        let finished = self.finished_size;
        let total = self.total_size;
        let cap = job.expected_size;

        let mut on_bytes = |bytes: u64| {
            if let Some(percent) = batch_percent(finished, bytes.min(cap), total) {
                progress(percent);
            }
        };
        let result = self
            .client
            .download_to_path(&job.url, &job.destination, interrupted, &mut on_bytes)
            .await;

        self.finished_size += job.expected_size;
        self.stats.record(result.is_ok());
        match &result {
            Ok(bytes) => {
                if let Some(percent) = self.progress_percent(0) {
                    progress(percent);
                }
                info!(path = %job.destination.display(), bytes, "job finished");
            }
            Err(error) => warn!(url = %job.url, error = %error, "job failed"),
        }

        Some(JobOutcome {
            key: job.key,
            destination: job.destination,
            result,
        })
    }
}

fn batch_percent(finished: u64, current: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let percent = (finished + current) as f64 * 100.0 / total as f64;
    Some(percent.min(100.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(server: &MockServer, route: &str, size: usize) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; size]))
            .mount(server)
            .await;
    }

    #[test]
    fn test_batch_percent_guards_zero_total() {
        assert_eq!(batch_percent(0, 0, 0), None);
        assert_eq!(batch_percent(100, 0, 400), Some(25.0));
        assert_eq!(batch_percent(400, 50, 400), Some(100.0));
    }

    #[tokio::test]
    async fn test_progress_is_weighted_by_size() {
        let server = MockServer::start().await;
        serve(&server, "/a", 100).await;
        serve(&server, "/b", 300).await;
        let dir = TempDir::new().unwrap();

        let mut manager = DownloadManager::new(HttpClient::new());
        manager.add_with_size(&format!("{}/a", server.uri()), &dir.path().join("a"), 1, 100);
        manager.add_with_size(&format!("{}/b", server.uri()), &dir.path().join("b"), 2, 300);
        assert_eq!(manager.total_size(), 400);

        let never = AtomicBool::new(false);
        let mut seen = Vec::new();
        let first = manager
            .download_next(&never, &mut |p| seen.push(p))
            .await
            .unwrap();
        assert_eq!(first.key, 1);
        assert_eq!(first.result.unwrap(), 100);
        assert_eq!(seen.last().copied(), Some(25.0));
        assert_eq!(manager.progress_percent(0), Some(25.0));

        let second = manager
            .download_next(&never, &mut |p| seen.push(p))
            .await
            .unwrap();
        assert_eq!(second.key, 2);
        assert_eq!(seen.last().copied(), Some(100.0));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress is monotonic");

        assert!(manager.download_next(&never, &mut |_| {}).await.is_none());
        assert_eq!(manager.stats().completed(), 2);
    }

    #[tokio::test]
    async fn test_zero_sized_batch_reports_no_progress() {
        let server = MockServer::start().await;
        serve(&server, "/a", 10).await;
        let dir = TempDir::new().unwrap();

        let mut manager = DownloadManager::new(HttpClient::new());
        manager.add_with_size(&format!("{}/a", server.uri()), &dir.path().join("a"), (), 0);

        let never = AtomicBool::new(false);
        let mut calls = 0;
        let outcome = manager
            .download_next(&never, &mut |_| calls += 1)
            .await
            .unwrap();
        assert!(outcome.result.is_ok());
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_failed_job_does_not_stop_batch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        serve(&server, "/b", 30).await;
        let dir = TempDir::new().unwrap();

        let mut manager = DownloadManager::new(HttpClient::new());
        manager.add_with_size(&format!("{}/gone", server.uri()), &dir.path().join("a"), "a", 10);
        manager.add_with_size(&format!("{}/b", server.uri()), &dir.path().join("b"), "b", 30);

        let never = AtomicBool::new(false);
        let first = manager.download_next(&never, &mut |_| {}).await.unwrap();
        assert!(matches!(
            first.result,
            Err(DownloadError::HttpStatus { status: 404, .. })
        ));
        let second = manager.download_next(&never, &mut |_| {}).await.unwrap();
        assert_eq!(second.result.unwrap(), 30);
        assert_eq!(manager.stats().failed(), 1);
        assert_eq!(manager.stats().completed(), 1);
    }

    #[tokio::test]
    async fn test_add_probes_content_length() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 1234]))
            .mount(&server)
            .await;

        let mut manager = DownloadManager::new(HttpClient::new());
        let size = manager
            .add(&format!("{}/a", server.uri()), Path::new("/tmp/a"), ())
            .await;
        assert_eq!(size, 1234);
        assert_eq!(manager.total_size(), 1234);
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_probe_queues_without_size() {
        let server = MockServer::start().await;
        Mock::given(path("/a"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut manager = DownloadManager::new(HttpClient::new());
        let size = manager
            .add(&format!("{}/a", server.uri()), Path::new("/tmp/a"), ())
            .await;
        assert_eq!(size, 0);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.total_size(), 0);
    }
}
