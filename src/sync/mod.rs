//! One synchronization run.
//!
//! A run walks these phases in order:
//!
//! 1. Discover tuners, their recording groups and recordings (concurrently).
//! 2. Classify each recording against its category's catalog and queue the
//!    ones that need downloading; new rows are committed once per category
//!    before any transfer starts.
//! 3. Download the queue one file at a time, committing each finished job.
//! 4. Apply the delete policy (skipped when the run was interrupted).
//! 5. Fetch missing series artwork.
//!
//! An episode row is inserted with its interrupted flag set and only cleared
//! after its file is complete, so a crash at any point leaves the next run
//! enough state to resume.

mod artwork;
mod discovery;
mod error;
mod plan;
mod report;
mod retire;

pub use error::SyncError;
pub use report::SyncReport;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use self::plan::PlannedDownload;
use crate::catalog::Catalog;
use crate::config::SyncConfig;
use crate::device::RecordingCategory;
use crate::download::{DownloadError, DownloadManager, HttpClient};
use crate::library::LibraryRoots;

/// Runs sync passes with a fixed configuration.
#[derive(Debug)]
pub struct SyncRunner {
    config: SyncConfig,
    client: HttpClient,
    roots: LibraryRoots,
    catalogs: BTreeMap<RecordingCategory, Catalog>,
}

impl SyncRunner {
    /// Creates a runner over already-open catalogs.
    ///
    /// A category with a library root but no catalog is treated as
    /// unconfigured.
    #[must_use]
    pub fn new(
        config: SyncConfig,
        client: HttpClient,
        catalogs: BTreeMap<RecordingCategory, Catalog>,
    ) -> Self {
        let roots = config.library_roots();
        Self {
            config,
            client,
            roots,
            catalogs,
        }
    }

    /// Builds the HTTP client from the configuration and opens the catalog
    /// under every configured library root.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Catalog`] if a catalog cannot be opened.
    pub async fn open(config: SyncConfig) -> Result<Self, SyncError> {
        let client = HttpClient::new_with_timeouts(
            config.http.connect_timeout_secs,
            config.http.read_timeout_secs,
        );
        let mut catalogs = BTreeMap::new();
        for (category, root) in config.library_roots().configured() {
            let catalog = Catalog::open(root)
                .await
                .map_err(SyncError::catalog(category))?;
            catalogs.insert(category, catalog);
        }
        Ok(Self::new(config, client, catalogs))
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    #[must_use]
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Catalog and library root for a category, when both exist.
    pub(crate) fn target(
        &self,
        category: RecordingCategory,
    ) -> Option<(&Catalog, &std::path::Path)> {
        Some((self.catalogs.get(&category)?, self.roots.root(category)?))
    }

    /// Runs one sync pass now.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when a catalog write fails or a library
    /// directory cannot be created; device and transfer failures are counted
    /// in the report instead.
    pub async fn run(
        &self,
        interrupted: &AtomicBool,
        progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<SyncReport, SyncError> {
        self.run_at(Utc::now(), interrupted, progress).await
    }

    /// Runs one sync pass treating `now` as the current time.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    #[instrument(skip(self, interrupted, progress))]
    pub async fn run_at(
        &self,
        now: DateTime<Utc>,
        interrupted: &AtomicBool,
        progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        let groups = discovery::discover_recordings(
            &self.client,
            &self.config.tuners,
            self.config.schema,
            &mut report,
        )
        .await;
        if interrupted.load(Ordering::SeqCst) {
            report.interrupted = true;
            return Ok(report);
        }

        let planned = self.plan(&groups, now, &mut report).await?;
        report.queued = planned.len();

        self.download(planned, interrupted, progress, &mut report)
            .await?;

        if interrupted.load(Ordering::SeqCst) {
            report.interrupted = true;
            info!(%report, "sync interrupted");
            return Ok(report);
        }

        if let Some(policy) = self.config.delete_policy {
            self.apply_delete_policy(policy, now, interrupted, &mut report)
                .await?;
        }
        if !interrupted.load(Ordering::SeqCst) {
            self.fetch_artwork(&mut report).await?;
        }
        report.interrupted = interrupted.load(Ordering::SeqCst);

        info!(%report, "sync finished");
        Ok(report)
    }

    async fn download(
        &self,
        planned: Vec<PlannedDownload>,
        interrupted: &AtomicBool,
        progress: &mut (dyn FnMut(f64) + Send),
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        if planned.is_empty() {
            return Ok(());
        }

        let mut manager = DownloadManager::new(self.client.clone());
        for job in planned {
            let key = (job.category, job.episode_id);
            manager.add(&job.url, &job.destination, key).await;
        }
        info!(
            jobs = manager.len(),
            total_mib = manager.total_size() / crate::download::constants::MIB,
            "starting downloads"
        );

        while !interrupted.load(Ordering::SeqCst) {
            let Some(outcome) = manager.download_next(interrupted, progress).await else {
                break;
            };
            let (category, episode_id) = outcome.key;
            match outcome.result {
                Ok(_) => {
                    if let Some(catalog) = self.catalogs.get(&category) {
                        catalog
                            .mark_download_complete(episode_id)
                            .await
                            .map_err(SyncError::catalog(category))?;
                    }
                    report.downloaded += 1;
                }
                Err(DownloadError::Interrupted { .. }) => break,
                Err(e) => {
                    warn!(path = %outcome.destination.display(), error = %e, "download failed; will retry next run");
                    report.download_failures += 1;
                }
            }
        }
        let stats = manager.stats();
        info!(
            completed = stats.completed(),
            failed = stats.failed(),
            remaining = manager.len(),
            "download phase finished"
        );
        Ok(())
    }
}
