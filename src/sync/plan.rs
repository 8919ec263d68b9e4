//! Classifying discovered recordings against the catalog.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::discovery::DiscoveredGroup;
use super::{SyncError, SyncReport, SyncRunner};
use crate::catalog::{CatalogBatch, CatalogError, DeleteReason, DownloadReason, SeriesRecord};
use crate::device::{Recording, RecordingCategory};
use crate::policy::DeletePolicy;

/// A download decided during classification, backed by a committed
/// interrupted episode row.
#[derive(Debug, Clone)]
pub(crate) struct PlannedDownload {
    pub category: RecordingCategory,
    pub episode_id: i64,
    pub url: String,
    pub destination: PathBuf,
}

/// What to do with one eligible recording.
enum Decision {
    Download(DownloadReason),
    Skip,
}

impl SyncRunner {
    /// Classifies every recording and persists new rows, one commit per
    /// category.
    pub(crate) async fn plan(
        &self,
        groups: &[DiscoveredGroup],
        now: DateTime<Utc>,
        report: &mut SyncReport,
    ) -> Result<Vec<PlannedDownload>, SyncError> {
        let mut planned = Vec::new();
        for category in RecordingCategory::ALL {
            let in_category: Vec<&DiscoveredGroup> = groups
                .iter()
                .filter(|g| g.group.category == category)
                .collect();
            if in_category.is_empty() {
                continue;
            }

            let Some((catalog, _)) = self.target(category) else {
                for g in in_category {
                    error!(
                        category = %category,
                        title = %g.group.title,
                        "no library configured for category; skipping"
                    );
                    report.unconfigured += g.recordings.len();
                }
                continue;
            };

            let mut batch = catalog
                .begin()
                .await
                .map_err(SyncError::catalog(category))?;
            for g in in_category {
                self.plan_group(&mut batch, g, now, report, &mut planned).await?;
            }
            batch.commit().await.map_err(SyncError::catalog(category))?;
        }
        Ok(planned)
    }

    async fn plan_group(
        &self,
        batch: &mut CatalogBatch,
        discovered: &DiscoveredGroup,
        now: DateTime<Utc>,
        report: &mut SyncReport,
        planned: &mut Vec<PlannedDownload>,
    ) -> Result<(), SyncError> {
        let group = &discovered.group;
        let catalog_error = || SyncError::catalog(group.category);
        let mut series: Option<SeriesRecord> = None;

        for recording in &discovered.recordings {
            if recording.is_still_recording(now) {
                info!(
                    title = %group.title,
                    episode = recording.episode_number.as_deref().unwrap_or(""),
                    "still recording; not downloading yet"
                );
                report.still_recording += 1;
                continue;
            }

            let local = match self.roots.episode_file(group, recording) {
                Ok(Some(path)) => path,
                Ok(None) => {
                    report.unconfigured += 1;
                    continue;
                }
                Err(e) => {
                    error!(title = %group.title, error = %e, "cannot place recording; skipping");
                    report.unplaceable += 1;
                    continue;
                }
            };

            let series_row = match series.take() {
                Some(row) => row,
                None => batch
                    .find_or_create_series(group)
                    .await
                    .map_err(catalog_error())?,
            };
            let decision = self
                .decide(batch, &series_row, recording, &local)
                .await
                .map_err(catalog_error())?;
            if let Decision::Download(reason) = decision {
                let destination = self
                    .roots
                    .episode_path(group, recording)
                    .await?
                    .unwrap_or(local);
                let episode = batch
                    .insert_episode(&series_row, recording, reason, now)
                    .await
                    .map_err(catalog_error())?;
                info!(
                    title = %group.title,
                    filename = %recording.filename,
                    reason = %reason,
                    "queued download"
                );
                planned.push(PlannedDownload {
                    category: group.category,
                    episode_id: episode.id,
                    url: recording.play_url.clone(),
                    destination,
                });
            } else {
                report.already_downloaded += 1;
            }
            series = Some(series_row);
        }
        Ok(())
    }

    /// Matches a recording against the live episode with the same filename,
    /// retiring that row when it is about to be replaced.
    async fn decide(
        &self,
        batch: &mut CatalogBatch,
        series: &SeriesRecord,
        recording: &Recording,
        local: &Path,
    ) -> Result<Decision, CatalogError> {
        let Some(existing) = batch
            .find_active_episode(series.id, &recording.filename)
            .await?
        else {
            return Ok(Decision::Download(DownloadReason::New));
        };

        if existing.download_interrupted {
            batch
                .retire_episode(existing.id, DeleteReason::ReDownloaded)
                .await?;
            return Ok(Decision::Download(DownloadReason::DownloadInterrupted));
        }

        let redownload = self.config.redownload_missing
            && self.config.delete_policy != Some(DeletePolicy::AfterDeleted);
        if redownload && !tokio::fs::try_exists(local).await.unwrap_or(false) {
            info!(path = %local.display(), "local copy missing; downloading again");
            batch
                .retire_episode(existing.id, DeleteReason::ReDownloaded)
                .await?;
            return Ok(Decision::Download(DownloadReason::ReDownloaded));
        }

        debug!(filename = %recording.filename, "already downloaded");
        Ok(Decision::Skip)
    }
}
