//! Delete-policy phase: removing downloaded recordings from the device.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{SyncError, SyncReport, SyncRunner};
use crate::catalog::DeleteReason;
use crate::policy::DeletePolicy;

impl SyncRunner {
    /// Deletes every completed episode the policy says is due.
    ///
    /// A transport failure leaves the episode live so the next run retries
    /// it. A recording the device no longer has is marked
    /// [`DeleteReason::RemoteDeleted`].
    pub(crate) async fn apply_delete_policy(
        &self,
        policy: DeletePolicy,
        now: DateTime<Utc>,
        interrupted: &AtomicBool,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        for (&category, catalog) in &self.catalogs {
            let series: HashMap<i64, _> = catalog
                .series_list()
                .await
                .map_err(SyncError::catalog(category))?
                .into_iter()
                .map(|s| (s.id, s))
                .collect();
            let episodes = catalog
                .completed_episodes()
                .await
                .map_err(SyncError::catalog(category))?;

            for episode in episodes {
                if interrupted.load(Ordering::SeqCst) {
                    return Ok(());
                }
                let Some(owner) = series.get(&episode.series_ref) else {
                    warn!(episode_id = episode.id, "episode has no series row; skipping");
                    continue;
                };
                let local = match self.roots.episode_file(&owner.metadata, &episode.metadata) {
                    Ok(Some(path)) => path,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(episode_id = episode.id, error = %e, "cannot locate local copy; skipping");
                        continue;
                    }
                };
                let local_exists = tokio::fs::try_exists(&local).await.unwrap_or(false);
                if !policy.is_due(&episode, local_exists, now) {
                    continue;
                }

                let rerecord = self
                    .config
                    .rerecord_policy
                    .should_rerecord(&episode.metadata, local_exists);
                let reason = match episode.metadata.delete(&self.client, rerecord).await {
                    Ok(true) => policy.reason(),
                    Ok(false) => {
                        debug!(episode_id = episode.id, "recording already gone from device");
                        DeleteReason::RemoteDeleted
                    }
                    Err(e) => {
                        warn!(episode_id = episode.id, error = %e, "remote delete failed; will retry next run");
                        report.delete_failures += 1;
                        continue;
                    }
                };
                catalog
                    .set_deleted(episode.id, reason, rerecord)
                    .await
                    .map_err(SyncError::catalog(category))?;
                info!(
                    title = %owner.metadata.title,
                    filename = %episode.metadata.filename,
                    reason = %reason,
                    rerecord,
                    "deleted recording from device"
                );
                report.deleted += 1;
            }
        }
        Ok(())
    }
}
