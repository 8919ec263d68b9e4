//! Fan-out over tuners, their storage and recording groups.

use std::collections::HashSet;

use futures_util::future::join_all;
use tracing::{debug, error, info, warn};

use super::SyncReport;
use crate::device::{Recording, RecordingStorage, SchemaMode, StorageRef, TunerRef};
use crate::download::HttpClient;

/// A recording group together with the recordings it currently holds.
#[derive(Debug, Clone)]
pub(crate) struct DiscoveredGroup {
    pub group: RecordingStorage,
    pub recordings: Vec<Recording>,
}

/// Discovers every configured tuner and collects its recordings.
///
/// Each tuner and each group is fetched concurrently; a failure drops only
/// that branch. A group whose episodes URL was already returned by an
/// earlier tuner is skipped.
pub(crate) async fn discover_recordings(
    client: &HttpClient,
    addresses: &[String],
    mode: SchemaMode,
    report: &mut SyncReport,
) -> Vec<DiscoveredGroup> {
    let storages = discover_storage(client, addresses, mode, report).await;

    let listings = join_all(storages.iter().map(|s| s.recording_groups(client, mode))).await;
    let mut seen = HashSet::new();
    let mut groups = Vec::new();
    for (storage, listing) in storages.iter().zip(listings) {
        match listing {
            Ok(found) => {
                for group in found {
                    if seen.insert(group.url.clone()) {
                        groups.push(group);
                    } else {
                        debug!(storage_id = %storage.id, url = %group.url, "recording group already seen on another tuner");
                        report.duplicate_groups += 1;
                    }
                }
            }
            Err(e) => {
                error!(storage_id = %storage.id, error = %e, "failed to list recording groups");
                report.tuner_failures += 1;
            }
        }
    }

    let episode_lists = join_all(groups.iter().map(|g| g.recordings(client, mode))).await;
    let mut discovered = Vec::with_capacity(groups.len());
    for (group, episodes) in groups.into_iter().zip(episode_lists) {
        match episodes {
            Ok(recordings) => discovered.push(DiscoveredGroup { group, recordings }),
            Err(e) => {
                error!(series_id = %group.series_id, url = %group.url, error = %e, "failed to list recordings");
                report.group_failures += 1;
            }
        }
    }
    discovered
}

async fn discover_storage(
    client: &HttpClient,
    addresses: &[String],
    mode: SchemaMode,
    report: &mut SyncReport,
) -> Vec<StorageRef> {
    let refs: Vec<TunerRef> = addresses.iter().map(|a| TunerRef::new(a)).collect();
    let results = join_all(refs.iter().map(|r| r.discover(client, mode))).await;

    let mut storages = Vec::new();
    for (tuner_ref, result) in refs.iter().zip(results) {
        match result {
            Ok(Some(tuner)) => {
                report.tuners_discovered += 1;
                match tuner.storage {
                    Some(storage) => storages.push(storage),
                    None => info!(device_id = %tuner.device_id, "tuner has no DVR storage; skipping"),
                }
            }
            Ok(None) => {
                warn!(tuner = %tuner_ref.base_url(), "tuner discovery response rejected");
                report.tuner_failures += 1;
            }
            Err(e) => {
                error!(tuner = %tuner_ref.base_url(), error = %e, "tuner discovery failed");
                report.tuner_failures += 1;
            }
        }
    }
    storages
}
