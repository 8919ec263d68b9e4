//! Read-only consistency audit between a catalog and its library tree.
//!
//! Reports media files that no live episode accounts for, and completed
//! episodes whose file is gone. Nothing is modified.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::catalog::{Catalog, CatalogError, STATE_DIR};
use crate::library::{ArtworkKind, LibraryRoots};

/// Errors that stop an audit.
#[derive(Debug, Error)]
pub enum ScrubError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("failed to walk library {path}: {message}")]
    Walk { path: PathBuf, message: String },
}

/// Findings for one library root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrubReport {
    /// Files under the root with no live catalog entry.
    pub untracked_files: Vec<PathBuf>,
    /// Completed live episodes whose file is missing, as `(episode id, path)`.
    pub missing_files: Vec<(i64, PathBuf)>,
}

impl ScrubReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.untracked_files.is_empty() && self.missing_files.is_empty()
    }
}

/// Audits the library rooted at `root` against `catalog`.
///
/// Catalog state and artwork files are never reported as untracked.
///
/// # Errors
///
/// Returns [`ScrubError`] when the catalog cannot be read or the tree
/// cannot be walked.
#[instrument(skip(catalog, roots), fields(root = %root.display()))]
pub async fn scrub_library(
    catalog: &Catalog,
    roots: &LibraryRoots,
    root: &Path,
) -> Result<ScrubReport, ScrubError> {
    let series: HashMap<i64, _> = catalog
        .series_list()
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let mut tracked = HashSet::new();
    let mut report = ScrubReport::default();
    for episode in catalog.active_episodes().await? {
        let Some(owner) = series.get(&episode.series_ref) else {
            warn!(episode_id = episode.id, "episode has no series row");
            continue;
        };
        let path = match roots.episode_file(&owner.metadata, &episode.metadata) {
            Ok(Some(path)) => path,
            Ok(None) => continue,
            Err(e) => {
                warn!(episode_id = episode.id, error = %e, "cannot locate episode file");
                continue;
            }
        };
        if episode.is_completed() && !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            report.missing_files.push((episode.id, path.clone()));
        }
        tracked.insert(path);
    }

    let walk_root = root.to_path_buf();
    let files = tokio::task::spawn_blocking(move || media_files(&walk_root))
        .await
        .map_err(|e| ScrubError::Walk {
            path: root.to_path_buf(),
            message: e.to_string(),
        })??;
    report.untracked_files = files
        .into_iter()
        .filter(|path| !tracked.contains(path))
        .collect();
    report.untracked_files.sort();
    report.missing_files.sort();

    debug!(
        untracked = report.untracked_files.len(),
        missing = report.missing_files.len(),
        "scrub complete"
    );
    Ok(report)
}

/// Regular files under `root`, excluding catalog state and series artwork.
fn media_files(root: &Path) -> Result<Vec<PathBuf>, ScrubError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != STATE_DIR);
    for entry in walker {
        let entry = entry.map_err(|e| ScrubError::Walk {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() || is_artwork(entry.path()) {
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}

fn is_artwork(path: &Path) -> bool {
    path.file_stem().is_some_and(|stem| {
        ArtworkKind::ALL
            .iter()
            .any(|kind| stem == kind.stem())
    })
}
