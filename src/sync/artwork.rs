//! Artwork phase.

use tracing::{debug, warn};

use super::{SyncError, SyncReport, SyncRunner};
use crate::library::{ArtworkKind, artwork_path, existing_artwork};

impl SyncRunner {
    /// Downloads any thumbnail or cover missing from a series directory.
    ///
    /// Artwork failures are counted and never abort the run.
    pub(crate) async fn fetch_artwork(&self, report: &mut SyncReport) -> Result<(), SyncError> {
        for (&category, catalog) in &self.catalogs {
            let series = catalog
                .series_list()
                .await
                .map_err(SyncError::catalog(category))?;
            for record in series {
                let Some(dir) = self.roots.series_path(&record.metadata).await? else {
                    continue;
                };
                for kind in ArtworkKind::ALL {
                    let Some(url) = kind.source_url(&record.metadata) else {
                        continue;
                    };
                    if let Some(existing) = existing_artwork(&dir, kind).await {
                        debug!(path = %existing.display(), "artwork present");
                        continue;
                    }
                    let path = artwork_path(&dir, kind, url);
                    match self.client.download_small(url, &path).await {
                        Ok(_) => report.artwork_fetched += 1,
                        Err(e) => {
                            warn!(title = %record.metadata.title, kind = kind.stem(), error = %e, "artwork download failed");
                            report.artwork_failures += 1;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
