//! Hard failures that fail a sync run.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::device::RecordingCategory;
use crate::library::LibraryError;

/// Errors that abort a sync run.
///
/// Device and download problems are not here: they are absorbed per tuner
/// or per job and counted in the [`SyncReport`](super::SyncReport).
#[derive(Debug, Error)]
pub enum SyncError {
    /// A catalog read or write failed.
    #[error("catalog for {category}: {source}")]
    Catalog {
        category: RecordingCategory,
        #[source]
        source: CatalogError,
    },

    /// A library directory could not be prepared.
    #[error(transparent)]
    Library(#[from] LibraryError),
}

impl SyncError {
    pub(crate) fn catalog(category: RecordingCategory) -> impl FnOnce(CatalogError) -> Self {
        move |source| Self::Catalog { category, source }
    }
}
