//! Series artwork files (`thumbnail.<ext>`, `cover.<ext>`).

use std::path::{Path, PathBuf};

use url::Url;

use crate::device::RecordingStorage;

/// Extension used when the artwork URL has none.
const DEFAULT_EXTENSION: &str = "jpg";

/// Which artwork file of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtworkKind {
    /// From the group's `ImageURL`.
    Thumbnail,
    /// From the group's optional `PosterURL`.
    Cover,
}

impl ArtworkKind {
    pub const ALL: [Self; 2] = [Self::Thumbnail, Self::Cover];

    /// File stem inside the series directory.
    #[must_use]
    pub fn stem(&self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Cover => "cover",
        }
    }

    /// Source URL for this artwork, if the group has one.
    #[must_use]
    pub fn source_url<'a>(&self, series: &'a RecordingStorage) -> Option<&'a str> {
        let url = match self {
            Self::Thumbnail => Some(series.image_url.as_str()),
            Self::Cover => series.poster_url.as_deref(),
        };
        url.filter(|url| !url.trim().is_empty())
    }
}

fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    let dot_index = last_segment.rfind('.')?;
    let ext = &last_segment[dot_index + 1..];
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Destination for artwork downloaded from `url`.
#[must_use]
pub fn artwork_path(series_dir: &Path, kind: ArtworkKind, url: &str) -> PathBuf {
    let ext = extension_from_url(url).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    series_dir.join(format!("{}.{ext}", kind.stem()))
}

/// Finds an existing artwork file of this kind, whatever its extension.
pub async fn existing_artwork(series_dir: &Path, kind: ArtworkKind) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(series_dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.is_file() && path.file_stem().is_some_and(|stem| stem == kind.stem()) {
            return Some(path);
        }
    }
    None
}
