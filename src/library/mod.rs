//! Mapping from series and recordings to locations in the media library.
//!
//! Layout under a category root:
//!
//! ```text
//! <root>/<Title> [<SeriesID>]/Season 01/<Title> S01E02 - [tag].mpg
//! <root>/<Title> [<SeriesID>]/<Title>.mpg
//! <root>/<Title> [<SeriesID>]/thumbnail.jpg
//! ```
//!
//! Paths are pure functions of their inputs; only [`LibraryRoots::series_path`]
//! and [`LibraryRoots::episode_path`] touch the filesystem (to create
//! directories).

mod artwork;

pub use artwork::{ArtworkKind, artwork_path, existing_artwork};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::device::{InvalidDesignator, Recording, RecordingCategory, RecordingStorage};

/// Characters removed from every generated path segment.
const INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Errors resolving or preparing library paths.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The recording's designator is not `S<digits>E<digits>`.
    #[error("cannot place {filename}: {source}")]
    Designator {
        filename: String,
        #[source]
        source: InvalidDesignator,
    },

    /// A directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Removes characters that are illegal in file names on any supported OS.
#[must_use]
pub fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .filter(|c| !INVALID_CHARS.contains(c) && !c.is_control())
        .collect()
}

/// Directory name for a series: `"{title} [{series_id}]"`, sanitized.
#[must_use]
pub fn series_dir_name(series: &RecordingStorage) -> String {
    sanitize_component(&format!("{} [{}]", series.title, series.series_id))
}

/// The bracketed tag of a remote filename: from the first `[` up to the
/// next `.`. `"Show S01E02 [20240101-2000].mpg"` yields
/// `"[20240101-2000]"`.
fn filename_tag(filename: &str) -> Option<&str> {
    let start = filename.find('[')?;
    let rest = &filename[start..];
    let tag = rest.find('.').map_or(rest, |end| &rest[..end]);
    (!tag.trim().is_empty()).then_some(tag)
}

/// Extension of the remote filename including the dot, or empty.
fn filename_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Per-category library roots. A category with no root is not synced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryRoots {
    movie: Option<PathBuf>,
    series: Option<PathBuf>,
}

impl LibraryRoots {
    /// Builds roots from configured strings; blank strings mean unconfigured.
    #[must_use]
    pub fn new(movie: Option<&str>, series: Option<&str>) -> Self {
        let normalize = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            movie: normalize(movie),
            series: normalize(series),
        }
    }

    /// Root for a category, if configured.
    #[must_use]
    pub fn root(&self, category: RecordingCategory) -> Option<&Path> {
        match category {
            RecordingCategory::Movie => self.movie.as_deref(),
            RecordingCategory::Series => self.series.as_deref(),
        }
    }

    /// Every configured `(category, root)` pair.
    pub fn configured(&self) -> impl Iterator<Item = (RecordingCategory, &Path)> {
        RecordingCategory::ALL
            .into_iter()
            .filter_map(|category| self.root(category).map(|root| (category, root)))
    }

    /// Directory for a series, without touching the filesystem.
    #[must_use]
    pub fn series_dir(&self, series: &RecordingStorage) -> Option<PathBuf> {
        self.root(series.category)
            .map(|root| root.join(series_dir_name(series)))
    }

    /// Full path for an episode's file, without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Designator`] when the recording carries a
    /// designator that does not parse.
    pub fn episode_file(
        &self,
        series: &RecordingStorage,
        recording: &Recording,
    ) -> Result<Option<PathBuf>, LibraryError> {
        let Some(mut dir) = self.series_dir(series) else {
            return Ok(None);
        };

        let number = recording
            .episode_number()
            .map_err(|source| LibraryError::Designator {
                filename: recording.filename.clone(),
                source,
            })?;
        let mut name = match (number, recording.episode_number.as_deref()) {
            (Some(number), Some(raw)) => {
                dir.push(format!("Season {:02}", number.season));
                format!("{} {raw}", series.title)
            }
            _ => series.title.clone(),
        };
        if let Some(tag) = filename_tag(&recording.filename) {
            name = format!("{name} - {tag}");
        }

        let file = sanitize_component(&name) + &filename_extension(&recording.filename);
        Ok(Some(dir.join(file)))
    }

    /// Like [`series_dir`](Self::series_dir), creating the directory.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::CreateDir`] if the directory cannot be created.
    pub async fn series_path(
        &self,
        series: &RecordingStorage,
    ) -> Result<Option<PathBuf>, LibraryError> {
        let Some(dir) = self.series_dir(series) else {
            return Ok(None);
        };
        create_dir(&dir).await?;
        Ok(Some(dir))
    }

    /// Like [`episode_file`](Self::episode_file), creating the parent
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError`] for a bad designator or when the directory
    /// cannot be created.
    pub async fn episode_path(
        &self,
        series: &RecordingStorage,
        recording: &Recording,
    ) -> Result<Option<PathBuf>, LibraryError> {
        let Some(path) = self.episode_file(series, recording)? else {
            return Ok(None);
        };
        if let Some(parent) = path.parent() {
            create_dir(parent).await?;
        }
        Ok(Some(path))
    }
}

async fn create_dir(dir: &Path) -> Result<(), LibraryError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| LibraryError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::device::fixtures::{group, recording};

    fn roots(dir: &Path) -> LibraryRoots {
        let root = dir.to_str().unwrap();
        LibraryRoots::new(Some(root), Some(root))
    }

    #[test]
    fn test_sanitize_strips_reserved_characters() {
        assert_eq!(sanitize_component(r#"a<b>c:d"e/f\g|h?i*j"#), "abcdefghij");
        assert_eq!(sanitize_component("tab\there"), "tabhere");
        assert_eq!(sanitize_component("Plain Title (2024)"), "Plain Title (2024)");
    }

    #[test]
    fn test_series_dir_name_is_clean_and_reproducible() {
        let show = group("123", "Show: A/B", RecordingCategory::Series);
        let name = series_dir_name(&show);
        assert_eq!(name, "Show AB [123]");
        assert!(!name.contains(INVALID_CHARS));
        assert_eq!(series_dir_name(&show), name);
    }

    #[test]
    fn test_blank_roots_are_unconfigured() {
        let roots = LibraryRoots::new(Some("  "), None);
        assert!(roots.root(RecordingCategory::Movie).is_none());
        assert!(roots.root(RecordingCategory::Series).is_none());
        assert_eq!(roots.configured().count(), 0);

        let show = group("1", "Show", RecordingCategory::Series);
        assert!(roots.series_dir(&show).is_none());
        assert!(roots.episode_file(&show, &recording(&show, "a.mpg")).unwrap().is_none());
    }

    #[test]
    fn test_episode_file_with_designator_uses_season_dir() {
        let show = group("C1", "Show", RecordingCategory::Series);
        let rec = recording(&show, "Show S01E02 20240101 [20240101-2000].mpg");
        let path = roots(Path::new("/lib"))
            .episode_file(&show, &rec)
            .unwrap()
            .unwrap();
        assert_eq!(
            path,
            PathBuf::from("/lib/Show [C1]/Season 01/Show S01E02 - [20240101-2000].mpg")
        );
    }

    #[test]
    fn test_episode_file_without_designator_uses_title() {
        let film = group("M1", "Film: Part 2", RecordingCategory::Movie);
        let mut rec = recording(&film, "Film.ts");
        rec.episode_number = None;
        let path = roots(Path::new("/lib"))
            .episode_file(&film, &rec)
            .unwrap()
            .unwrap();
        assert_eq!(path, PathBuf::from("/lib/Film Part 2 [M1]/Film Part 2.ts"));
    }

    #[test]
    fn test_episode_file_rejects_malformed_designator() {
        let show = group("C1", "Show", RecordingCategory::Series);
        let mut rec = recording(&show, "a.mpg");
        rec.episode_number = Some("S1xE2".to_string());
        let err = roots(Path::new("/lib")).episode_file(&show, &rec).unwrap_err();
        assert!(matches!(err, LibraryError::Designator { .. }));
    }

    #[test]
    fn test_filename_tag_extraction() {
        assert_eq!(filename_tag("x [a b].mpg"), Some("[a b]"));
        assert_eq!(filename_tag("x [a b]"), Some("[a b]"));
        assert_eq!(filename_tag("x.mpg"), None);
    }

    #[tokio::test]
    async fn test_episode_path_creates_parent_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let show = group("C1", "Show", RecordingCategory::Series);
        let rec = recording(&show, "a.mpg");
        let path = roots(dir.path())
            .episode_path(&show, &rec)
            .await
            .unwrap()
            .unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());
    }
}
