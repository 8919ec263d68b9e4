//! Persisted series and episode rows plus their lifecycle enums.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::device::{Recording, RecordingStorage};

/// Why an episode was (or was not) downloaded. Descriptive only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DownloadReason {
    /// First time the recording was seen.
    New,
    /// A previous attempt did not finish.
    DownloadInterrupted,
    /// The local copy went missing and was fetched again.
    ReDownloaded,
}

impl DownloadReason {
    /// Returns the database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::DownloadInterrupted => "download_interrupted",
            Self::ReDownloaded => "re_downloaded",
        }
    }
}

impl fmt::Display for DownloadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an episode row was retired. `NotDeleted` marks the live row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DeleteReason {
    NotDeleted,
    /// Superseded by a replacement row for a fresh download.
    ReDownloaded,
    /// Removed from the device right after download.
    Downloaded,
    OneDayPassed,
    OneWeekPassed,
    /// Removed from the device after the local file disappeared.
    Deleted,
    /// The device reported the recording was already gone.
    RemoteDeleted,
}

impl DeleteReason {
    /// Returns the database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotDeleted => "not_deleted",
            Self::ReDownloaded => "re_downloaded",
            Self::Downloaded => "downloaded",
            Self::OneDayPassed => "one_day_passed",
            Self::OneWeekPassed => "one_week_passed",
            Self::Deleted => "deleted",
            Self::RemoteDeleted => "remote_deleted",
        }
    }
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recording group as first observed. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SeriesRecord {
    pub id: i64,
    #[sqlx(flatten)]
    pub metadata: RecordingStorage,
}

/// One download of one recording.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct EpisodeRecord {
    pub id: i64,
    /// Owning [`SeriesRecord::id`].
    pub series_ref: i64,
    pub series_start_time: DateTime<Utc>,
    #[sqlx(flatten)]
    pub metadata: Recording,
    /// Set until the file is fully on disk.
    pub download_interrupted: bool,
    pub download_started: DateTime<Utc>,
    pub download_reason: DownloadReason,
    pub delete_reason: DeleteReason,
    /// Re-record hint sent with the remote delete.
    pub rerecordable: bool,
}

impl EpisodeRecord {
    /// Live rows take part in dedup matching.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.delete_reason == DeleteReason::NotDeleted
    }

    /// Active and fully downloaded.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_active() && !self.download_interrupted
    }
}
