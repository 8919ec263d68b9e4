//! Delete and re-record policies.
//!
//! Both are pure functions of the episode, whether its local file exists,
//! and the current time; the sync runner gathers those inputs.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::catalog::{DeleteReason, EpisodeRecord};
use crate::device::Recording;

/// When to remove a downloaded recording from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// As soon as the download completed.
    AfterDownload,
    /// Once the local file has been removed from the library.
    AfterDeleted,
    /// Once the download started more than a day ago.
    AfterOneDay,
    /// Once the download started more than a week ago.
    AfterOneWeek,
}

impl DeletePolicy {
    /// Reason recorded on an episode deleted under this policy.
    #[must_use]
    pub fn reason(self) -> DeleteReason {
        match self {
            Self::AfterDownload => DeleteReason::Downloaded,
            Self::AfterDeleted => DeleteReason::Deleted,
            Self::AfterOneDay => DeleteReason::OneDayPassed,
            Self::AfterOneWeek => DeleteReason::OneWeekPassed,
        }
    }

    /// Whether `episode` should be deleted now.
    ///
    /// Only live, fully downloaded episodes are ever due.
    #[must_use]
    pub fn is_due(self, episode: &EpisodeRecord, local_exists: bool, now: DateTime<Utc>) -> bool {
        if !episode.is_completed() {
            return false;
        }
        let age = now - episode.download_started;
        match self {
            Self::AfterDownload => true,
            Self::AfterDeleted => !local_exists,
            Self::AfterOneDay => age > Duration::days(1),
            Self::AfterOneWeek => age > Duration::weeks(1),
        }
    }
}

/// Whether a deleted recording may be recorded again by the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReRecordPolicy {
    Always,
    /// Only when the original recording failed or reported an error.
    OnRecordingError,
    /// Only when the local copy is gone.
    IfDeleted,
    #[default]
    Never,
}

impl ReRecordPolicy {
    #[must_use]
    pub fn should_rerecord(self, recording: &Recording, local_exists: bool) -> bool {
        match self {
            Self::Always => true,
            Self::OnRecordingError => !recording.recorded_cleanly(),
            Self::IfDeleted => !local_exists,
            Self::Never => false,
        }
    }
}
