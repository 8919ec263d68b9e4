//! Recording categories reported by the device.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Library category of a recording group.
///
/// Stored as snake_case text in the catalog and keyed in configuration the
/// same way (`movie`, `series`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RecordingCategory {
    /// A one-off film.
    Movie,
    /// An episodic show.
    Series,
}

impl RecordingCategory {
    /// All categories, in a stable order.
    pub const ALL: [Self; 2] = [Self::Movie, Self::Series];

    /// Returns the wire/database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }

    /// Parses the device's category string. Unknown strings yield `None`.
    #[must_use]
    pub fn from_device(raw: &str) -> Option<Self> {
        match raw {
            "movie" => Some(Self::Movie),
            "series" => Some(Self::Series),
            _ => None,
        }
    }
}

impl fmt::Display for RecordingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_device_accepts_known_categories() {
        assert_eq!(
            RecordingCategory::from_device("movie"),
            Some(RecordingCategory::Movie)
        );
        assert_eq!(
            RecordingCategory::from_device("series"),
            Some(RecordingCategory::Series)
        );
    }

    #[test]
    fn test_from_device_rejects_unknown_and_differently_cased() {
        assert_eq!(RecordingCategory::from_device("sport"), None);
        assert_eq!(RecordingCategory::from_device("Movie"), None);
        assert_eq!(RecordingCategory::from_device(""), None);
    }

    #[test]
    fn test_as_str_round_trips_through_from_device() {
        for category in RecordingCategory::ALL {
            assert_eq!(RecordingCategory::from_device(category.as_str()), Some(category));
        }
    }
}
