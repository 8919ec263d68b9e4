//! Builders for device types used by unit tests across the crate.

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::{Recording, RecordingCategory, RecordingStorage};

/// A fixed instant well in the past.
pub(crate) fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default()
}

pub(crate) fn group(series_id: &str, title: &str, category: RecordingCategory) -> RecordingStorage {
    RecordingStorage {
        series_id: series_id.to_string(),
        title: title.to_string(),
        category,
        image_url: format!("http://img/{series_id}.jpg"),
        poster_url: None,
        start_time: epoch(),
        is_new: false,
        url: format!("http://tuner/recorded_files.json?SeriesID={series_id}"),
    }
}

pub(crate) fn recording(series: &RecordingStorage, filename: &str) -> Recording {
    let start = epoch();
    Recording {
        category: series.category,
        channel_image_url: None,
        channel_name: "KTVU".to_string(),
        channel_number: "2.1".to_string(),
        end_time: start + Duration::minutes(30),
        episode_number: Some("S01E02".to_string()),
        episode_title: "Pilot".to_string(),
        first_airing: true,
        image_url: "http://img/ep.jpg".to_string(),
        movie_score: None,
        original_airdate: start,
        poster_url: None,
        program_id: "EP0001".to_string(),
        record_end_time: start + Duration::minutes(30),
        record_error: None,
        record_start_time: start,
        record_success: true,
        series_id: series.series_id.clone(),
        start_time: start,
        synopsis: "Things happen.".to_string(),
        title: series.title.clone(),
        filename: filename.to_string(),
        play_url: format!("http://tuner/recorded/play?id={filename}"),
        cmd_url: format!("http://tuner/recorded/cmd?id={filename}"),
    }
}
