//! Raw JSON shapes returned by the tuner and listings endpoints.
//!
//! Every field is optional here; validation into the public types happens in
//! the sibling modules. Unknown fields are captured in `extra`.

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub(crate) struct DiscoverDto {
    #[serde(rename = "FriendlyName")]
    pub friendly_name: Option<String>,
    #[serde(rename = "ModelNumber")]
    pub model_number: Option<String>,
    #[serde(rename = "FirmwareName")]
    pub firmware_name: Option<String>,
    #[serde(rename = "FirmwareVersion")]
    pub firmware_version: Option<String>,
    #[serde(rename = "DeviceID")]
    pub device_id: Option<String>,
    #[serde(rename = "DeviceAuth")]
    pub device_auth: Option<String>,
    #[serde(rename = "BaseURL")]
    pub base_url: Option<String>,
    #[serde(rename = "LineupURL")]
    pub lineup_url: Option<String>,
    #[serde(rename = "TunerCount")]
    pub tuner_count: Option<u32>,
    #[serde(rename = "StorageID")]
    pub storage_id: Option<String>,
    #[serde(rename = "StorageURL")]
    pub storage_url: Option<String>,
    #[serde(rename = "TotalSpace")]
    pub total_space: Option<u64>,
    #[serde(rename = "FreeSpace")]
    pub free_space: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LineupDto {
    #[serde(rename = "GuideNumber")]
    pub guide_number: Option<String>,
    #[serde(rename = "GuideName")]
    pub guide_name: Option<String>,
    #[serde(rename = "VideoCodec")]
    pub video_codec: Option<String>,
    #[serde(rename = "AudioCodec")]
    pub audio_codec: Option<String>,
    #[serde(rename = "HD")]
    pub hd: Option<i64>,
    #[serde(rename = "SignalStrength")]
    pub signal_strength: Option<i64>,
    #[serde(rename = "SignalQuality")]
    pub signal_quality: Option<i64>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GuideDto {
    #[serde(rename = "GuideNumber")]
    pub guide_number: Option<String>,
    #[serde(rename = "GuideName")]
    pub guide_name: Option<String>,
    #[serde(rename = "Affiliate")]
    pub affiliate: Option<String>,
    #[serde(rename = "ImageURL")]
    pub image_url: Option<String>,
    #[serde(rename = "Guide", default)]
    pub guide: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GuideEntryDto {
    #[serde(rename = "StartTime")]
    pub start_time: Option<i64>,
    #[serde(rename = "EndTime")]
    pub end_time: Option<i64>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "EpisodeNumber")]
    pub episode_number: Option<String>,
    #[serde(rename = "EpisodeTitle")]
    pub episode_title: Option<String>,
    #[serde(rename = "Synopsis")]
    pub synopsis: Option<String>,
    #[serde(rename = "Team1")]
    pub team1: Option<String>,
    #[serde(rename = "Team2")]
    pub team2: Option<String>,
    #[serde(rename = "OriginalAirdate")]
    pub original_airdate: Option<i64>,
    #[serde(rename = "SeriesID")]
    pub series_id: Option<String>,
    #[serde(rename = "ImageURL")]
    pub image_url: Option<String>,
    #[serde(rename = "PosterURL")]
    pub poster_url: Option<String>,
    #[serde(rename = "RecordingRule")]
    pub recording_rule: Option<i64>,
    #[serde(rename = "Filter", default)]
    pub filter: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StorageDto {
    #[serde(rename = "SeriesID")]
    pub series_id: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "ImageURL")]
    pub image_url: Option<String>,
    #[serde(rename = "PosterURL")]
    pub poster_url: Option<String>,
    #[serde(rename = "StartTime")]
    pub start_time: Option<i64>,
    #[serde(rename = "New")]
    pub new: Option<i64>,
    #[serde(rename = "EpisodesURL")]
    pub episodes_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EpisodeDto {
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "ChannelImageURL")]
    pub channel_image_url: Option<String>,
    #[serde(rename = "ChannelName")]
    pub channel_name: Option<String>,
    #[serde(rename = "ChannelNumber")]
    pub channel_number: Option<String>,
    #[serde(rename = "EndTime")]
    pub end_time: Option<i64>,
    #[serde(rename = "EpisodeNumber")]
    pub episode_number: Option<String>,
    #[serde(rename = "EpisodeTitle")]
    pub episode_title: Option<String>,
    #[serde(rename = "FirstAiring")]
    pub first_airing: Option<i64>,
    #[serde(rename = "ImageURL")]
    pub image_url: Option<String>,
    #[serde(rename = "MovieScore")]
    pub movie_score: Option<String>,
    #[serde(rename = "OriginalAirdate")]
    pub original_airdate: Option<i64>,
    #[serde(rename = "PosterURL")]
    pub poster_url: Option<String>,
    #[serde(rename = "ProgramID")]
    pub program_id: Option<String>,
    #[serde(rename = "RecordEndTime")]
    pub record_end_time: Option<i64>,
    #[serde(rename = "RecordError")]
    pub record_error: Option<String>,
    #[serde(rename = "RecordStartTime")]
    pub record_start_time: Option<i64>,
    #[serde(rename = "RecordSuccess")]
    pub record_success: Option<i64>,
    #[serde(rename = "SeriesID")]
    pub series_id: Option<String>,
    #[serde(rename = "StartTime")]
    pub start_time: Option<i64>,
    #[serde(rename = "Synopsis")]
    pub synopsis: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Filename")]
    pub filename: Option<String>,
    #[serde(rename = "PlayURL")]
    pub play_url: Option<String>,
    #[serde(rename = "CmdURL")]
    pub cmd_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
