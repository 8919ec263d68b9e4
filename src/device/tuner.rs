//! Tuner discovery and the listings endpoints hanging off a discovered tuner.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};
use url::Url;

use super::dto::{DiscoverDto, GuideDto, GuideEntryDto, LineupDto, StorageDto};
use super::error::DeviceError;
use super::recording::RecordingStorage;
use super::schema::{RecordCheck, SchemaMode, decode_nested, decode_records, optional_time};
use crate::download::{DownloadError, HttpClient};

/// Configured address of a tuner that has not been contacted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunerRef {
    base_url: String,
}

impl TunerRef {
    /// Accepts `host`, `host:port`, or a full URL. `http://` is prefixed when
    /// no scheme is given.
    #[must_use]
    pub fn new(address: &str) -> Self {
        let address = address.trim().trim_end_matches('/');
        let base_url = if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };
        Self { base_url }
    }

    /// The normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches `discover.json` and validates the identity fields.
    ///
    /// Returns `Ok(None)` when the device answered but the response lacks
    /// `DeviceID`, `DeviceAuth` or `LineupURL`, or (in strict mode) carries
    /// fields outside the known schema.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` on transport failure, a non-2xx status, or a
    /// body that is not a JSON object.
    #[instrument(skip(self, client), fields(tuner = %self.base_url))]
    pub async fn discover(
        &self,
        client: &HttpClient,
        mode: SchemaMode,
    ) -> Result<Option<Tuner>, DeviceError> {
        let url = format!("{}/discover.json", self.base_url);
        let body = client.get_json(&url).await?;
        if !body.is_object() {
            return Err(DeviceError::unexpected_shape(&url, "object"));
        }
        let dto: DiscoverDto =
            serde_json::from_value(body).map_err(|e| DownloadError::decode(&url, e))?;

        let check = RecordCheck::top_level(&url);
        let Some(device_id) = check.required("DeviceID", dto.device_id) else {
            return Ok(None);
        };
        let Some(device_auth) = check.required("DeviceAuth", dto.device_auth) else {
            return Ok(None);
        };
        let Some(lineup_url) = check.required("LineupURL", dto.lineup_url) else {
            return Ok(None);
        };
        if !check.accepts_extra_fields(&dto.extra, mode) {
            return Ok(None);
        }

        let storage = match (dto.storage_id, dto.storage_url) {
            (Some(id), Some(url)) => Some(StorageRef {
                id,
                url,
                total_space: dto.total_space.unwrap_or_default(),
                free_space: dto.free_space.unwrap_or_default(),
            }),
            _ => None,
        };

        let tuner = Tuner {
            friendly_name: dto.friendly_name.unwrap_or_else(|| "HDHomeRun".to_string()),
            model_number: dto.model_number.unwrap_or_else(|| "unknown".to_string()),
            firmware_name: dto.firmware_name.unwrap_or_else(|| "hdhomerun".to_string()),
            firmware_version: dto.firmware_version.unwrap_or_else(|| "unknown".to_string()),
            device_id,
            device_auth,
            base_url: dto.base_url.unwrap_or_else(|| self.base_url.clone()),
            lineup_url,
            tuner_count: dto.tuner_count.unwrap_or_default(),
            storage,
        };
        debug!(device_id = %tuner.device_id, has_storage = tuner.storage.is_some(), "discovered tuner");
        Ok(Some(tuner))
    }
}

/// Identity and capability snapshot of one device. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuner {
    pub friendly_name: String,
    pub model_number: String,
    pub firmware_name: String,
    pub firmware_version: String,
    pub device_id: String,
    pub device_auth: String,
    pub base_url: String,
    pub lineup_url: String,
    pub tuner_count: u32,
    /// DVR storage endpoint, absent on tuners without recording support.
    pub storage: Option<StorageRef>,
}

impl Tuner {
    /// Fetches the channel lineup.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` on transport failure or a non-array body.
    #[instrument(skip(self, client), fields(device_id = %self.device_id))]
    pub async fn lineup(
        &self,
        client: &HttpClient,
        mode: SchemaMode,
    ) -> Result<Vec<Channel>, DeviceError> {
        let url = self.lineup_url.as_str();
        let body = client.get_json(url).await?;
        let records = decode_records::<LineupDto>(url, body)?;
        Ok(records
            .into_iter()
            .filter_map(|(index, dto)| Channel::validate(&RecordCheck::element(url, index), dto, mode))
            .collect())
    }

    /// Fetches the program guide from the listings service.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` on transport failure, a non-array body, or a
    /// `guide_url` that cannot be parsed.
    #[instrument(skip(self, client), fields(device_id = %self.device_id))]
    pub async fn guide(
        &self,
        client: &HttpClient,
        guide_url: &str,
        mode: SchemaMode,
    ) -> Result<Vec<GuideChannel>, DeviceError> {
        let mut url = Url::parse(guide_url).map_err(|_| DeviceError::invalid_url(guide_url))?;
        url.query_pairs_mut().append_pair("DeviceAuth", &self.device_auth);
        let url = url.to_string();

        let body = client.get_json(&url).await?;
        let records = decode_records::<GuideDto>(&url, body)?;
        Ok(records
            .into_iter()
            .filter_map(|(index, dto)| {
                GuideChannel::validate(&RecordCheck::element(&url, index), dto, mode)
            })
            .collect())
    }
}

/// A tuner's DVR storage endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRef {
    pub id: String,
    pub url: String,
    pub total_space: u64,
    pub free_space: u64,
}

impl StorageRef {
    /// Fetches the recording groups ("series") held by this storage.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` on transport failure or a non-array body.
    #[instrument(skip(self, client), fields(storage_id = %self.id))]
    pub async fn recording_groups(
        &self,
        client: &HttpClient,
        mode: SchemaMode,
    ) -> Result<Vec<RecordingStorage>, DeviceError> {
        let url = self.url.as_str();
        let body = client.get_json(url).await?;
        let records = decode_records::<StorageDto>(url, body)?;
        let groups: Vec<_> = records
            .into_iter()
            .filter_map(|(index, dto)| {
                RecordingStorage::validate(&RecordCheck::element(url, index), dto, mode)
            })
            .collect();
        debug!(count = groups.len(), "fetched recording groups");
        Ok(groups)
    }
}

/// One channel of a tuner's lineup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub guide_number: String,
    pub guide_name: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub is_hd: bool,
    pub signal_strength: Option<i64>,
    pub signal_quality: Option<i64>,
    pub url: String,
}

impl Channel {
    fn validate(check: &RecordCheck<'_>, dto: LineupDto, mode: SchemaMode) -> Option<Self> {
        let guide_number = check.required("GuideNumber", dto.guide_number)?;
        let guide_name = check.required("GuideName", dto.guide_name)?;
        let video_codec = check.required("VideoCodec", dto.video_codec)?;
        let audio_codec = check.required("AudioCodec", dto.audio_codec)?;
        let url = check.required("URL", dto.url)?;
        if !check.accepts_extra_fields(&dto.extra, mode) {
            return None;
        }
        Some(Self {
            guide_number,
            guide_name,
            video_codec,
            audio_codec,
            is_hd: dto.hd == Some(1),
            signal_strength: dto.signal_strength,
            signal_quality: dto.signal_quality,
            url,
        })
    }
}

/// One channel of the program guide with its upcoming programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideChannel {
    pub guide_number: String,
    pub guide_name: String,
    pub affiliate: Option<String>,
    pub image_url: Option<String>,
    pub programs: Vec<GuideProgram>,
}

impl GuideChannel {
    fn validate(check: &RecordCheck<'_>, dto: GuideDto, mode: SchemaMode) -> Option<Self> {
        let guide_number = check.required("GuideNumber", dto.guide_number)?;
        let guide_name = check.required("GuideName", dto.guide_name)?;
        if !check.accepts_extra_fields(&dto.extra, mode) {
            return None;
        }
        let programs = decode_nested::<GuideEntryDto>(check, dto.guide)
            .into_iter()
            .filter_map(|(index, entry)| GuideProgram::validate(&check.nested(index), entry, mode))
            .collect();
        Some(Self {
            guide_number,
            guide_name,
            affiliate: dto.affiliate,
            image_url: dto.image_url,
            programs,
        })
    }
}

/// One scheduled program in the guide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideProgram {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: String,
    pub episode_number: Option<String>,
    /// Falls back to the title when the listing has none.
    pub episode_title: String,
    pub synopsis: Option<String>,
    pub teams: Vec<String>,
    /// Falls back to the start time when the listing has none.
    pub original_airdate: DateTime<Utc>,
    pub series_id: String,
    pub image_url: Option<String>,
    pub poster_url: Option<String>,
    /// A recording rule matches this program.
    pub recording: bool,
    pub categories: Vec<String>,
}

impl GuideProgram {
    fn validate(check: &RecordCheck<'_>, dto: GuideEntryDto, mode: SchemaMode) -> Option<Self> {
        let start_time = check.required_time("StartTime", dto.start_time)?;
        let end_time = check.required_time("EndTime", dto.end_time)?;
        let title = check.required("Title", dto.title)?;
        let series_id = check.required("SeriesID", dto.series_id)?;
        if !check.accepts_extra_fields(&dto.extra, mode) {
            return None;
        }
        Some(Self {
            start_time,
            end_time,
            episode_title: dto.episode_title.unwrap_or_else(|| title.clone()),
            title,
            episode_number: dto.episode_number,
            synopsis: dto.synopsis,
            teams: [dto.team1, dto.team2].into_iter().flatten().collect(),
            original_airdate: optional_time(dto.original_airdate).unwrap_or(start_time),
            series_id,
            image_url: dto.image_url,
            poster_url: dto.poster_url,
            recording: dto.recording_rule == Some(1),
            categories: dto.filter,
        })
    }
}
