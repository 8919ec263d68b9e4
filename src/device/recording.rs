//! Recording groups and individual recordings reported by a tuner's storage.

use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use tracing::{debug, info, instrument};
use url::Url;

use super::category::RecordingCategory;
use super::dto::{EpisodeDto, StorageDto};
use super::episode_number::{EpisodeNumber, InvalidDesignator};
use super::error::DeviceError;
use super::schema::{RecordCheck, SchemaMode, decode_records, optional_time};
use crate::download::{DownloadError, HttpClient};

/// A recording whose end is less than this far in the past is still being
/// written by the tuner.
pub const STILL_RECORDING_GRACE_SECS: i64 = 30;

/// One recording group ("series") as reported by the device.
///
/// The same columns are embedded in the catalog's `series` table, so this
/// type doubles as the row shape for the group metadata.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RecordingStorage {
    pub series_id: String,
    pub title: String,
    pub category: RecordingCategory,
    pub image_url: String,
    pub poster_url: Option<String>,
    pub start_time: DateTime<Utc>,
    pub is_new: bool,
    /// The group's `EpisodesURL`.
    pub url: String,
}

impl RecordingStorage {
    pub(crate) fn validate(
        check: &RecordCheck<'_>,
        dto: StorageDto,
        mode: SchemaMode,
    ) -> Option<Self> {
        let series_id = check.required("SeriesID", dto.series_id)?;
        let title = check.required("Title", dto.title)?;
        let raw_category = check.required("Category", dto.category)?;
        let image_url = check.required("ImageURL", dto.image_url)?;
        let start_time = check.required_time("StartTime", dto.start_time)?;
        let url = check.required("EpisodesURL", dto.episodes_url)?;
        if !check.accepts_extra_fields(&dto.extra, mode) {
            return None;
        }
        let Some(category) = RecordingCategory::from_device(&raw_category) else {
            check.unknown_category(&raw_category);
            return None;
        };
        Some(Self {
            series_id,
            title,
            category,
            image_url,
            poster_url: dto.poster_url,
            start_time,
            is_new: dto.new == Some(1),
            url,
        })
    }

    /// Fetches the recordings in this group.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` on transport failure or a non-array body.
    #[instrument(skip(self, client), fields(series_id = %self.series_id))]
    pub async fn recordings(
        &self,
        client: &HttpClient,
        mode: SchemaMode,
    ) -> Result<Vec<Recording>, DeviceError> {
        let url = self.url.as_str();
        let body = client.get_json(url).await?;
        let records = decode_records::<EpisodeDto>(url, body)?;
        let recordings: Vec<_> = records
            .into_iter()
            .filter_map(|(index, dto)| {
                Recording::validate(&RecordCheck::element(url, index), dto, mode)
            })
            .collect();
        debug!(count = recordings.len(), "fetched recordings");
        Ok(recordings)
    }
}

/// One recorded program available for download.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Recording {
    pub category: RecordingCategory,
    pub channel_image_url: Option<String>,
    pub channel_name: String,
    pub channel_number: String,
    pub end_time: DateTime<Utc>,
    /// Raw designator (`S02E05`); parse with [`Recording::episode_number`].
    pub episode_number: Option<String>,
    pub episode_title: String,
    pub first_airing: bool,
    pub image_url: String,
    pub movie_score: Option<String>,
    pub original_airdate: DateTime<Utc>,
    pub poster_url: Option<String>,
    pub program_id: String,
    pub record_end_time: DateTime<Utc>,
    pub record_error: Option<String>,
    pub record_start_time: DateTime<Utc>,
    pub record_success: bool,
    pub series_id: String,
    pub start_time: DateTime<Utc>,
    pub synopsis: String,
    pub title: String,
    /// File name on the device; also the dedup key within a series.
    pub filename: String,
    pub play_url: String,
    pub cmd_url: String,
}

impl Recording {
    pub(crate) fn validate(
        check: &RecordCheck<'_>,
        dto: EpisodeDto,
        mode: SchemaMode,
    ) -> Option<Self> {
        let raw_category = check.required("Category", dto.category)?;
        let channel_name = check.required("ChannelName", dto.channel_name)?;
        let channel_number = check.required("ChannelNumber", dto.channel_number)?;
        let end_time = check.required_time("EndTime", dto.end_time)?;
        let image_url = check.required("ImageURL", dto.image_url)?;
        let program_id = check.required("ProgramID", dto.program_id)?;
        let record_end_time = check.required_time("RecordEndTime", dto.record_end_time)?;
        let record_start_time = check.required_time("RecordStartTime", dto.record_start_time)?;
        let series_id = check.required("SeriesID", dto.series_id)?;
        let start_time = check.required_time("StartTime", dto.start_time)?;
        let synopsis = check.required("Synopsis", dto.synopsis)?;
        let title = check.required("Title", dto.title)?;
        let filename = check.required("Filename", dto.filename)?;
        let play_url = check.required("PlayURL", dto.play_url)?;
        let cmd_url = check.required("CmdURL", dto.cmd_url)?;
        if !check.accepts_extra_fields(&dto.extra, mode) {
            return None;
        }
        let Some(category) = RecordingCategory::from_device(&raw_category) else {
            check.unknown_category(&raw_category);
            return None;
        };
        Some(Self {
            category,
            channel_image_url: dto.channel_image_url,
            channel_name,
            channel_number,
            end_time,
            episode_number: dto.episode_number,
            episode_title: dto.episode_title.unwrap_or_else(|| title.clone()),
            first_airing: dto.first_airing == Some(1),
            image_url,
            movie_score: dto.movie_score,
            original_airdate: optional_time(dto.original_airdate).unwrap_or(start_time),
            poster_url: dto.poster_url,
            program_id,
            record_end_time,
            record_error: dto.record_error,
            record_start_time,
            record_success: dto.record_success.unwrap_or_default() != 0,
            series_id,
            start_time,
            synopsis,
            title,
            filename,
            play_url,
            cmd_url,
        })
    }

    /// Parses the season/episode designator, if the recording has one.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDesignator`] when a designator is present but is not
    /// of the form `S<digits>E<digits>`.
    pub fn episode_number(&self) -> Result<Option<EpisodeNumber>, InvalidDesignator> {
        self.episode_number
            .as_deref()
            .map(str::parse)
            .transpose()
    }

    /// True while the tuner may still be writing the file.
    #[must_use]
    pub fn is_still_recording(&self, now: DateTime<Utc>) -> bool {
        self.record_end_time + Duration::seconds(STILL_RECORDING_GRACE_SECS) > now
    }

    /// True when the device reported success and no error text.
    #[must_use]
    pub fn recorded_cleanly(&self) -> bool {
        self.record_success
            && self
                .record_error
                .as_deref()
                .is_none_or(|error| error.trim().is_empty())
    }

    /// Asks the device to delete this recording.
    ///
    /// Returns `Ok(true)` when the device accepted the command and
    /// `Ok(false)` when it answered with a non-2xx status, which it does for
    /// recordings that are already gone.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` for transport failures or an unparseable
    /// `CmdURL`.
    #[instrument(skip(self, client), fields(filename = %self.filename))]
    pub async fn delete(&self, client: &HttpClient, rerecord: bool) -> Result<bool, DownloadError> {
        let mut url =
            Url::parse(&self.cmd_url).map_err(|_| DownloadError::invalid_url(&self.cmd_url))?;
        url.query_pairs_mut()
            .append_pair("cmd", "delete")
            .append_pair("rerecord", if rerecord { "1" } else { "0" });

        match client.post_command(url.as_str()).await {
            Ok(()) => {
                info!(rerecord, "deleted recording on device");
                Ok(true)
            }
            Err(DownloadError::HttpStatus { status, .. }) => {
                info!(status, "device no longer has recording");
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }
}
