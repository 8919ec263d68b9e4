//! Persisted catalog of downloaded recordings.
//!
//! One catalog lives under each configured library root
//! (`<root>/.dvrsync/catalog.db`) and holds two tables:
//! - [`SeriesRecord`] - a recording group, created the first time its
//!   identity is seen and never modified afterwards
//! - [`EpisodeRecord`] - one download of one recording, with its
//!   download/delete lifecycle
//!
//! At most one episode per `(series, filename)` may be live
//! (`delete_reason = not_deleted`); the schema enforces this with a partial
//! unique index. Writes made while classifying a sync run go through a
//! [`CatalogBatch`] so they land in a single commit before any download
//! starts.
//!
//! # Example
//!
//! ```no_run
//! use dvrsync_core::catalog::Catalog;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::open(Path::new("/media/tv")).await?;
//! for episode in catalog.active_episodes().await? {
//!     println!("{} interrupted={}", episode.metadata.filename, episode.download_interrupted);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod record;

pub use error::{CatalogDbErrorKind, CatalogError};
pub use record::{DeleteReason, DownloadReason, EpisodeRecord, SeriesRecord};

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, instrument};

use crate::db::Database;
use crate::device::{Recording, RecordingStorage};

/// Directory inside each library root holding engine state.
pub const STATE_DIR: &str = ".dvrsync";

/// Catalog database file name inside [`STATE_DIR`].
pub const CATALOG_FILE: &str = "catalog.db";

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

const SELECT_ACTIVE_EPISODES: &str =
    r"SELECT * FROM episodes WHERE delete_reason = 'not_deleted' ORDER BY id";

const INSERT_EPISODE: &str = r"
    INSERT INTO episodes (
        series_ref, series_start_time,
        category, channel_image_url, channel_name, channel_number, end_time,
        episode_number, episode_title, first_airing, image_url, movie_score,
        original_airdate, poster_url, program_id, record_end_time, record_error,
        record_start_time, record_success, series_id, start_time, synopsis, title,
        filename, play_url, cmd_url,
        download_interrupted, download_started, download_reason, delete_reason,
        rerecordable
    ) VALUES (
        ?, ?,
        ?, ?, ?, ?, ?,
        ?, ?, ?, ?, ?,
        ?, ?, ?, ?, ?,
        ?, ?, ?, ?, ?, ?,
        ?, ?, ?,
        1, ?, ?, 'not_deleted',
        0
    )";

/// Returns `Ok(())` if at least one row was affected; otherwise [`CatalogError::EpisodeNotFound`].
fn check_affected(id: i64, rows_affected: u64) -> Result<()> {
    if rows_affected == 0 {
        Err(CatalogError::EpisodeNotFound(id))
    } else {
        Ok(())
    }
}

/// Returns the catalog path for a library root.
#[must_use]
pub fn catalog_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join(CATALOG_FILE)
}

/// Handle to one library category's catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    db: Database,
}

impl Catalog {
    /// Wraps an open database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens (creating if needed) the catalog under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Open`] if the file cannot be opened or
    /// migrated.
    pub async fn open(root: &Path) -> Result<Self> {
        let db = Database::new(&catalog_path(root)).await?;
        Ok(Self::new(db))
    }

    /// Opens a throwaway in-memory catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Open`] if migrations fail.
    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::new_in_memory().await?))
    }

    /// Starts a batch of writes committed together.
    ///
    /// While a batch is open it holds a pool connection; on an in-memory
    /// catalog that is the only connection, so route every query through
    /// the batch until it is committed.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if no transaction can be started.
    pub async fn begin(&self) -> Result<CatalogBatch> {
        let tx = self.db.pool().begin().await?;
        Ok(CatalogBatch { tx })
    }

    /// Lists every series, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn series_list(&self) -> Result<Vec<SeriesRecord>> {
        let rows = sqlx::query_as::<_, SeriesRecord>(r"SELECT * FROM series ORDER BY id")
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows)
    }

    /// Gets an episode by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn episode(&self, id: i64) -> Result<Option<EpisodeRecord>> {
        let row = sqlx::query_as::<_, EpisodeRecord>(r"SELECT * FROM episodes WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row)
    }

    /// Lists every episode of a series, including retired ones.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn episodes_of(&self, series_ref: i64) -> Result<Vec<EpisodeRecord>> {
        let rows = sqlx::query_as::<_, EpisodeRecord>(
            r"SELECT * FROM episodes WHERE series_ref = ? ORDER BY id",
        )
        .bind(series_ref)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    /// Lists every live episode, interrupted or not.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn active_episodes(&self) -> Result<Vec<EpisodeRecord>> {
        let rows = sqlx::query_as::<_, EpisodeRecord>(SELECT_ACTIVE_EPISODES)
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows)
    }

    /// Lists live episodes whose download finished; these are the
    /// candidates for the delete policy.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn completed_episodes(&self) -> Result<Vec<EpisodeRecord>> {
        let rows = sqlx::query_as::<_, EpisodeRecord>(
            r"SELECT * FROM episodes
              WHERE delete_reason = 'not_deleted' AND download_interrupted = 0
              ORDER BY id",
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    /// Clears the interrupted flag once a file is fully on disk. Commits
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EpisodeNotFound`] if no row has this id.
    #[instrument(skip(self))]
    pub async fn mark_download_complete(&self, id: i64) -> Result<()> {
        let result = sqlx::query(r"UPDATE episodes SET download_interrupted = 0 WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        check_affected(id, result.rows_affected())?;
        debug!(id, "episode download committed");
        Ok(())
    }

    /// Retires an episode after a delete-policy action.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EpisodeNotFound`] if no row has this id.
    #[instrument(skip(self))]
    pub async fn set_deleted(&self, id: i64, reason: DeleteReason, rerecordable: bool) -> Result<()> {
        let result = sqlx::query(
            r"UPDATE episodes SET delete_reason = ?, rerecordable = ? WHERE id = ?",
        )
        .bind(reason)
        .bind(rerecordable)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        check_affected(id, result.rows_affected())
    }

    /// Closes the underlying pool.
    pub async fn close(self) {
        self.db.close().await;
    }
}

/// Writes grouped into one transaction.
///
/// Dropping a batch without [`commit`](Self::commit) rolls it back.
#[derive(Debug)]
pub struct CatalogBatch {
    tx: Transaction<'static, Sqlite>,
}

impl CatalogBatch {
    /// Returns the series matching this group's identity, inserting it when
    /// it has not been seen before.
    ///
    /// Identity is series id, title, category, artwork URLs and episodes URL.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if a query fails.
    #[instrument(skip(self, group), fields(series_id = %group.series_id))]
    pub async fn find_or_create_series(&mut self, group: &RecordingStorage) -> Result<SeriesRecord> {
        let existing = sqlx::query_as::<_, SeriesRecord>(
            r"SELECT * FROM series
              WHERE series_id = ? AND title = ? AND category = ? AND image_url = ?
                AND poster_url IS ? AND url = ?
              ORDER BY id LIMIT 1",
        )
        .bind(&group.series_id)
        .bind(&group.title)
        .bind(group.category)
        .bind(&group.image_url)
        .bind(group.poster_url.as_deref())
        .bind(&group.url)
        .fetch_optional(&mut *self.tx)
        .await?;
        if let Some(series) = existing {
            return Ok(series);
        }

        let result = sqlx::query(
            r"INSERT INTO series (series_id, title, category, image_url, poster_url, start_time, is_new, url)
              VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&group.series_id)
        .bind(&group.title)
        .bind(group.category)
        .bind(&group.image_url)
        .bind(group.poster_url.as_deref())
        .bind(group.start_time)
        .bind(group.is_new)
        .bind(&group.url)
        .execute(&mut *self.tx)
        .await?;
        let id = result.last_insert_rowid();
        debug!(id, title = %group.title, "created series");
        Ok(SeriesRecord {
            id,
            metadata: group.clone(),
        })
    }

    /// Finds the live episode of a series with this remote filename.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the query fails.
    pub async fn find_active_episode(
        &mut self,
        series_ref: i64,
        filename: &str,
    ) -> Result<Option<EpisodeRecord>> {
        let row = sqlx::query_as::<_, EpisodeRecord>(
            r"SELECT * FROM episodes
              WHERE series_ref = ? AND filename = ? AND delete_reason = 'not_deleted'",
        )
        .bind(series_ref)
        .bind(filename)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    /// Marks an episode as retired inside the batch.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EpisodeNotFound`] if no row has this id.
    pub async fn retire_episode(&mut self, id: i64, reason: DeleteReason) -> Result<()> {
        let result = sqlx::query(r"UPDATE episodes SET delete_reason = ? WHERE id = ?")
            .bind(reason)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        check_affected(id, result.rows_affected())
    }

    /// Inserts a live episode with its interrupted flag set.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the insert fails, including when
    /// the series already has a live episode with the same filename.
    #[instrument(skip(self, series, recording), fields(series_ref = series.id, filename = %recording.filename))]
    pub async fn insert_episode(
        &mut self,
        series: &SeriesRecord,
        recording: &Recording,
        reason: DownloadReason,
        started: DateTime<Utc>,
    ) -> Result<EpisodeRecord> {
        let m = recording;
        let result = sqlx::query(INSERT_EPISODE)
            .bind(series.id)
            .bind(series.metadata.start_time)
            .bind(m.category)
            .bind(m.channel_image_url.as_deref())
            .bind(&m.channel_name)
            .bind(&m.channel_number)
            .bind(m.end_time)
            .bind(m.episode_number.as_deref())
            .bind(&m.episode_title)
            .bind(m.first_airing)
            .bind(&m.image_url)
            .bind(m.movie_score.as_deref())
            .bind(m.original_airdate)
            .bind(m.poster_url.as_deref())
            .bind(&m.program_id)
            .bind(m.record_end_time)
            .bind(m.record_error.as_deref())
            .bind(m.record_start_time)
            .bind(m.record_success)
            .bind(&m.series_id)
            .bind(m.start_time)
            .bind(&m.synopsis)
            .bind(&m.title)
            .bind(&m.filename)
            .bind(&m.play_url)
            .bind(&m.cmd_url)
            .bind(started)
            .bind(reason)
            .execute(&mut *self.tx)
            .await?;

        let id = result.last_insert_rowid();
        debug!(id, reason = %reason, "inserted episode");
        Ok(EpisodeRecord {
            id,
            series_ref: series.id,
            series_start_time: series.metadata.start_time,
            metadata: recording.clone(),
            download_interrupted: true,
            download_started: started,
            download_reason: reason,
            delete_reason: DeleteReason::NotDeleted,
            rerecordable: false,
        })
    }

    /// Commits every write in the batch.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the commit fails.
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::device::RecordingCategory;
    use crate::device::fixtures::{epoch, group, recording};

    #[tokio::test]
    async fn test_find_or_create_series_is_idempotent() {
        let catalog = Catalog::open_in_memory().await.unwrap();
        let show = group("C1", "Show", RecordingCategory::Series);

        let mut batch = catalog.begin().await.unwrap();
        let first = batch.find_or_create_series(&show).await.unwrap();
        let second = batch.find_or_create_series(&show).await.unwrap();
        batch.commit().await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(catalog.series_list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_series_identity_includes_artwork() {
        let catalog = Catalog::open_in_memory().await.unwrap();
        let show = group("C1", "Show", RecordingCategory::Series);
        let mut with_poster = show.clone();
        with_poster.poster_url = Some("http://img/poster.jpg".to_string());

        let mut batch = catalog.begin().await.unwrap();
        let a = batch.find_or_create_series(&show).await.unwrap();
        let b = batch.find_or_create_series(&with_poster).await.unwrap();
        let again = batch.find_or_create_series(&with_poster).await.unwrap();
        batch.commit().await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(b.id, again.id);
    }

    #[tokio::test]
    async fn test_insert_and_find_active_episode_round_trips_metadata() {
        let catalog = Catalog::open_in_memory().await.unwrap();
        let show = group("C1", "Show", RecordingCategory::Series);
        let rec = recording(&show, "a.mpg");

        let mut batch = catalog.begin().await.unwrap();
        let series = batch.find_or_create_series(&show).await.unwrap();
        let inserted = batch
            .insert_episode(&series, &rec, DownloadReason::New, epoch())
            .await
            .unwrap();
        let found = batch
            .find_active_episode(series.id, "a.mpg")
            .await
            .unwrap()
            .unwrap();
        batch.commit().await.unwrap();

        assert_eq!(found, inserted);
        assert!(found.download_interrupted);
        assert_eq!(found.metadata, rec);
    }

    #[tokio::test]
    async fn test_second_active_episode_for_same_filename_is_rejected() {
        let catalog = Catalog::open_in_memory().await.unwrap();
        let show = group("C1", "Show", RecordingCategory::Series);
        let rec = recording(&show, "a.mpg");

        let mut batch = catalog.begin().await.unwrap();
        let series = batch.find_or_create_series(&show).await.unwrap();
        batch
            .insert_episode(&series, &rec, DownloadReason::New, epoch())
            .await
            .unwrap();
        let err = batch
            .insert_episode(&series, &rec, DownloadReason::New, epoch())
            .await
            .unwrap_err();
        assert_eq!(
            err.database_kind(),
            Some(CatalogDbErrorKind::ConstraintViolation)
        );
    }

    #[tokio::test]
    async fn test_retired_episode_frees_filename() {
        let catalog = Catalog::open_in_memory().await.unwrap();
        let show = group("C1", "Show", RecordingCategory::Series);
        let rec = recording(&show, "a.mpg");

        let mut batch = catalog.begin().await.unwrap();
        let series = batch.find_or_create_series(&show).await.unwrap();
        let old = batch
            .insert_episode(&series, &rec, DownloadReason::New, epoch())
            .await
            .unwrap();
        batch
            .retire_episode(old.id, DeleteReason::ReDownloaded)
            .await
            .unwrap();
        let replacement = batch
            .insert_episode(&series, &rec, DownloadReason::DownloadInterrupted, epoch())
            .await
            .unwrap();
        batch.commit().await.unwrap();

        let episodes = catalog.episodes_of(series.id).await.unwrap();
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].delete_reason, DeleteReason::ReDownloaded);
        assert_eq!(episodes[1].id, replacement.id);
        assert_eq!(
            episodes[1].download_reason,
            DownloadReason::DownloadInterrupted
        );
    }

    #[tokio::test]
    async fn test_mark_complete_moves_episode_into_completed_set() {
        let catalog = Catalog::open_in_memory().await.unwrap();
        let show = group("C1", "Show", RecordingCategory::Series);

        let mut batch = catalog.begin().await.unwrap();
        let series = batch.find_or_create_series(&show).await.unwrap();
        let a = batch
            .insert_episode(&series, &recording(&show, "a.mpg"), DownloadReason::New, epoch())
            .await
            .unwrap();
        batch
            .insert_episode(&series, &recording(&show, "b.mpg"), DownloadReason::New, epoch())
            .await
            .unwrap();
        batch.commit().await.unwrap();

        assert!(catalog.completed_episodes().await.unwrap().is_empty());
        catalog.mark_download_complete(a.id).await.unwrap();

        let completed = catalog.completed_episodes().await.unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].metadata.filename, "a.mpg");
        assert_eq!(catalog.active_episodes().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_set_deleted_records_reason_and_hint() {
        let catalog = Catalog::open_in_memory().await.unwrap();
        let show = group("M1", "Film", RecordingCategory::Movie);

        let mut batch = catalog.begin().await.unwrap();
        let series = batch.find_or_create_series(&show).await.unwrap();
        let ep = batch
            .insert_episode(&series, &recording(&show, "f.mpg"), DownloadReason::New, epoch())
            .await
            .unwrap();
        batch.commit().await.unwrap();

        catalog
            .set_deleted(ep.id, DeleteReason::RemoteDeleted, true)
            .await
            .unwrap();
        let stored = catalog.episode(ep.id).await.unwrap().unwrap();
        assert_eq!(stored.delete_reason, DeleteReason::RemoteDeleted);
        assert!(stored.rerecordable);
        assert!(!stored.is_active());
    }

    #[tokio::test]
    async fn test_updates_on_missing_rows_report_not_found() {
        let catalog = Catalog::open_in_memory().await.unwrap();
        assert!(matches!(
            catalog.mark_download_complete(99).await,
            Err(CatalogError::EpisodeNotFound(99))
        ));
        assert!(matches!(
            catalog.set_deleted(99, DeleteReason::Deleted, false).await,
            Err(CatalogError::EpisodeNotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_dropped_batch_rolls_back() {
        let catalog = Catalog::open_in_memory().await.unwrap();
        let show = group("C1", "Show", RecordingCategory::Series);
        {
            let mut batch = catalog.begin().await.unwrap();
            batch.find_or_create_series(&show).await.unwrap();
        }
        assert!(catalog.series_list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_creates_state_dir_under_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = Catalog::open(dir.path()).await.unwrap();
        assert!(catalog_path(dir.path()).exists());
        catalog.close().await;
    }
}
