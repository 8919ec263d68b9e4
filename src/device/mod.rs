//! Device client for networked DVR tuners.
//!
//! Discovery starts from a configured address ([`TunerRef`]) and walks down
//! to the tuner's storage, its recording groups and finally the individual
//! recordings. Every response is validated record by record: a record missing
//! a field the engine depends on is logged and dropped while the rest of the
//! batch is kept. Transport failures and malformed top-level documents are
//! returned as [`DeviceError`].
//!
//! # Example
//!
//! ```no_run
//! use dvrsync_core::device::{SchemaMode, TunerRef};
//! use dvrsync_core::download::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! if let Some(tuner) = TunerRef::new("192.168.1.20").discover(&client, SchemaMode::Strict).await? {
//!     if let Some(storage) = &tuner.storage {
//!         for group in storage.recording_groups(&client, SchemaMode::Strict).await? {
//!             println!("{}: {} recordings", group.title, group.recordings(&client, SchemaMode::Strict).await?.len());
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod category;
mod dto;
mod episode_number;
mod error;
mod recording;
mod schema;
mod tuner;

pub use category::RecordingCategory;
pub use episode_number::{EpisodeNumber, InvalidDesignator};
pub use error::DeviceError;
pub use recording::{Recording, RecordingStorage, STILL_RECORDING_GRACE_SECS};
pub use schema::SchemaMode;
pub use tuner::{Channel, GuideChannel, GuideProgram, StorageRef, Tuner, TunerRef};

#[cfg(test)]
pub(crate) mod fixtures;
