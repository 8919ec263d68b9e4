//! DVR sync core library
//!
//! Pulls finished recordings off networked DVR tuners into per-category media
//! libraries, downloading each recording once and tracking its lifecycle in a
//! small catalog next to the library.
//!
//! # Architecture
//!
//! - [`device`] - Tuner discovery and schema-checked device responses
//! - [`catalog`] - Persisted series and episode rows (one database per library)
//! - [`library`] - Deterministic library paths and artwork files
//! - [`download`] - HTTP client and the sequential download manager
//! - [`policy`] - Delete and re-record policies
//! - [`sync`] - The sync run tying the above together
//! - [`config`] - TOML configuration
//! - [`scrub`] - Read-only catalog/library audit

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod db;
pub mod device;
pub mod download;
pub mod library;
pub mod policy;
pub mod scrub;
pub mod sync;
mod user_agent;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, DeleteReason, DownloadReason, EpisodeRecord, SeriesRecord};
pub use config::{ConfigError, SyncConfig, load_config};
pub use db::{Database, DbError};
pub use device::{DeviceError, Recording, RecordingCategory, RecordingStorage, SchemaMode, Tuner, TunerRef};
pub use download::{DownloadError, DownloadManager, HttpClient};
pub use library::LibraryRoots;
pub use policy::{DeletePolicy, ReRecordPolicy};
pub use scrub::{ScrubError, ScrubReport, scrub_library};
pub use sync::{SyncError, SyncReport, SyncRunner};
