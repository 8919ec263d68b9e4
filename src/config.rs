//! Sync configuration loaded from TOML.
//!
//! ```toml
//! tuners = ["192.168.1.20", "hdhr-living-room.local"]
//! delete_policy = "after_one_week"
//! rerecord_policy = "on_recording_error"
//!
//! [libraries]
//! movie = "/media/movies"
//! series = "/media/tv"
//!
//! [http]
//! read_timeout_secs = 600
//! ```

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::device::SchemaMode;
use crate::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::library::LibraryRoots;
use crate::policy::{DeletePolicy, ReRecordPolicy};

/// Default listings endpoint for program guides.
pub const DEFAULT_GUIDE_URL: &str = "https://api.hdhomerun.com/api/guide.php";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("no config path: neither XDG_CONFIG_HOME nor HOME is set")]
    NoDefaultPath,
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Per-category library roots as written in the file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibrariesConfig {
    pub movie: Option<String>,
    pub series: Option<String>,
}

/// HTTP client tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// Everything one sync run needs to know, passed explicitly to the runner.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Tuner addresses (`host`, `host:port` or URL).
    #[serde(default)]
    pub tuners: Vec<String>,
    #[serde(default)]
    pub libraries: LibrariesConfig,
    /// No policy means nothing is ever deleted from the device.
    #[serde(default)]
    pub delete_policy: Option<DeletePolicy>,
    #[serde(default)]
    pub rerecord_policy: ReRecordPolicy,
    #[serde(default)]
    pub schema: SchemaMode,
    /// Fetch again recordings whose local file went missing.
    #[serde(default)]
    pub redownload_missing: bool,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default = "default_guide_url")]
    pub guide_url: String,
}

fn default_guide_url() -> String {
    DEFAULT_GUIDE_URL.to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tuners: Vec::new(),
            libraries: LibrariesConfig::default(),
            delete_policy: None,
            rerecord_policy: ReRecordPolicy::default(),
            schema: SchemaMode::default(),
            redownload_missing: false,
            http: HttpConfig::default(),
            guide_url: default_guide_url(),
        }
    }
}

impl SyncConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed or
    /// validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw, path)
    }

    /// Validates values against runtime constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_secs("http.connect_timeout_secs", self.http.connect_timeout_secs)?;
        validate_timeout_secs("http.read_timeout_secs", self.http.read_timeout_secs)?;

        if let Some(blank) = self.tuners.iter().position(|t| t.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "tuners",
                format!("entry {blank} is empty"),
            ));
        }
        if self.redownload_missing && self.delete_policy == Some(DeletePolicy::AfterDeleted) {
            return Err(ConfigError::invalid(
                "redownload_missing",
                "cannot be combined with delete_policy = \"after_deleted\"",
            ));
        }
        url::Url::parse(&self.guide_url)
            .map_err(|e| ConfigError::invalid("guide_url", e.to_string()))?;
        Ok(())
    }

    /// Library roots with blank entries treated as unconfigured.
    #[must_use]
    pub fn library_roots(&self) -> LibraryRoots {
        LibraryRoots::new(
            self.libraries.movie.as_deref(),
            self.libraries.series.as_deref(),
        )
    }
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if !(1..=3600).contains(&value) {
        return Err(ConfigError::invalid(
            field,
            format!("{value}. Expected range: 1..=3600"),
        ));
    }
    Ok(())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/dvrsync/config.toml`
/// 2. `$HOME/.config/dvrsync/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("dvrsync")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("dvrsync")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads `explicit` if given, otherwise the default path.
///
/// # Errors
///
/// Returns [`ConfigError::NoDefaultPath`] when no path can be derived, or
/// any error from [`SyncConfig::load`].
pub fn load_config(explicit: Option<&Path>) -> Result<(PathBuf, SyncConfig), ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => resolve_default_config_path().ok_or(ConfigError::NoDefaultPath)?,
    };
    let config = SyncConfig::load(&path)?;
    Ok((path, config))
}
