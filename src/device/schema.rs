//! Per-record schema validation for device JSON.
//!
//! Tuners return arrays of loosely-typed objects. Each element is decoded on
//! its own so a single malformed record is dropped (with a warning) while the
//! rest of the batch survives. A record is accepted only when every field the
//! engine depends on is present and non-default; in [`SchemaMode::Strict`] a
//! record carrying a field outside the known schema is dropped as well.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use super::error::DeviceError;

/// How to treat fields the engine does not know about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaMode {
    /// Drop any record carrying an unknown field.
    #[default]
    Strict,
    /// Log unknown fields and keep the record.
    Lenient,
}

/// Validation context for one record: where it came from and how to log.
#[derive(Debug, Clone)]
pub(crate) struct RecordCheck<'a> {
    url: &'a str,
    location: String,
}

impl<'a> RecordCheck<'a> {
    /// Context for element `index` of the array returned by `url`.
    pub(crate) fn element(url: &'a str, index: usize) -> Self {
        Self {
            url,
            location: index.to_string(),
        }
    }

    /// Context for the single top-level object returned by `url`.
    pub(crate) fn top_level(url: &'a str) -> Self {
        Self {
            url,
            location: String::from("root"),
        }
    }

    /// Context for a nested element inside this record.
    pub(crate) fn nested(&self, index: usize) -> Self {
        Self {
            url: self.url,
            location: format!("{}.{index}", self.location),
        }
    }

    /// Passes `value` through, logging when the field is missing.
    pub(crate) fn required<T>(&self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            warn!(
                index = %self.location,
                url = %self.url,
                field,
                "JSON response missing required field"
            );
        }
        value
    }

    /// Converts a required Unix-seconds timestamp; zero counts as missing.
    pub(crate) fn required_time(&self, field: &str, value: Option<i64>) -> Option<DateTime<Utc>> {
        let seconds = self.required(field, value.filter(|v| *v != 0))?;
        let converted = DateTime::from_timestamp(seconds, 0);
        if converted.is_none() {
            warn!(
                index = %self.location,
                url = %self.url,
                field,
                seconds,
                "JSON response has out-of-range timestamp"
            );
        }
        converted
    }

    /// Logs every unknown field; returns `false` when the record must be dropped.
    pub(crate) fn accepts_extra_fields(&self, extra: &Map<String, Value>, mode: SchemaMode) -> bool {
        for field in extra.keys() {
            warn!(
                index = %self.location,
                url = %self.url,
                field = %field,
                "JSON response contains extra field"
            );
        }
        extra.is_empty() || mode == SchemaMode::Lenient
    }

    /// Logs a category string the engine cannot map.
    pub(crate) fn unknown_category(&self, category: &str) {
        warn!(
            index = %self.location,
            url = %self.url,
            category,
            "JSON response has unknown category"
        );
    }
}

/// Optional Unix-seconds timestamp; zero or out-of-range yields `None`.
pub(crate) fn optional_time(value: Option<i64>) -> Option<DateTime<Utc>> {
    value
        .filter(|v| *v != 0)
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
}

/// Splits a JSON array into individually decoded records.
///
/// Elements that fail to decode (wrong types, not an object) are logged and
/// skipped; the returned pairs keep each survivor's original index.
///
/// # Errors
///
/// Returns [`DeviceError::UnexpectedShape`] when `body` is not an array.
pub(crate) fn decode_records<T: DeserializeOwned>(
    url: &str,
    body: Value,
) -> Result<Vec<(usize, T)>, DeviceError> {
    let Value::Array(elements) = body else {
        return Err(DeviceError::unexpected_shape(url, "array"));
    };
    Ok(decode_elements(url, elements, |index| index.to_string()))
}

/// Decodes nested elements (e.g. the programs of one guide channel).
pub(crate) fn decode_nested<T: DeserializeOwned>(
    check: &RecordCheck<'_>,
    elements: Vec<Value>,
) -> Vec<(usize, T)> {
    decode_elements(check.url, elements, |index| {
        format!("{}.{index}", check.location)
    })
}

fn decode_elements<T: DeserializeOwned>(
    url: &str,
    elements: Vec<Value>,
    location: impl Fn(usize) -> String,
) -> Vec<(usize, T)> {
    elements
        .into_iter()
        .enumerate()
        .filter_map(|(index, element)| match serde_json::from_value::<T>(element) {
            Ok(record) => Some((index, record)),
            Err(error) => {
                warn!(
                    index = %location(index),
                    url = %url,
                    error = %error,
                    "JSON response element could not be decoded"
                );
                None
            }
        })
        .collect()
}
