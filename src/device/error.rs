//! Error types for device client operations.

use thiserror::Error;

use crate::download::DownloadError;

/// Hard failures talking to a tuner.
///
/// Individual malformed records are not errors; they are dropped during
/// validation. These variants abort the whole call.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Transport failure, non-2xx status, or undecodable body.
    #[error(transparent)]
    Transport(#[from] DownloadError),

    /// The top-level JSON value had the wrong shape.
    #[error("expected a JSON {expected} from {url}")]
    UnexpectedShape {
        /// The URL that returned the document.
        url: String,
        /// The shape that was expected (`array`, `object`).
        expected: &'static str,
    },

    /// A device URL could not be parsed or extended.
    #[error("invalid device URL: {url}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
    },
}

impl DeviceError {
    /// Creates a shape error.
    pub fn unexpected_shape(url: impl Into<String>, expected: &'static str) -> Self {
        Self::UnexpectedShape {
            url: url.into(),
            expected,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}
