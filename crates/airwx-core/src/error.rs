//! Error types for airwx-core.
//!
//! Errors fall into two groups that the ingestion loop treats differently:
//!
//! | Error | Group | Effect on a run |
//! |-------|-------|-----------------|
//! | [`Error::Request`] | provider | chunk treated as empty, run continues |
//! | [`Error::Status`] | provider | chunk treated as empty, run continues |
//! | [`Error::Decode`] | provider | chunk treated as empty, run continues |
//! | [`Error::Api`] | provider | chunk treated as empty, run continues |
//! | [`Error::Mock`] | provider | chunk treated as empty, run continues |
//! | [`Error::Store`] | fatal | batch rolled back, cursor not advanced |
//! | [`Error::StateFile`] | fatal | rows committed, cursor not advanced |
//! | [`Error::InvalidConfig`] | fatal | run not started |

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while ingesting a series.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// HTTP request could not be completed.
    #[error("{provider} request failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Provider answered with a non-success status.
    #[error("{provider} returned HTTP {status}")]
    Status { provider: &'static str, status: u16 },

    /// Response body could not be decoded.
    #[error("{provider} response could not be decoded: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    /// Provider reported an error inside a successful response.
    #[error("{provider} API error: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },

    /// Injected failure from the mock provider.
    #[error("Mock provider failure: {0}")]
    Mock(String),

    /// Persistence failed.
    #[error("Store error: {0}")]
    Store(#[from] airwx_store::Error),

    /// Cursor marker file could not be written.
    #[error("Failed to write cursor file {path}: {source}")]
    StateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a request error without the URL, which carries the API key.
    pub fn request(provider: &'static str, source: reqwest::Error) -> Self {
        Self::Request {
            provider,
            source: source.without_url(),
        }
    }

    /// True for errors that mean "no data for this chunk" rather than
    /// aborting the run.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Error::Request { .. }
                | Error::Status { .. }
                | Error::Decode { .. }
                | Error::Api { .. }
                | Error::Mock(_)
        )
    }
}

/// Result type alias using airwx-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
