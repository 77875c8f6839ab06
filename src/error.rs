//! Reasons an upstream fetch can fail.

use thiserror::Error;

/// Why a request to the weather API did not produce a JSON document.
///
/// These never reach a tool caller; [`crate::client::NwsClient`] logs them and
/// reports the fetch as absent.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request failed with status: {0}")]
    Status(reqwest::StatusCode),

    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),
}
