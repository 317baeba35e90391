//! Errors returned by `AirtableClient`
//!
use snafu::prelude::*;

/// Errors returned by the airtable-api crate
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum AirtableError {
    // Http connection or timeout error
    #[snafu(display("HTTP error {method} url:{url}"))]
    Http {
        method: String,
        url: String,
        source: reqwest::Error,
    },

    /// Airtable responded with an error status.
    /// Usually means the request was invalid or there was a server error.
    #[snafu(display("Api server reported error ({code}) {method} {url}: {message}"))]
    ApiError {
        code: u16,
        method: String,
        url: String,
        message: String,
    },

    /// Authentication failed: the personal access token is missing,
    /// expired, or lacks the required scopes.
    #[snafu(display("Authentication failed: {message}"))]
    Auth { message: String },

    /// Expected item was not found. Returned for base, table, or view lookups.
    #[snafu(display("{obj_type} {key} not found"))]
    NotFound { obj_type: String, key: String },

    /// Deserialization error. This means we didn't deserialize a server response correctly.
    /// If you see this error, please report it as a bug.
    #[snafu(display("Deserialization: {source}"))]
    Deserialization { source: serde_json::Error },

    /// Validation error: an internal parameter validation check failed.
    #[snafu(display("Validation error: {message}"))]
    Validation { message: String },
}
