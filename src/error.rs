//! Typed errors for the fetch, normalize and registry stages.
//!
//! Application plumbing (config, schema, stores, `main`) stays on
//! `anyhow::Result`; these types exist where the sync loop needs to tell
//! failure kinds apart.

use thiserror::Error;

/// Failure talking to a vendor API.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Vendor answered with a non-success status.
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// Body was not the JSON shape we expect.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Top-level list field absent or not an array.
    #[error("response missing '{0}' list")]
    MissingList(&'static str),
}

/// A single record could not be turned into a canonical reading.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("unparsable timestamp '{0}'")]
    Timestamp(String),

    #[error("non-numeric {field} value '{value}'")]
    Number { field: &'static str, value: String },
}

/// Static device tables failed validation at startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("device '{0}' is mapped more than once")]
    DuplicateDevice(String),
}
