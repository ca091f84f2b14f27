//! Vendor API adapters.
//!
//! - `aptech`    – batch fetch, one request returns every device
//! - `higertech` – per-device fetch, one request per registered device
//!
//! Adapters only fetch and extract; registry filtering and normalization
//! happen in `sync`.
use reqwest::RequestBuilder;
use serde_json::Value;

use crate::error::FetchError;

pub mod aptech;
pub mod higertech;

pub use aptech::{AptechClient, AptechRecord};
pub use higertech::{HigertechClient, HigertechReading};

// ---

/// Send `request` and decode the body as JSON, mapping failures to [`FetchError`].
pub(crate) async fn get_json(request: RequestBuilder) -> Result<Value, FetchError> {
    // ---
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
