//! Higertech telemetry API (per-device fetch).
//!
//! `GET {base}/reading/device/{device_id}` returns a `response` list of
//! candidate readings; the entry whose `device_id` matches the request is
//! the one we use. All measurement fields arrive as strings.

use serde::Deserialize;
use serde_json::Value;

use super::get_json;
use crate::error::FetchError;
use crate::models::{RawReading, SensorKind, SkipReason};
use crate::normalize::is_blank;

// ---

pub const DEFAULT_BASE: &str = "https://api.higertech.com/v2";

const LIST_FIELD: &str = "response";

#[derive(Debug, Clone, Deserialize)]
pub struct HigertechReading {
    // ---
    pub device_id: String,
    #[serde(default)]
    pub reading_at: Option<String>,
    #[serde(default)]
    pub water_level: Option<Value>,
    #[serde(default)]
    pub rainfall: Option<Value>,
    #[serde(default)]
    pub battery: Option<Value>,
}

impl HigertechReading {
    // ---
    /// Raw reading for the `kind` sub-pipeline. A missing timestamp or
    /// measurement means the device is skipped this cycle.
    pub fn to_raw(&self, kind: SensorKind) -> Result<RawReading, SkipReason> {
        // ---
        let measurement = match kind {
            SensorKind::WaterLevel => self.water_level.as_ref(),
            SensorKind::Rainfall => self.rainfall.as_ref(),
        };

        let timestamp = match &self.reading_at {
            Some(ts) if !ts.trim().is_empty() => ts.clone(),
            _ => return Err(SkipReason::Incomplete),
        };
        if is_blank(measurement) {
            return Err(SkipReason::Incomplete);
        }

        Ok(RawReading {
            device_id: self.device_id.clone(),
            timestamp,
            value: measurement.cloned().unwrap_or(Value::Null),
            battery: self.battery.clone().filter(|b| !is_blank(Some(b))),
        })
    }
}

/// HTTP adapter for the Higertech per-device endpoint.
#[derive(Debug, Clone)]
pub struct HigertechClient {
    http: reqwest::Client,
    base: String,
}

impl HigertechClient {
    // ---
    pub fn new(http: reqwest::Client, base: impl Into<String>) -> Self {
        HigertechClient {
            http,
            base: base.into(),
        }
    }

    pub fn device_url(&self, device_id: &str) -> String {
        format!("{}/reading/device/{}", self.base.trim_end_matches('/'), device_id)
    }

    /// Latest reading for one device; `Ok(None)` when the response has no
    /// entry for it.
    pub async fn fetch_one(&self, device_id: &str) -> Result<Option<HigertechReading>, FetchError> {
        // ---
        let body = get_json(self.http.get(self.device_url(device_id))).await?;
        select_reading(&body, device_id)
    }
}

/// Pick the entry matching `device_id` from a response body.
pub fn select_reading(body: &Value, device_id: &str) -> Result<Option<HigertechReading>, FetchError> {
    // ---
    let list = body
        .get(LIST_FIELD)
        .and_then(Value::as_array)
        .ok_or(FetchError::MissingList(LIST_FIELD))?;

    let Some(entry) = list
        .iter()
        .find(|item| item.get("device_id").and_then(Value::as_str) == Some(device_id))
    else {
        return Ok(None);
    };

    Ok(Some(serde_json::from_value(entry.clone())?))
}
