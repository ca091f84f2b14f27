//! Aptech telemetry API (batch fetch).
//!
//! A single GET returns every Aptech device in the `telemetryjakarta`
//! list. Water level is reported in centimeters, rainfall in millimeters.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::get_json;
use crate::error::FetchError;
use crate::models::{RawReading, SensorKind, SkipReason};
use crate::normalize::is_blank;

// ---

pub const DEFAULT_URL: &str = "https://sdatelemetry.com/API_ap_telemetry/datatelemetry.php?idbbws=2";

const LIST_FIELD: &str = "telemetryjakarta";

/// One entry of the Aptech batch response.
#[derive(Debug, Clone, Deserialize)]
pub struct AptechRecord {
    // ---
    #[serde(rename = "nama_lokasi")]
    pub device_id: String,
    /// `YYYY-MM-DD`; anything but a non-empty string makes the record incomplete.
    #[serde(rename = "ReceivedDate", default)]
    pub received_date: Option<Value>,
    /// `HH:MM:SS`, same rule as the date.
    #[serde(rename = "ReceivedTime", default)]
    pub received_time: Option<Value>,
    /// Centimeters, string or number.
    #[serde(rename = "WLevel", default)]
    pub water_level: Option<Value>,
    /// Millimeters, string or number.
    #[serde(rename = "Rain", default)]
    pub rain: Option<Value>,
}

impl AptechRecord {
    // ---
    /// Raw reading for the `kind` sub-pipeline, or why there is none.
    pub fn to_raw(&self, kind: SensorKind) -> Result<RawReading, SkipReason> {
        // ---
        let measurement = match kind {
            SensorKind::WaterLevel => self.water_level.as_ref(),
            SensorKind::Rainfall => self.rain.as_ref(),
        };

        let (Some(date), Some(time)) = (
            text_field(self.received_date.as_ref()),
            text_field(self.received_time.as_ref()),
        ) else {
            return Err(SkipReason::Incomplete);
        };
        if is_blank(measurement) {
            return Err(SkipReason::Incomplete);
        }

        Ok(RawReading {
            device_id: self.device_id.clone(),
            timestamp: format!("{date} {time}"),
            value: measurement.cloned().unwrap_or(Value::Null),
            battery: None,
        })
    }
}

/// Trimmed string content, `None` for blanks and non-string values.
fn text_field(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// HTTP adapter for the Aptech batch endpoint.
#[derive(Debug, Clone)]
pub struct AptechClient {
    http: reqwest::Client,
    url: String,
    user: Option<String>,
    pass: Option<String>,
}

impl AptechClient {
    // ---
    pub fn new(
        http: reqwest::Client,
        url: impl Into<String>,
        user: Option<String>,
        pass: Option<String>,
    ) -> Self {
        // ---
        AptechClient {
            http,
            url: url.into(),
            user,
            pass,
        }
    }

    /// Fetch every record in one call. Any failure here is fatal for the cycle.
    pub async fn fetch_all(&self) -> Result<Vec<AptechRecord>, FetchError> {
        // ---
        let mut request = self.http.get(&self.url);
        if let Some(user) = &self.user {
            request = request.query(&[("user", user)]);
        }
        if let Some(pass) = &self.pass {
            request = request.query(&[("pass", pass)]);
        }

        let body = get_json(request).await?;
        parse_batch(&body)
    }
}

/// Extract the record list.
///
/// Field types are checked later, per sub-pipeline, so a malformed entry
/// for a known device is still seen and skipped there. Only entries with
/// no usable `nama_lokasi` are dropped here.
pub fn parse_batch(body: &Value) -> Result<Vec<AptechRecord>, FetchError> {
    // ---
    let list = body
        .get(LIST_FIELD)
        .and_then(Value::as_array)
        .ok_or(FetchError::MissingList(LIST_FIELD))?;

    let mut records = Vec::with_capacity(list.len());
    for (i, item) in list.iter().enumerate() {
        match serde_json::from_value::<AptechRecord>(item.clone()) {
            Ok(record) => records.push(record),
            Err(e) => debug!("Dropping Aptech item {}: {} - Raw item: {}", i, e, item),
        }
    }

    debug!("Aptech batch parsed: {} of {} items", records.len(), list.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn sample_body() -> Value {
        // ---
        json!({
            "telemetryjakarta": [
                {
                    "nama_lokasi": "sabagi",
                    "ReceivedDate": "2024-01-01",
                    "ReceivedTime": "00:00:00",
                    "WLevel": "250",
                    "Rain": "0"
                },
                {
                    "nama_lokasi": "toge",
                    "ReceivedDate": "2024-01-01",
                    "ReceivedTime": "06:30:00",
                    "WLevel": null,
                    "Rain": 3.5
                },
                { "unexpected": true }
            ]
        })
    }

    #[test]
    fn test_parse_batch_drops_malformed_items() {
        // ---
        let records = parse_batch(&sample_body()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].device_id, "sabagi");
        assert_eq!(records[1].device_id, "toge");
    }

    #[test]
    fn test_parse_batch_missing_list() {
        // ---
        let err = parse_batch(&json!({ "status": "error" })).unwrap_err();
        assert!(matches!(err, FetchError::MissingList("telemetryjakarta")));
    }

    #[test]
    fn test_to_raw_joins_date_and_time() {
        // ---
        let records = parse_batch(&sample_body()).unwrap();
        let raw = records[0].to_raw(SensorKind::WaterLevel).unwrap();
        assert_eq!(raw.timestamp, "2024-01-01 00:00:00");
        assert_eq!(raw.value, json!("250"));
        assert_eq!(raw.battery, None);

        let raw = records[1].to_raw(SensorKind::Rainfall).unwrap();
        assert_eq!(raw.value, json!(3.5));
    }

    #[test]
    fn test_to_raw_incomplete() {
        // ---
        let records = parse_batch(&sample_body()).unwrap();
        assert_eq!(
            records[1].to_raw(SensorKind::WaterLevel).unwrap_err(),
            SkipReason::Incomplete
        );

        let no_time = AptechRecord {
            device_id: "sepang".into(),
            received_date: Some(json!("2024-01-01")),
            received_time: None,
            water_level: None,
            rain: Some(json!("1")),
        };
        assert_eq!(
            no_time.to_raw(SensorKind::Rainfall).unwrap_err(),
            SkipReason::Incomplete
        );
    }

    #[test]
    fn test_non_string_date_or_time_is_kept_but_incomplete() {
        // ---
        let body = json!({
            "telemetryjakarta": [
                { "nama_lokasi": "sabagi", "ReceivedDate": "2024-01-01", "ReceivedTime": 0, "WLevel": "250" },
                { "nama_lokasi": "toge", "ReceivedDate": 20240101, "ReceivedTime": "00:00:00", "Rain": "1" }
            ]
        });
        let records = parse_batch(&body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].to_raw(SensorKind::WaterLevel).unwrap_err(),
            SkipReason::Incomplete
        );
        assert_eq!(
            records[1].to_raw(SensorKind::Rainfall).unwrap_err(),
            SkipReason::Incomplete
        );
    }
}
