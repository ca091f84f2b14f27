//! Data models shared by the fetch, normalize and persist stages.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

// ---

/// Third-party telemetry providers this service syncs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    // ---
    /// Batch endpoint returning every device in one response.
    Aptech,
    /// One request per device.
    Higertech,
}

impl Vendor {
    // ---
    pub const ALL: [Vendor; 2] = [Vendor::Aptech, Vendor::Higertech];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Aptech => "aptech",
            Vendor::Higertech => "higertech",
        }
    }

    /// Case-insensitive lookup used by the manual trigger route.
    pub fn parse(name: &str) -> Option<Vendor> {
        Vendor::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a monitoring post measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    // ---
    /// AWLR post, value in meters.
    WaterLevel,
    /// ARR post, value in millimeters.
    Rainfall,
}

impl SensorKind {
    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::WaterLevel => "AWLR",
            SensorKind::Rainfall => "ARR",
        }
    }
}

/// One static registry entry: vendor device id to canonical post name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceMapping {
    pub vendor_device_id: String,
    pub post_name: String,
    pub sensor_kind: SensorKind,
}

/// Vendor reading before normalization.
///
/// Measurements stay as the vendor sent them (string or number); the
/// normalizer owns parsing and unit scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    // ---
    pub device_id: String,
    /// Naive local timestamp text, date and time already joined.
    pub timestamp: String,
    pub value: serde_json::Value,
    pub battery: Option<serde_json::Value>,
}

/// Normalized reading handed to a station store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalReading {
    // ---
    pub device_id: String,
    pub post_name: String,
    pub observed_at: DateTime<FixedOffset>,
    /// Meters for water level, millimeters for rainfall.
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
}

/// Why a device produced no write this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    // ---
    /// The vendor returned nothing usable for this device.
    NoData,
    /// A record came back but the timestamp or measurement was missing.
    Incomplete,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => f.write_str("no data"),
            SkipReason::Incomplete => f.write_str("incomplete data"),
        }
    }
}

/// Result of processing a single device or record.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceOutcome {
    Updated,
    Skipped(SkipReason),
    Failed(String),
}

/// Per-cycle counts, logged at the end of a cycle and exposed on `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    // ---
    pub vendor: Vendor,
    pub cycle_id: uuid::Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub updated: u32,
    pub skipped: u32,
    pub failed: u32,
    /// Set when the cycle ended early (batch fetch failure).
    pub aborted: Option<String>,
}

impl CycleSummary {
    // ---
    pub fn start(vendor: Vendor) -> Self {
        // ---
        CycleSummary {
            vendor,
            cycle_id: uuid::Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            updated: 0,
            skipped: 0,
            failed: 0,
            aborted: None,
        }
    }

    pub fn record(&mut self, outcome: &DeviceOutcome) {
        match outcome {
            DeviceOutcome::Updated => self.updated += 1,
            DeviceOutcome::Skipped(_) => self.skipped += 1,
            DeviceOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn abort(&mut self, reason: impl Into<String>) {
        self.aborted = Some(reason.into());
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }
}
