//! Reading normalizer: vendor timestamp and units to a canonical reading.
//!
//! Vendors report naive wall-clock times. Both are treated as UTC and
//! shifted to WIB (UTC+7), so `2024-01-01 00:00:00` becomes
//! `2024-01-01T07:00:00+07:00`. Units are scaled per vendor and sensor
//! kind; only Aptech water level needs conversion (centimeters to meters).

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde_json::Value;

use crate::error::NormalizeError;
use crate::models::{CanonicalReading, RawReading, SensorKind, Vendor};

// ---

/// Canonical zone offset (WIB).
pub const WIB_OFFSET_SECS: i32 = 7 * 3600;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Divisor applied to the raw measurement for a vendor/sensor pair.
pub fn unit_divisor(vendor: Vendor, kind: SensorKind) -> f64 {
    match (vendor, kind) {
        (Vendor::Aptech, SensorKind::WaterLevel) => 100.0,
        _ => 1.0,
    }
}

/// Build the canonical reading for one raw record.
///
/// Pure and deterministic. Errors only affect this record.
pub fn normalize(
    raw: &RawReading,
    vendor: Vendor,
    kind: SensorKind,
    post_name: &str,
) -> Result<CanonicalReading, NormalizeError> {
    // ---
    let naive = parse_vendor_timestamp(&raw.timestamp)?;
    let wib = FixedOffset::east_opt(WIB_OFFSET_SECS)
        .ok_or_else(|| NormalizeError::Timestamp(raw.timestamp.clone()))?;
    let observed_at = DateTime::from_naive_utc_and_offset(naive, wib);

    let field = match kind {
        SensorKind::WaterLevel => "water level",
        SensorKind::Rainfall => "rainfall",
    };
    let measured = parse_number(&raw.value).ok_or_else(|| NormalizeError::Number {
        field,
        value: raw.value.to_string(),
    })?;

    Ok(CanonicalReading {
        device_id: raw.device_id.clone(),
        post_name: post_name.to_string(),
        observed_at,
        value: measured / unit_divisor(vendor, kind),
        battery: raw.battery.as_ref().and_then(parse_number),
    })
}

/// Parse a vendor timestamp into its UTC wall clock.
///
/// Offset-qualified RFC 3339 strings are converted to UTC first; naive
/// strings are taken as-is.
pub fn parse_vendor_timestamp(text: &str) -> Result<NaiveDateTime, NormalizeError> {
    // ---
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| NormalizeError::Timestamp(text.to_string()))
}

/// Numeric value from a JSON number or numeric string. Non-finite is `None`.
pub fn parse_number(value: &Value) -> Option<f64> {
    // ---
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// `true` for null, missing-equivalent or empty-string fields.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}
