//! Line-oriented wire codec for readings and alerts.
//!
//! Two serializations of the same [`Reading`] exist:
//!
//! - labeled: `Patient ID: 1, Timestamp: 1700000000000, Label: HeartRate, Data: 75.0`
//! - CSV:     `1,1700000000000,HeartRate,75.0`
//!
//! [`parse_line`] accepts both and normalizes them to a [`Reading`].

use std::sync::LazyLock;

use regex::Regex;

use crate::alert::{AlertEvent, AlertTransition};
use crate::error::CoreError;
use crate::reading::{Reading, VitalType, ALERT_RESOLVED_VALUE, ALERT_TRIGGERED_VALUE};
use crate::types::{PatientId, TimestampMs};

static LABELED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^Patient ID:\s*(-?\d+),\s*Timestamp:\s*(-?\d+),\s*Label:\s*(\w+),\s*Data:\s*(\S+)$",
    )
    .expect("valid regex")
});

const LABELED_PREFIX: &str = "Patient ID:";

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render the data field for a reading.
///
/// Whole numbers keep one decimal place (`120.0`) and alert markers render
/// as `triggered` / `resolved`.
pub fn format_value(vital: VitalType, value: f64) -> String {
    if vital == VitalType::AlertMarker {
        let transition = if value >= 0.5 {
            AlertTransition::Triggered
        } else {
            AlertTransition::Resolved
        };
        return transition.as_str().to_string();
    }
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Labeled serialization, used by the WebSocket broadcast.
pub fn format_labeled(reading: &Reading) -> String {
    format!(
        "Patient ID: {}, Timestamp: {}, Label: {}, Data: {}",
        reading.patient_id,
        reading.timestamp,
        reading.vital.label(),
        format_value(reading.vital, reading.value),
    )
}

/// CSV serialization, used by the TCP broadcast.
pub fn format_csv(reading: &Reading) -> String {
    format!(
        "{},{},{},{}",
        reading.patient_id,
        reading.timestamp,
        reading.vital.label(),
        format_value(reading.vital, reading.value),
    )
}

/// Human-readable alert block.
pub fn render_alert(alert: &AlertEvent) -> String {
    format!(
        "Alert Triggered:\nPatient ID: {}\nCondition: {}\nTimestamp: {}",
        alert.patient_id, alert.condition, alert.timestamp,
    )
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse one inbound line in either serialization.
pub fn parse_line(line: &str) -> Result<Reading, CoreError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(CoreError::parse(line, "empty line"));
    }

    let (id, timestamp, label, data) = if trimmed.starts_with(LABELED_PREFIX) {
        let caps = LABELED_RE
            .captures(trimmed)
            .ok_or_else(|| CoreError::parse(line, "does not match the labeled format"))?;
        (
            caps.get(1).map_or("", |m| m.as_str()),
            caps.get(2).map_or("", |m| m.as_str()),
            caps.get(3).map_or("", |m| m.as_str()),
            caps.get(4).map_or("", |m| m.as_str()),
        )
    } else {
        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        match fields.as_slice() {
            [id, timestamp, label, data] => (*id, *timestamp, *label, *data),
            _ => return Err(CoreError::parse(line, "expected 4 comma-separated fields")),
        }
    };

    let patient_id: PatientId = id
        .parse()
        .map_err(|_| CoreError::parse(line, format!("invalid patient id {id:?}")))?;
    let timestamp: TimestampMs = timestamp
        .parse()
        .map_err(|_| CoreError::parse(line, format!("invalid timestamp {timestamp:?}")))?;
    let vital = VitalType::from_label(label)
        .ok_or_else(|| CoreError::parse(line, format!("unknown label {label:?}")))?;
    let value = parse_value(vital, data).ok_or_else(|| {
        CoreError::parse(line, format!("invalid data {data:?} for {}", vital.label()))
    })?;

    Ok(Reading::new(patient_id, vital, value, timestamp))
}

fn parse_value(vital: VitalType, data: &str) -> Option<f64> {
    if vital == VitalType::AlertMarker {
        match data {
            "triggered" => return Some(ALERT_TRIGGERED_VALUE),
            "resolved" => return Some(ALERT_RESOLVED_VALUE),
            _ => {}
        }
    }
    let numeric = data.strip_suffix('%').unwrap_or(data);
    numeric.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
