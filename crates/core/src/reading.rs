//! Vital-sign readings, the unit of data flowing through the system.

use serde::{Deserialize, Serialize};

use crate::types::{PatientId, TimestampMs};

/// Kind of measurement carried by a [`Reading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VitalType {
    HeartRate,
    SystolicPressure,
    DiastolicPressure,
    Saturation,
    #[serde(rename = "ECG")]
    Ecg,
    Cholesterol,
    WhiteBloodCells,
    RedBloodCells,
    /// Injected manual alert marker. Value `1.0` = triggered, `0.0` = resolved.
    #[serde(rename = "Alert")]
    AlertMarker,
}

impl VitalType {
    /// Every variant, in wire-label order.
    pub const ALL: [VitalType; 9] = [
        VitalType::HeartRate,
        VitalType::Ecg,
        VitalType::SystolicPressure,
        VitalType::DiastolicPressure,
        VitalType::Saturation,
        VitalType::Cholesterol,
        VitalType::WhiteBloodCells,
        VitalType::RedBloodCells,
        VitalType::AlertMarker,
    ];

    /// Label used in the wire format.
    pub fn label(self) -> &'static str {
        match self {
            VitalType::HeartRate => "HeartRate",
            VitalType::SystolicPressure => "SystolicPressure",
            VitalType::DiastolicPressure => "DiastolicPressure",
            VitalType::Saturation => "Saturation",
            VitalType::Ecg => "ECG",
            VitalType::Cholesterol => "Cholesterol",
            VitalType::WhiteBloodCells => "WhiteBloodCells",
            VitalType::RedBloodCells => "RedBloodCells",
            VitalType::AlertMarker => "Alert",
        }
    }

    /// Inverse of [`label`](Self::label). Returns `None` for unknown labels.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl std::fmt::Display for VitalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Marker value stored for a triggered injected alert.
pub const ALERT_TRIGGERED_VALUE: f64 = 1.0;

/// Marker value stored for a resolved injected alert.
pub const ALERT_RESOLVED_VALUE: f64 = 0.0;

/// One timestamped measurement for a patient. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub patient_id: PatientId,
    #[serde(rename = "type")]
    pub vital: VitalType,
    pub value: f64,
    pub timestamp: TimestampMs,
}

impl Reading {
    pub fn new(patient_id: PatientId, vital: VitalType, value: f64, timestamp: TimestampMs) -> Self {
        Self {
            patient_id,
            vital,
            value,
            timestamp,
        }
    }

    /// True when `start <= timestamp <= end`.
    pub fn within(&self, start: TimestampMs, end: TimestampMs) -> bool {
        start <= self.timestamp && self.timestamp <= end
    }
}
