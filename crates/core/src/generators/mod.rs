//! Stateful per-patient vital-sign simulators.
//!
//! Every generator owns its per-patient state and an injected
//! [`StdRng`](rand::rngs::StdRng), so a simulation seeded the same way
//! produces the same readings for the same timestamps.

pub mod blood_levels;
pub mod blood_pressure;
pub mod ecg;
pub mod injected_alert;
pub mod saturation;

use std::fmt;

use crate::error::CoreError;
use crate::reading::Reading;
use crate::types::{PatientId, TimestampMs};

pub use blood_levels::BloodLevelsGenerator;
pub use blood_pressure::BloodPressureGenerator;
pub use ecg::EcgGenerator;
pub use injected_alert::InjectedAlertProcess;
pub use saturation::SaturationGenerator;

/// Identifies a generator for invocation accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeneratorKind {
    Ecg,
    BloodSaturation,
    BloodPressure,
    BloodLevels,
    InjectedAlert,
}

impl GeneratorKind {
    pub const COUNT: usize = 5;

    pub const ALL: [GeneratorKind; Self::COUNT] = [
        GeneratorKind::Ecg,
        GeneratorKind::BloodSaturation,
        GeneratorKind::BloodPressure,
        GeneratorKind::BloodLevels,
        GeneratorKind::InjectedAlert,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GeneratorKind::Ecg => "ecg",
            GeneratorKind::BloodSaturation => "blood_saturation",
            GeneratorKind::BloodPressure => "blood_pressure",
            GeneratorKind::BloodLevels => "blood_levels",
            GeneratorKind::InjectedAlert => "injected_alert",
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vital-sign simulator keyed by patient.
pub trait PatientDataGenerator: Send {
    fn kind(&self) -> GeneratorKind;

    /// Derive the next readings for `patient_id` at `timestamp` and advance
    /// that patient's state.
    ///
    /// Fails with [`CoreError::UnknownPatient`] for a patient the generator
    /// was not constructed with.
    fn generate(
        &mut self,
        patient_id: PatientId,
        timestamp: TimestampMs,
    ) -> Result<Vec<Reading>, CoreError>;
}
