use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::CoreError;
use crate::generators::{GeneratorKind, PatientDataGenerator};
use crate::reading::{Reading, VitalType};
use crate::types::{PatientId, TimestampMs};

pub const SATURATION_RANGE: (i32, i32) = (90, 100);

/// Random walk of blood oxygen saturation in whole percent.
pub struct SaturationGenerator {
    last: HashMap<PatientId, i32>,
    rng: StdRng,
}

impl SaturationGenerator {
    /// Baseline 95..=100.
    pub fn new(patients: &[PatientId], mut rng: StdRng) -> Self {
        let last = patients
            .iter()
            .map(|&id| (id, 95 + rng.random_range(0..6)))
            .collect();
        Self { last, rng }
    }
}

impl PatientDataGenerator for SaturationGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::BloodSaturation
    }

    fn generate(
        &mut self,
        patient_id: PatientId,
        timestamp: TimestampMs,
    ) -> Result<Vec<Reading>, CoreError> {
        let last = self
            .last
            .get_mut(&patient_id)
            .ok_or(CoreError::UnknownPatient(patient_id))?;

        *last = (*last + self.rng.random_range(-1..=1))
            .clamp(SATURATION_RANGE.0, SATURATION_RANGE.1);

        Ok(vec![Reading::new(
            patient_id,
            VitalType::Saturation,
            f64::from(*last),
            timestamp,
        )])
    }
}
