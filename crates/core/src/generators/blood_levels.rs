use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::CoreError;
use crate::generators::{GeneratorKind, PatientDataGenerator};
use crate::reading::{Reading, VitalType};
use crate::types::{PatientId, TimestampMs};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloodLevels {
    pub cholesterol: f64,
    pub white_cells: f64,
    pub red_cells: f64,
}

/// Full width of the per-tick noise band around each baseline.
const CHOLESTEROL_SPREAD: f64 = 10.0;
const WHITE_CELL_SPREAD: f64 = 1.0;
const RED_CELL_SPREAD: f64 = 0.2;

/// Cholesterol and blood cell counts as noise around a fixed per-patient
/// baseline. Baselines never drift.
pub struct BloodLevelsGenerator {
    baselines: HashMap<PatientId, BloodLevels>,
    rng: StdRng,
}

impl BloodLevelsGenerator {
    /// Baselines: cholesterol 150..200, white cells 4..10, red cells 4.5..6.
    pub fn new(patients: &[PatientId], mut rng: StdRng) -> Self {
        let baselines = patients
            .iter()
            .map(|&id| {
                let levels = BloodLevels {
                    cholesterol: 150.0 + rng.random::<f64>() * 50.0,
                    white_cells: 4.0 + rng.random::<f64>() * 6.0,
                    red_cells: 4.5 + rng.random::<f64>() * 1.5,
                };
                (id, levels)
            })
            .collect();
        Self { baselines, rng }
    }

    pub fn baseline(&self, patient_id: PatientId) -> Option<BloodLevels> {
        self.baselines.get(&patient_id).copied()
    }

    fn jitter(&mut self, spread: f64) -> f64 {
        (self.rng.random::<f64>() - 0.5) * spread
    }
}

impl PatientDataGenerator for BloodLevelsGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::BloodLevels
    }

    fn generate(
        &mut self,
        patient_id: PatientId,
        timestamp: TimestampMs,
    ) -> Result<Vec<Reading>, CoreError> {
        let base = self
            .baseline(patient_id)
            .ok_or(CoreError::UnknownPatient(patient_id))?;

        let cholesterol = base.cholesterol + self.jitter(CHOLESTEROL_SPREAD);
        let white_cells = base.white_cells + self.jitter(WHITE_CELL_SPREAD);
        let red_cells = base.red_cells + self.jitter(RED_CELL_SPREAD);

        Ok(vec![
            Reading::new(patient_id, VitalType::Cholesterol, cholesterol, timestamp),
            Reading::new(patient_id, VitalType::WhiteBloodCells, white_cells, timestamp),
            Reading::new(patient_id, VitalType::RedBloodCells, red_cells, timestamp),
        ])
    }
}
