use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::CoreError;
use crate::generators::{GeneratorKind, PatientDataGenerator};
use crate::reading::{Reading, VitalType};
use crate::types::{PatientId, TimestampMs};

pub const SYSTOLIC_RANGE: (i32, i32) = (90, 180);
pub const DIASTOLIC_RANGE: (i32, i32) = (60, 120);

/// Random walk of systolic/diastolic pressure, clamped to a safe range.
pub struct BloodPressureGenerator {
    last: HashMap<PatientId, (i32, i32)>,
    rng: StdRng,
}

impl BloodPressureGenerator {
    /// Baselines: systolic 110..130, diastolic 70..85.
    pub fn new(patients: &[PatientId], mut rng: StdRng) -> Self {
        let last = patients
            .iter()
            .map(|&id| (id, (110 + rng.random_range(0..20), 70 + rng.random_range(0..15))))
            .collect();
        Self { last, rng }
    }

    /// Last `(systolic, diastolic)` emitted (or the baseline) for a patient.
    pub fn last_values(&self, patient_id: PatientId) -> Option<(i32, i32)> {
        self.last.get(&patient_id).copied()
    }
}

impl PatientDataGenerator for BloodPressureGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::BloodPressure
    }

    fn generate(
        &mut self,
        patient_id: PatientId,
        timestamp: TimestampMs,
    ) -> Result<Vec<Reading>, CoreError> {
        let (systolic, diastolic) = self
            .last
            .get(&patient_id)
            .copied()
            .ok_or(CoreError::UnknownPatient(patient_id))?;

        let systolic = (systolic + self.rng.random_range(-2..=2))
            .clamp(SYSTOLIC_RANGE.0, SYSTOLIC_RANGE.1);
        let diastolic = (diastolic + self.rng.random_range(-2..=2))
            .clamp(DIASTOLIC_RANGE.0, DIASTOLIC_RANGE.1);
        self.last.insert(patient_id, (systolic, diastolic));

        Ok(vec![
            Reading::new(
                patient_id,
                VitalType::SystolicPressure,
                f64::from(systolic),
                timestamp,
            ),
            Reading::new(
                patient_id,
                VitalType::DiastolicPressure,
                f64::from(diastolic),
                timestamp,
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn baselines_fall_in_documented_ranges() {
        let patients: Vec<PatientId> = (1..=200).collect();
        let generator = BloodPressureGenerator::new(&patients, StdRng::seed_from_u64(7));
        for id in patients {
            let (s, d) = generator.last_values(id).expect("patient registered");
            assert!((110..130).contains(&s), "systolic baseline {s}");
            assert!((70..85).contains(&d), "diastolic baseline {d}");
        }
    }

    #[test]
    fn output_stays_clamped_after_many_ticks() {
        for seed in 0..20 {
            let mut generator = BloodPressureGenerator::new(&[1], StdRng::seed_from_u64(seed));
            for tick in 0..2_000 {
                let readings = generator.generate(1, tick).expect("known patient");
                let [s, d] = [readings[0].value, readings[1].value];
                assert!((90.0..=180.0).contains(&s), "seed {seed} tick {tick}: systolic {s}");
                assert!((60.0..=120.0).contains(&d), "seed {seed} tick {tick}: diastolic {d}");
            }
        }
    }

    #[test]
    fn each_step_moves_at_most_two() {
        let mut generator = BloodPressureGenerator::new(&[1], StdRng::seed_from_u64(3));
        let mut prev = generator.last_values(1).expect("registered");
        for tick in 0..500 {
            generator.generate(1, tick).expect("known patient");
            let next = generator.last_values(1).expect("registered");
            assert!((next.0 - prev.0).abs() <= 2);
            assert!((next.1 - prev.1).abs() <= 2);
            prev = next;
        }
    }

    #[test]
    fn unknown_patient_is_an_error() {
        let mut generator = BloodPressureGenerator::new(&[1, 2], StdRng::seed_from_u64(0));
        assert_matches!(generator.generate(3, 0), Err(CoreError::UnknownPatient(3)));
    }
}
