use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_4, TAU};

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::CoreError;
use crate::generators::{GeneratorKind, PatientDataGenerator};
use crate::reading::{Reading, VitalType};
use crate::types::{PatientId, TimestampMs};

/// Peak amplitude of the additive noise term.
pub const NOISE_AMPLITUDE: f64 = 0.05;

/// Stylized ECG waveform: P wave, QRS complex and T wave as sinusoids at a
/// random heart rate, plus uniform noise.
pub struct EcgGenerator {
    last: HashMap<PatientId, f64>,
    rng: StdRng,
}

impl EcgGenerator {
    pub fn new(patients: &[PatientId], rng: StdRng) -> Self {
        Self {
            last: patients.iter().map(|&id| (id, 0.0)).collect(),
            rng,
        }
    }

    pub fn last_value(&self, patient_id: PatientId) -> Option<f64> {
        self.last.get(&patient_id).copied()
    }
}

/// Noise-free waveform at time `t` seconds for a heart rate in bpm.
pub fn waveform(heart_rate: f64, t: f64) -> f64 {
    let f = heart_rate / 60.0;
    let p_wave = 0.1 * (TAU * f * t).sin();
    let qrs_complex = 0.5 * (TAU * 3.0 * f * t).sin();
    let t_wave = 0.2 * (TAU * 2.0 * f * t + FRAC_PI_4).sin();
    p_wave + qrs_complex + t_wave
}

impl PatientDataGenerator for EcgGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Ecg
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

        let heart_rate = 60.0 + self.rng.random::<f64>() * 20.0;
        let t = timestamp as f64 / 1000.0;
        *last = waveform(heart_rate, t) + self.rng.random::<f64>() * NOISE_AMPLITUDE;

        Ok(vec![Reading::new(patient_id, VitalType::Ecg, *last, timestamp)])
    }
}
