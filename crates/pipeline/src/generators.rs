//! Per-patient ownership of the data generators.
//!
//! Every patient gets its own instance of each generator with its own RNG,
//! behind a patient-local mutex. Ticks of different patients never contend,
//! and a seeded set produces the same per-patient sequence regardless of
//! how patient ticks interleave.

use std::collections::HashMap;

use cardio_core::alert::AlertTransition;
use cardio_core::error::CoreError;
use cardio_core::generators::{
    BloodLevelsGenerator, BloodPressureGenerator, EcgGenerator, GeneratorKind,
    InjectedAlertProcess, PatientDataGenerator, SaturationGenerator,
};
use cardio_core::reading::Reading;
use cardio_core::types::{PatientId, TimestampMs};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Vital-sign generators invoked on every tick, in invocation order.
pub const VITAL_KINDS: [GeneratorKind; 4] = [
    GeneratorKind::Ecg,
    GeneratorKind::BloodSaturation,
    GeneratorKind::BloodPressure,
    GeneratorKind::BloodLevels,
];

struct PatientGenerators {
    ecg: EcgGenerator,
    saturation: SaturationGenerator,
    blood_pressure: BloodPressureGenerator,
    blood_levels: BloodLevelsGenerator,
    injected: InjectedAlertProcess,
}

impl PatientGenerators {
    fn new(patient_id: PatientId, root: &mut StdRng) -> Self {
        let mut child = || StdRng::seed_from_u64(root.random::<u64>());
        let patient = [patient_id];
        Self {
            ecg: EcgGenerator::new(&patient, child()),
            saturation: SaturationGenerator::new(&patient, child()),
            blood_pressure: BloodPressureGenerator::new(&patient, child()),
            blood_levels: BloodLevelsGenerator::new(&patient, child()),
            injected: InjectedAlertProcess::new(child()),
        }
    }
}

pub struct GeneratorSet {
    patients: HashMap<PatientId, Mutex<PatientGenerators>>,
}

impl GeneratorSet {
    /// Reproducible set: every patient's generators get child seeds drawn
    /// from `seed`, in the order `patients` lists them.
    pub fn seeded(seed: u64, patients: &[PatientId]) -> Self {
        Self::from_rng(&mut StdRng::seed_from_u64(seed), patients)
    }

    pub fn from_entropy(patients: &[PatientId]) -> Self {
        Self::from_rng(&mut StdRng::from_os_rng(), patients)
    }

    fn from_rng(root: &mut StdRng, patients: &[PatientId]) -> Self {
        Self {
            patients: patients
                .iter()
                .map(|&id| (id, Mutex::new(PatientGenerators::new(id, &mut *root))))
                .collect(),
        }
    }

    fn patient(&self, patient_id: PatientId) -> Result<&Mutex<PatientGenerators>, CoreError> {
        self.patients
            .get(&patient_id)
            .ok_or(CoreError::UnknownPatient(patient_id))
    }

    /// Run one vital-sign generator.
    ///
    /// `GeneratorKind::InjectedAlert` produces no readings; use
    /// [`injected_step`](Self::injected_step) for it.
    pub fn generate(
        &self,
        kind: GeneratorKind,
        patient_id: PatientId,
        timestamp: TimestampMs,
    ) -> Result<Vec<Reading>, CoreError> {
        let mut generators = self.patient(patient_id)?.lock();
        match kind {
            GeneratorKind::Ecg => generators.ecg.generate(patient_id, timestamp),
            GeneratorKind::BloodSaturation => generators.saturation.generate(patient_id, timestamp),
            GeneratorKind::BloodPressure => {
                generators.blood_pressure.generate(patient_id, timestamp)
            }
            GeneratorKind::BloodLevels => generators.blood_levels.generate(patient_id, timestamp),
            GeneratorKind::InjectedAlert => Ok(Vec::new()),
        }
    }

    /// Advance one patient's injected alert process.
    pub fn injected_step(
        &self,
        patient_id: PatientId,
        active: bool,
    ) -> Result<Option<AlertTransition>, CoreError> {
        Ok(self.patient(patient_id)?.lock().injected.step(active))
    }
}
