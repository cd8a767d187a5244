//! Injected-alert state per patient.
//!
//! The registry is populated once from the known patient set and never
//! grows. Every transition replaces a whole [`AlertState`] under the write
//! lock, and readers only ever receive copies.

use std::collections::{BTreeMap, HashMap};

use cardio_core::alert::{AlertState, AlertTransition};
use cardio_core::error::CoreError;
use cardio_core::types::{PatientId, TimestampMs};
use parking_lot::RwLock;

pub struct ActiveAlertRegistry {
    states: RwLock<HashMap<PatientId, AlertState>>,
}

impl ActiveAlertRegistry {
    /// Register every patient in `patients` with an idle state.
    pub fn new(patients: impl IntoIterator<Item = PatientId>) -> Self {
        let states = patients
            .into_iter()
            .map(|id| (id, AlertState::idle(id)))
            .collect();
        Self {
            states: RwLock::new(states),
        }
    }

    /// Replace a patient's state wholesale.
    ///
    /// A no-op (logged) for a patient that was never registered.
    pub fn update(&self, patient_id: PatientId, updated: bool, active: bool, timestamp: TimestampMs) {
        let mut states = self.states.write();
        match states.get_mut(&patient_id) {
            Some(state) => {
                *state = AlertState {
                    patient_id,
                    active,
                    updated,
                    timestamp,
                };
            }
            None => {
                tracing::warn!(patient_id, "Alert state update ignored: patient not found");
            }
        }
    }

    pub fn get(&self, patient_id: PatientId) -> Result<AlertState, CoreError> {
        self.states
            .read()
            .get(&patient_id)
            .copied()
            .ok_or(CoreError::UnknownPatient(patient_id))
    }

    pub fn is_active(&self, patient_id: PatientId) -> bool {
        self.get(patient_id).is_ok_and(|s| s.active)
    }

    /// Apply a transition and return the new state.
    pub fn transition(
        &self,
        patient_id: PatientId,
        transition: AlertTransition,
        timestamp: TimestampMs,
    ) -> Result<AlertState, CoreError> {
        let mut states = self.states.write();
        let state = states
            .get_mut(&patient_id)
            .ok_or(CoreError::UnknownPatient(patient_id))?;
        *state = state.apply(transition, timestamp);
        Ok(*state)
    }

    pub fn mark_triggered(&self, patient_id: PatientId, timestamp: TimestampMs) -> Result<AlertState, CoreError> {
        self.transition(patient_id, AlertTransition::Triggered, timestamp)
    }

    pub fn mark_resolved(&self, patient_id: PatientId, timestamp: TimestampMs) -> Result<AlertState, CoreError> {
        self.transition(patient_id, AlertTransition::Resolved, timestamp)
    }

    /// If the patient's alert is `active && updated`, clear `updated` and
    /// return the state as it was. Check and clear happen under one lock so
    /// a pending alert is handed out at most once.
    pub fn acknowledge(&self, patient_id: PatientId) -> Option<AlertState> {
        let mut states = self.states.write();
        let state = states.get_mut(&patient_id)?;
        if !state.is_pending() {
            return None;
        }
        let pending = *state;
        *state = pending.acknowledged();
        Some(pending)
    }

    /// Acknowledge every pending alert, sorted by patient id.
    pub fn drain_pending(&self) -> Vec<AlertState> {
        let mut states = self.states.write();
        let mut drained: Vec<AlertState> = states
            .values_mut()
            .filter(|s| s.is_pending())
            .map(|s| {
                let pending = *s;
                *s = pending.acknowledged();
                pending
            })
            .collect();
        drained.sort_by_key(|s| s.patient_id);
        drained
    }

    /// Copy of every state, keyed and ordered by patient id.
    pub fn snapshot(&self) -> BTreeMap<PatientId, AlertState> {
        self.states
            .read()
            .iter()
            .map(|(id, state)| (*id, *state))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn registered_patients_start_idle() {
        let registry = ActiveAlertRegistry::new(1..=3);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(2), Ok(AlertState::idle(2)));
    }

    #[test]
    fn unknown_patient_is_not_found() {
        let registry = ActiveAlertRegistry::new([1]);
        assert_matches!(registry.get(5), Err(CoreError::UnknownPatient(5)));
        assert_matches!(registry.mark_triggered(5, 10), Err(CoreError::UnknownPatient(5)));
        assert_eq!(registry.acknowledge(5), None);
        assert!(!registry.is_active(5));
    }

    #[test]
    fn update_on_unknown_patient_is_a_no_op() {
        let registry = ActiveAlertRegistry::new([1, 2]);
        registry.update(99, true, true, 1_000);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(99).is_err());
        assert!(registry.snapshot().values().all(|s| *s == AlertState::idle(s.patient_id)));
    }

    #[test]
    fn update_replaces_the_whole_state() {
        let registry = ActiveAlertRegistry::new([1]);
        registry.update(1, true, true, 50);
        assert_eq!(
            registry.get(1),
            Ok(AlertState {
                patient_id: 1,
                active: true,
                updated: true,
                timestamp: 50,
            })
        );
    }

    #[test]
    fn acknowledge_hands_out_a_pending_alert_once() {
        let registry = ActiveAlertRegistry::new([1]);
        registry.mark_triggered(1, 100).expect("registered");

        let pending = registry.acknowledge(1).expect("pending alert");
        assert_eq!(pending.timestamp, 100);
        assert_eq!(registry.acknowledge(1), None);

        let state = registry.get(1).expect("registered");
        assert!(state.active);
        assert!(!state.updated);
    }

    #[test]
    fn resolved_alerts_are_not_drained() {
        let registry = ActiveAlertRegistry::new([1, 2, 3]);
        registry.mark_triggered(3, 10).expect("registered");
        registry.mark_triggered(1, 10).expect("registered");
        registry.mark_triggered(2, 10).expect("registered");
        registry.mark_resolved(2, 20).expect("registered");

        let ids: Vec<PatientId> = registry.drain_pending().iter().map(|s| s.patient_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(registry.drain_pending().is_empty());
    }

    #[test]
    fn snapshot_is_a_copy() {
        let registry = ActiveAlertRegistry::new([1]);
        let before = registry.snapshot();
        registry.mark_triggered(1, 10).expect("registered");
        assert!(!before[&1].active);
        assert!(registry.snapshot()[&1].active);
    }
}
