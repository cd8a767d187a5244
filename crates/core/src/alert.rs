//! Alert value types: rule-derived events and the per-patient injected state.

use serde::{Deserialize, Serialize};

use crate::condition_names::CONDITION_MANUAL_ALERT;
use crate::types::{PatientId, TimestampMs};

/// An alert produced by the evaluator. Ephemeral: published, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub patient_id: PatientId,
    /// One of the labels in [`crate::condition_names`].
    pub condition: String,
    pub timestamp: TimestampMs,
}

impl AlertEvent {
    pub fn new(patient_id: PatientId, condition: impl Into<String>, timestamp: TimestampMs) -> Self {
        Self {
            patient_id,
            condition: condition.into(),
            timestamp,
        }
    }

    /// Event emitted when a pending injected alert is drained.
    pub fn manual(state: &AlertState) -> Self {
        Self::new(state.patient_id, CONDITION_MANUAL_ALERT, state.timestamp)
    }

    pub fn is_manual(&self) -> bool {
        self.condition == CONDITION_MANUAL_ALERT
    }
}

/// Outcome of one step of the injected alert process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertTransition {
    Triggered,
    Resolved,
}

impl AlertTransition {
    /// Wire data string for an `Alert` line.
    pub fn as_str(self) -> &'static str {
        match self {
            AlertTransition::Triggered => "triggered",
            AlertTransition::Resolved => "resolved",
        }
    }
}

/// Injected-alert state for one patient.
///
/// `updated` means "changed since the evaluator last acknowledged it". The
/// evaluator emits a manual alert for `active && updated` and then calls
/// [`acknowledged`](Self::acknowledged).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    pub patient_id: PatientId,
    pub active: bool,
    pub updated: bool,
    pub timestamp: TimestampMs,
}

impl AlertState {
    /// Initial state at registration: inactive, nothing pending.
    pub fn idle(patient_id: PatientId) -> Self {
        Self {
            patient_id,
            active: false,
            updated: false,
            timestamp: 0,
        }
    }

    pub fn triggered(self, timestamp: TimestampMs) -> Self {
        Self {
            active: true,
            updated: true,
            timestamp,
            ..self
        }
    }

    pub fn resolved(self, timestamp: TimestampMs) -> Self {
        Self {
            active: false,
            updated: true,
            timestamp,
            ..self
        }
    }

    /// Clears `updated`, keeping `active` and the timestamp.
    pub fn acknowledged(self) -> Self {
        Self {
            updated: false,
            ..self
        }
    }

    /// True when the evaluator still owes a manual alert for this state.
    pub fn is_pending(&self) -> bool {
        self.active && self.updated
    }

    pub fn apply(self, transition: AlertTransition, timestamp: TimestampMs) -> Self {
        match transition {
            AlertTransition::Triggered => self.triggered(timestamp),
            AlertTransition::Resolved => self.resolved(timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_state_is_not_pending() {
        let state = AlertState::idle(4);
        assert!(!state.active);
        assert!(!state.updated);
        assert!(!state.is_pending());
    }

    #[test]
    fn trigger_then_acknowledge_clears_pending_but_stays_active() {
        let state = AlertState::idle(4).triggered(1_000);
        assert!(state.is_pending());
        assert_eq!(state.timestamp, 1_000);

        let acked = state.acknowledged();
        assert!(acked.active);
        assert!(!acked.is_pending());
        assert_eq!(acked.timestamp, 1_000);
    }

    #[test]
    fn resolved_state_is_never_pending() {
        let state = AlertState::idle(4).triggered(1_000).resolved(2_000);
        assert!(!state.active);
        assert!(state.updated);
        assert!(!state.is_pending());
    }

    #[test]
    fn manual_event_carries_state_timestamp() {
        let state = AlertState::idle(9).apply(AlertTransition::Triggered, 5_000);
        let event = AlertEvent::manual(&state);
        assert_eq!(event.patient_id, 9);
        assert_eq!(event.timestamp, 5_000);
        assert!(event.is_manual());
    }
}
