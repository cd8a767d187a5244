use crate::types::PatientId;

/// Domain errors shared by every crate in the workspace.
///
/// None of these is fatal to the process: callers log and continue.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// An inbound wire line could not be decoded.
    #[error("Malformed line {line:?}: {reason}")]
    Parse { line: String, reason: String },

    /// The patient id is not tracked by the component that was asked.
    #[error("Patient {0} not found")]
    UnknownPatient(PatientId),

    /// Rule evaluation for one patient failed.
    #[error("Evaluation failed for patient {patient_id}: {reason}")]
    Evaluation {
        patient_id: PatientId,
        reason: String,
    },

    /// Delivery to a subscriber or external channel failed.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl CoreError {
    pub(crate) fn parse(line: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}
