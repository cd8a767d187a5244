//! Email alert notification.
//!
//! No mail is sent: delivery is recorded in the log only.

use std::sync::atomic::{AtomicU64, Ordering};

use cardio_core::alert::AlertEvent;
use cardio_core::error::CoreError;
use cardio_core::wire;

use crate::delivery::AlertNotifier;

const DEFAULT_RECIPIENT: &str = "ward-staff@cardio.local";

pub struct EmailNotifier {
    recipient: String,
    sent: AtomicU64,
}

impl EmailNotifier {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            sent: AtomicU64::new(0),
        }
    }

    /// Number of alerts "sent" so far.
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    fn subject(alert: &AlertEvent) -> String {
        format!("[cardio] {} (patient {})", alert.condition, alert.patient_id)
    }
}

impl Default for EmailNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_RECIPIENT)
    }
}

impl AlertNotifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    fn notify(&self, alert: &AlertEvent) -> Result<(), CoreError> {
        if self.recipient.is_empty() {
            return Err(CoreError::Transport("email recipient is empty".to_string()));
        }
        tracing::debug!(
            to = %self.recipient,
            subject = %Self::subject(alert),
            body = %wire::render_alert(alert),
            "Email notification skipped (delivery disabled)",
        );
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
