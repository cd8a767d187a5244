use std::sync::atomic::{AtomicU64, Ordering};

use cardio_core::alert::AlertEvent;
use cardio_core::error::CoreError;

use crate::delivery::AlertNotifier;

/// Upper bound on a single SMS body.
pub const MAX_SMS_LEN: usize = 160;

/// SMS alert notification. Log-only, like [`EmailNotifier`](super::EmailNotifier).
#[derive(Default)]
pub struct SmsNotifier {
    sent: AtomicU64,
}

impl SmsNotifier {
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

/// One-line SMS body, truncated to [`MAX_SMS_LEN`] characters.
pub fn sms_body(alert: &AlertEvent) -> String {
    let body = format!(
        "ALERT patient {}: {} at {}",
        alert.patient_id, alert.condition, alert.timestamp
    );
    body.chars().take(MAX_SMS_LEN).collect()
}

impl AlertNotifier for SmsNotifier {
    fn channel(&self) -> &'static str {
        "sms"
    }

    fn notify(&self, alert: &AlertEvent) -> Result<(), CoreError> {
        tracing::debug!(body = %sms_body(alert), "SMS notification skipped (delivery disabled)");
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
