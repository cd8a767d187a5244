//! Alert evaluation against the shared store and registry.
//!
//! The evaluator keeps no state of its own. Each patient pass fetches the
//! last ten minutes of readings plus the latest heart-rate reading of the
//! last day, and hands them to the pure rule table in `cardio_core::rules`.

use std::sync::Arc;

use cardio_core::alert::AlertEvent;
use cardio_core::error::CoreError;
use cardio_core::reading::VitalType;
use cardio_core::rules::{self, RuleConfig, RuleContext, MAX_LOOKBACK_MS, RULE_WINDOW_MS};
use cardio_core::types::{PatientId, TimestampMs};
use cardio_store::{ActiveAlertRegistry, TimeSeriesStore};

#[derive(Debug, Clone, Default)]
pub struct EvaluatorConfig {
    pub rules: RuleConfig,
}

pub struct AlertEvaluator {
    store: Arc<TimeSeriesStore>,
    registry: Arc<ActiveAlertRegistry>,
    config: EvaluatorConfig,
}

impl AlertEvaluator {
    pub fn new(
        store: Arc<TimeSeriesStore>,
        registry: Arc<ActiveAlertRegistry>,
        config: EvaluatorConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    /// Rule-derived alerts for one patient as of `now`.
    pub fn evaluate_patient(
        &self,
        patient_id: PatientId,
        now: TimestampMs,
    ) -> Result<Vec<AlertEvent>, CoreError> {
        let window_start = now.saturating_sub(RULE_WINDOW_MS);
        let mut readings = self.store.query(patient_id, window_start, now);
        // The heart-rate check keeps a day of lookback. Its latest reading is
        // already last among heart-rate readings when inside the window.
        let heart_rate = self.store.latest(
            patient_id,
            VitalType::HeartRate,
            now.saturating_sub(MAX_LOOKBACK_MS),
            now,
        );
        if let Some(reading) = heart_rate.filter(|r| r.timestamp < window_start) {
            readings.push(reading);
        }
        let ctx = RuleContext::new(&readings, now, &self.config.rules);
        rules::evaluate(patient_id, &ctx)
    }

    /// Manual alert for one patient if its injected alert is pending.
    pub fn drain_manual_alert(&self, patient_id: PatientId) -> Option<AlertEvent> {
        self.registry
            .acknowledge(patient_id)
            .map(|state| AlertEvent::manual(&state))
    }

    /// Manual alerts for every pending patient, ordered by patient id.
    pub fn drain_manual_alerts(&self) -> Vec<AlertEvent> {
        self.registry
            .drain_pending()
            .iter()
            .map(AlertEvent::manual)
            .collect()
    }

    /// One scheduler pass for a single patient: rules, then that patient's
    /// pending manual alert. Evaluation errors are logged and yield no rule
    /// alerts.
    pub fn evaluate_tick(&self, patient_id: PatientId, now: TimestampMs) -> Vec<AlertEvent> {
        let mut alerts = self.evaluate_or_log(patient_id, now);
        alerts.extend(self.drain_manual_alert(patient_id));
        alerts
    }

    /// Every patient in the store, then every pending manual alert.
    ///
    /// A patient whose evaluation fails is logged and skipped.
    pub fn evaluate_all(&self, now: TimestampMs) -> Vec<AlertEvent> {
        let mut alerts: Vec<AlertEvent> = self
            .store
            .list_patients()
            .into_iter()
            .flat_map(|patient_id| self.evaluate_or_log(patient_id, now))
            .collect();
        alerts.extend(self.drain_manual_alerts());
        alerts
    }

    fn evaluate_or_log(&self, patient_id: PatientId, now: TimestampMs) -> Vec<AlertEvent> {
        match self.evaluate_patient(patient_id, now) {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::error!(patient_id, error = %e, "Alert evaluation failed");
                Vec::new()
            }
        }
    }
}
