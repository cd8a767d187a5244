//! Data-driven alert rule table.
//!
//! Every rule is a pure function over a [`RuleContext`] (a patient's recent
//! readings plus "now") tagged with a fixed condition label. The caller is
//! responsible for fetching the readings; nothing here touches shared state.

pub mod thresholds;
pub mod windows;

use crate::alert::AlertEvent;
use crate::condition_names::*;
use crate::error::CoreError;
use crate::reading::{Reading, VitalType};
use crate::types::{PatientId, TimestampMs, HOUR_MS, MINUTE_MS};

/// Largest lookback any rule needs, used only by the generic heart-rate check.
pub const MAX_LOOKBACK_MS: TimestampMs = 24 * HOUR_MS;

/// Lookback covering every rule except the generic heart-rate check.
///
/// Callers fetch `[now - RULE_WINDOW_MS, now]` plus the latest heart-rate
/// reading in `[now - MAX_LOOKBACK_MS, now]`.
pub const RULE_WINDOW_MS: TimestampMs = 10 * MINUTE_MS;

/// Default maximum difference between adjacent ECG readings.
pub const IRREGULAR_BEAT_THRESHOLD: f64 = 5.0;

/// How a rule treats a reading type that is absent from its window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingDataPolicy {
    /// Absent readings count as `0.0`.
    #[default]
    Sentinel,
    /// Absent readings make the rule unable to fire.
    Strict,
}

/// Tunables shared by all rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleConfig {
    pub missing_data: MissingDataPolicy,
    pub irregular_beat_threshold: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            missing_data: MissingDataPolicy::Sentinel,
            irregular_beat_threshold: IRREGULAR_BEAT_THRESHOLD,
        }
    }
}

// ---------------------------------------------------------------------------
// RuleContext
// ---------------------------------------------------------------------------

/// Readings for one patient (in arrival order) as seen at `now`.
pub struct RuleContext<'a> {
    readings: &'a [Reading],
    now: TimestampMs,
    config: &'a RuleConfig,
}

impl<'a> RuleContext<'a> {
    pub fn new(readings: &'a [Reading], now: TimestampMs, config: &'a RuleConfig) -> Self {
        Self {
            readings,
            now,
            config,
        }
    }

    pub fn now(&self) -> TimestampMs {
        self.now
    }

    pub fn config(&self) -> &RuleConfig {
        self.config
    }

    /// Readings with `start <= timestamp <= end`, in arrival order.
    pub fn window(&self, start: TimestampMs, end: TimestampMs) -> Vec<&'a Reading> {
        self.readings.iter().filter(|r| r.within(start, end)).collect()
    }

    /// Readings in the last `span` milliseconds, `now` inclusive.
    pub fn lookback(&self, span: TimestampMs) -> Vec<&'a Reading> {
        self.window(self.now - span, self.now)
    }

    /// Value of a type's latest reading in `window`, after applying the
    /// missing-data policy. `None` means the rule cannot use this series.
    pub fn latest_value(&self, window: &[&Reading], vital: VitalType) -> Option<f64> {
        let latest = latest_of(window, vital).map(|r| r.value);
        match self.config.missing_data {
            MissingDataPolicy::Sentinel => Some(latest.unwrap_or(0.0)),
            MissingDataPolicy::Strict => latest,
        }
    }
}

/// Last reading of `vital` in arrival order.
pub fn latest_of<'r>(window: &[&'r Reading], vital: VitalType) -> Option<&'r Reading> {
    window.iter().rev().find(|r| r.vital == vital).copied()
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// A condition label and the check that decides it.
///
/// `check` returns the timestamp to stamp on the alert when the rule fires.
pub struct Rule {
    pub condition: &'static str,
    pub check: fn(&RuleContext<'_>) -> Option<TimestampMs>,
}

/// Every rule, evaluated independently for each patient.
pub static RULES: &[Rule] = &[
    Rule {
        condition: CONDITION_SYSTOLIC_CRITICAL,
        check: thresholds::check_systolic,
    },
    Rule {
        condition: CONDITION_DIASTOLIC_CRITICAL,
        check: thresholds::check_diastolic,
    },
    Rule {
        condition: CONDITION_LOW_SATURATION,
        check: thresholds::check_saturation,
    },
    Rule {
        condition: CONDITION_ABNORMAL_ECG,
        check: thresholds::check_ecg,
    },
    Rule {
        condition: CONDITION_ABNORMAL_HEART_RATE,
        check: thresholds::check_heart_rate,
    },
    Rule {
        condition: CONDITION_PRESSURE_TREND,
        check: windows::check_pressure_trend,
    },
    Rule {
        condition: CONDITION_RAPID_DESATURATION,
        check: windows::check_rapid_desaturation,
    },
    Rule {
        condition: CONDITION_HYPOTENSIVE_HYPOXEMIA,
        check: windows::check_hypotensive_hypoxemia,
    },
    Rule {
        condition: CONDITION_IRREGULAR_RHYTHM,
        check: windows::check_irregular_rhythm,
    },
];

/// Run the whole rule table for one patient.
///
/// Fails when the context contains a non-finite value, since no rule can be
/// evaluated meaningfully over it.
pub fn evaluate(patient_id: PatientId, ctx: &RuleContext<'_>) -> Result<Vec<AlertEvent>, CoreError> {
    if let Some(bad) = ctx.readings.iter().find(|r| !r.value.is_finite()) {
        return Err(CoreError::Evaluation {
            patient_id,
            reason: format!(
                "non-finite {} value at timestamp {}",
                bad.vital.label(),
                bad.timestamp
            ),
        });
    }

    Ok(RULES
        .iter()
        .filter_map(|rule| (rule.check)(ctx).map(|ts| AlertEvent::new(patient_id, rule.condition, ts)))
        .collect())
}
