//! Single-value threshold rules.
//!
//! Each rule inspects the most recent reading of one type inside its
//! lookback window and fires with that reading's timestamp.

use crate::reading::VitalType;
use crate::rules::{latest_of, RuleContext};
use crate::types::{TimestampMs, HOUR_MS, MINUTE_MS};

/// Lookback for the vital-specific checks.
pub const VITAL_LOOKBACK_MS: TimestampMs = MINUTE_MS;

/// Lookback for the generic heart-rate checker.
pub const GENERIC_LOOKBACK_MS: TimestampMs = 24 * HOUR_MS;

pub fn systolic_out_of_range(value: f64) -> bool {
    value > 180.0 || value < 90.0
}

pub fn diastolic_out_of_range(value: f64) -> bool {
    value > 120.0 || value < 60.0
}

pub fn saturation_low(value: f64) -> bool {
    value < 92.0
}

/// Shared by the ECG and heart-rate checks.
pub fn rate_out_of_range(value: f64) -> bool {
    value < 50.0 || value > 100.0
}

fn check_latest(
    ctx: &RuleContext<'_>,
    vital: VitalType,
    lookback: TimestampMs,
    predicate: fn(f64) -> bool,
) -> Option<TimestampMs> {
    let window = ctx.lookback(lookback);
    latest_of(&window, vital)
        .filter(|r| predicate(r.value))
        .map(|r| r.timestamp)
}

pub(crate) fn check_systolic(ctx: &RuleContext<'_>) -> Option<TimestampMs> {
    check_latest(
        ctx,
        VitalType::SystolicPressure,
        VITAL_LOOKBACK_MS,
        systolic_out_of_range,
    )
}

pub(crate) fn check_diastolic(ctx: &RuleContext<'_>) -> Option<TimestampMs> {
    check_latest(
        ctx,
        VitalType::DiastolicPressure,
        VITAL_LOOKBACK_MS,
        diastolic_out_of_range,
    )
}

pub(crate) fn check_saturation(ctx: &RuleContext<'_>) -> Option<TimestampMs> {
    check_latest(ctx, VitalType::Saturation, VITAL_LOOKBACK_MS, saturation_low)
}

pub(crate) fn check_ecg(ctx: &RuleContext<'_>) -> Option<TimestampMs> {
    check_latest(ctx, VitalType::Ecg, VITAL_LOOKBACK_MS, rate_out_of_range)
}

pub(crate) fn check_heart_rate(ctx: &RuleContext<'_>) -> Option<TimestampMs> {
    check_latest(
        ctx,
        VitalType::HeartRate,
        GENERIC_LOOKBACK_MS,
        rate_out_of_range,
    )
}
