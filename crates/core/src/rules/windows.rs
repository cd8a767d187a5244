//! Multi-reading rules over sliding time windows.
//!
//! All of these fire with the evaluation time (`now`) as the alert timestamp.

use crate::reading::{Reading, VitalType};
use crate::rules::RuleContext;
use crate::types::{TimestampMs, MINUTE_MS};

/// Width of each of the three trend windows.
pub const TREND_WINDOW_MS: TimestampMs = MINUTE_MS;

/// Minimum per-window delta for the trend rule.
pub const TREND_DELTA: f64 = 10.0;

pub const DESATURATION_LOOKBACK_MS: TimestampMs = 10 * MINUTE_MS;

/// Percent drop that counts as rapid desaturation.
pub const DESATURATION_DROP_PERCENT: f64 = 5.0;

pub const HYPOTENSIVE_LOOKBACK_MS: TimestampMs = MINUTE_MS;
pub const HYPOTENSIVE_SYSTOLIC_BELOW: f64 = 90.0;
pub const HYPOXEMIA_SATURATION_BELOW: f64 = 92.0;

pub const RHYTHM_LOOKBACK_MS: TimestampMs = 5 * MINUTE_MS;

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

/// Trend comparison over the latest value of three windows, newest first.
///
/// The decreasing clause compares against `+TREND_DELTA` rather than
/// `-TREND_DELTA`, so it also holds for flat and slowly moving series and
/// only fails when the series falls by the full delta in both steps.
pub fn trend_detected([newest, middle, oldest]: [f64; 3]) -> bool {
    let increasing = newest - middle > TREND_DELTA && middle - oldest > TREND_DELTA;
    let decreasing = middle - newest < TREND_DELTA && oldest - middle < TREND_DELTA;
    increasing || decreasing
}

/// Three consecutive, non-overlapping windows ending at `now`, newest first:
/// `(now-1m, now]`, `(now-2m, now-1m]`, `(now-3m, now-2m]`.
fn trend_windows<'a>(ctx: &RuleContext<'a>) -> [Vec<&'a Reading>; 3] {
    let now = ctx.now();
    [0, 1, 2].map(|i| {
        let end = now - i * TREND_WINDOW_MS;
        ctx.window(end - TREND_WINDOW_MS + 1, end)
    })
}

pub(crate) fn check_pressure_trend(ctx: &RuleContext<'_>) -> Option<TimestampMs> {
    let windows = trend_windows(ctx);
    if windows.iter().any(Vec::is_empty) {
        return None;
    }

    let series = |vital: VitalType| -> Option<[f64; 3]> {
        let [a, b, c] = &windows;
        Some([
            ctx.latest_value(a, vital)?,
            ctx.latest_value(b, vital)?,
            ctx.latest_value(c, vital)?,
        ])
    };

    let fired = [VitalType::SystolicPressure, VitalType::DiastolicPressure]
        .into_iter()
        .filter_map(series)
        .any(trend_detected);

    fired.then_some(ctx.now())
}

// ---------------------------------------------------------------------------
// Rapid desaturation
// ---------------------------------------------------------------------------

/// Percent drop from `first` to `last`; `None` when `first` is not positive.
pub fn percent_drop(first: f64, last: f64) -> Option<f64> {
    (first > 0.0).then(|| (first - last) / first * 100.0)
}

pub(crate) fn check_rapid_desaturation(ctx: &RuleContext<'_>) -> Option<TimestampMs> {
    let window = ctx.lookback(DESATURATION_LOOKBACK_MS);
    let mut saturation = window.iter().filter(|r| r.vital == VitalType::Saturation);

    let first = saturation.next()?;
    let last = saturation.last()?;

    let drop = percent_drop(first.value, last.value)?;
    (drop >= DESATURATION_DROP_PERCENT).then_some(ctx.now())
}

// ---------------------------------------------------------------------------
// Hypotensive hypoxemia
// ---------------------------------------------------------------------------

pub(crate) fn check_hypotensive_hypoxemia(ctx: &RuleContext<'_>) -> Option<TimestampMs> {
    let window = ctx.lookback(HYPOTENSIVE_LOOKBACK_MS);
    if window.is_empty() {
        return None;
    }

    let systolic = ctx.latest_value(&window, VitalType::SystolicPressure)?;
    let saturation = ctx.latest_value(&window, VitalType::Saturation)?;

    (systolic < HYPOTENSIVE_SYSTOLIC_BELOW && saturation < HYPOXEMIA_SATURATION_BELOW)
        .then_some(ctx.now())
}

// ---------------------------------------------------------------------------
// Irregular rhythm
// ---------------------------------------------------------------------------

pub(crate) fn check_irregular_rhythm(ctx: &RuleContext<'_>) -> Option<TimestampMs> {
    let threshold = ctx.config().irregular_beat_threshold;
    let beats: Vec<f64> = ctx
        .lookback(RHYTHM_LOOKBACK_MS)
        .into_iter()
        .filter(|r| r.vital == VitalType::Ecg)
        .map(|r| r.value)
        .collect();

    beats
        .windows(2)
        .any(|pair| (pair[0] - pair[1]).abs() > threshold)
        .then_some(ctx.now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{MissingDataPolicy, RuleConfig};
    use crate::types::SECOND_MS;

    const NOW: TimestampMs = 1_700_000_000_000;
    const P: i64 = 1;

    fn sys(value: f64, ts: TimestampMs) -> Reading {
        Reading::new(P, VitalType::SystolicPressure, value, ts)
    }

    fn dia(value: f64, ts: TimestampMs) -> Reading {
        Reading::new(P, VitalType::DiastolicPressure, value, ts)
    }

    fn sat(value: f64, ts: TimestampMs) -> Reading {
        Reading::new(P, VitalType::Saturation, value, ts)
    }

    fn ecg(value: f64, ts: TimestampMs) -> Reading {
        Reading::new(P, VitalType::Ecg, value, ts)
    }

    fn strict() -> RuleConfig {
        RuleConfig {
            missing_data: MissingDataPolicy::Strict,
            ..RuleConfig::default()
        }
    }

    fn run_with(
        config: &RuleConfig,
        check: fn(&RuleContext<'_>) -> Option<TimestampMs>,
        readings: &[Reading],
    ) -> Option<TimestampMs> {
        check(&RuleContext::new(readings, NOW, config))
    }

    fn run(check: fn(&RuleContext<'_>) -> Option<TimestampMs>, readings: &[Reading]) -> Option<TimestampMs> {
        run_with(&RuleConfig::default(), check, readings)
    }

    // -- trend ---------------------------------------------------------------

    #[test]
    fn rising_systolic_fires_trend() {
        let readings = [
            sys(100.0, NOW - 150 * SECOND_MS),
            sys(115.0, NOW - 90 * SECOND_MS),
            sys(130.0, NOW - 30 * SECOND_MS),
        ];
        assert_eq!(run(check_pressure_trend, &readings), Some(NOW));
        assert_eq!(run_with(&strict(), check_pressure_trend, &readings), Some(NOW));
    }

    #[test]
    fn trend_needs_every_window_populated() {
        let readings = [sys(100.0, NOW - 150 * SECOND_MS), sys(130.0, NOW - 30 * SECOND_MS)];
        assert_eq!(run(check_pressure_trend, &readings), None);
    }

    #[test]
    fn trend_decreasing_clause_holds_for_flat_series() {
        assert!(trend_detected([120.0, 120.0, 120.0]));
        assert!(trend_detected([130.0, 115.0, 100.0]));
        // Falling by more than the delta at each step does not match.
        assert!(!trend_detected([100.0, 115.0, 130.0]));
    }

    #[test]
    fn strict_trend_skips_a_series_missing_from_a_window() {
        // Diastolic missing everywhere and systolic missing from the middle
        // window. The sentinel series for diastolic is flat zeros.
        let readings = [
            sys(130.0, NOW - 150 * SECOND_MS),
            Reading::new(P, VitalType::Cholesterol, 180.0, NOW - 90 * SECOND_MS),
            sys(130.0, NOW - 30 * SECOND_MS),
        ];
        assert_eq!(run_with(&strict(), check_pressure_trend, &readings), None);
        assert_eq!(run(check_pressure_trend, &readings), Some(NOW));
    }

    #[test]
    fn trend_windows_do_not_overlap() {
        // Exactly on the 1-minute boundary belongs to the middle window.
        let readings = [
            sys(130.0, NOW - 2 * MINUTE_MS - 10 * SECOND_MS),
            sys(142.0, NOW - MINUTE_MS),
            dia(75.0, NOW - MINUTE_MS),
            sys(154.0, NOW),
            dia(75.0, NOW),
        ];
        let config = RuleConfig::default();
        let ctx = RuleContext::new(&readings, NOW, &config);
        let [w1, w2, w3] = trend_windows(&ctx);
        assert_eq!(w1.len(), 2);
        assert_eq!(w2.len(), 2);
        assert_eq!(w3.len(), 1);
    }

    // -- desaturation --------------------------------------------------------

    #[test]
    fn six_percent_drop_fires() {
        let readings = [sat(100.0, NOW - 9 * MINUTE_MS), sat(94.0, NOW)];
        assert_eq!(run(check_rapid_desaturation, &readings), Some(NOW));
    }

    #[test]
    fn three_percent_drop_does_not_fire() {
        let readings = [sat(100.0, NOW - 9 * MINUTE_MS), sat(97.0, NOW)];
        assert_eq!(run(check_rapid_desaturation, &readings), None);
    }

    #[test]
    fn desaturation_uses_arrival_order_not_extremes() {
        let readings = [
            sat(96.0, NOW - 8 * MINUTE_MS),
            sat(90.0, NOW - 4 * MINUTE_MS),
            sat(95.0, NOW),
        ];
        assert_eq!(run(check_rapid_desaturation, &readings), None);
    }

    #[test]
    fn single_saturation_reading_does_not_fire() {
        let readings = [sat(80.0, NOW), sys(120.0, NOW)];
        assert_eq!(run(check_rapid_desaturation, &readings), None);
    }

    #[test]
    fn percent_drop_guards_zero_baseline() {
        assert_eq!(percent_drop(0.0, 10.0), None);
        assert_eq!(percent_drop(100.0, 95.0), Some(5.0));
    }

    // -- hypotensive hypoxemia -----------------------------------------------

    #[test]
    fn low_pressure_and_low_saturation_fire() {
        let readings = [sys(80.0, NOW - 10 * SECOND_MS), sat(90.0, NOW - 5 * SECOND_MS)];
        assert_eq!(run(check_hypotensive_hypoxemia, &readings), Some(NOW));
    }

    #[test]
    fn only_one_condition_does_not_fire() {
        let low_pressure_only = [sys(80.0, NOW), sat(97.0, NOW)];
        assert_eq!(run(check_hypotensive_hypoxemia, &low_pressure_only), None);

        let low_saturation_only = [sys(120.0, NOW), sat(90.0, NOW)];
        assert_eq!(run(check_hypotensive_hypoxemia, &low_saturation_only), None);
    }

    #[test]
    fn missing_saturation_counts_as_zero_unless_strict() {
        let readings = [sys(80.0, NOW)];
        assert_eq!(run(check_hypotensive_hypoxemia, &readings), Some(NOW));
        assert_eq!(run_with(&strict(), check_hypotensive_hypoxemia, &readings), None);
    }

    #[test]
    fn empty_window_never_fires_hypotensive_rule() {
        let readings = [sys(80.0, NOW - 2 * MINUTE_MS), sat(85.0, NOW - 2 * MINUTE_MS)];
        assert_eq!(run(check_hypotensive_hypoxemia, &readings), None);
    }

    // -- irregular rhythm ----------------------------------------------------

    #[test]
    fn large_adjacent_ecg_jump_fires() {
        let readings = [
            ecg(0.4, NOW - 3 * MINUTE_MS),
            ecg(0.5, NOW - 2 * MINUTE_MS),
            ecg(7.0, NOW - MINUTE_MS),
        ];
        assert_eq!(run(check_irregular_rhythm, &readings), Some(NOW));
    }

    #[test]
    fn small_ecg_variation_does_not_fire() {
        let readings = [ecg(0.4, NOW - 60 * SECOND_MS), ecg(-0.6, NOW - 30 * SECOND_MS), ecg(0.7, NOW)];
        assert_eq!(run(check_irregular_rhythm, &readings), None);
    }

    #[test]
    fn non_ecg_readings_are_not_beats() {
        let readings = [ecg(0.4, NOW - 30 * SECOND_MS), sys(120.0, NOW - 20 * SECOND_MS), ecg(0.6, NOW)];
        assert_eq!(run(check_irregular_rhythm, &readings), None);
    }

    #[test]
    fn irregularity_threshold_is_configurable() {
        let readings = [ecg(0.0, NOW - 30 * SECOND_MS), ecg(2.0, NOW)];
        let tight = RuleConfig {
            irregular_beat_threshold: 1.0,
            ..RuleConfig::default()
        };
        assert_eq!(run(check_irregular_rhythm, &readings), None);
        assert_eq!(run_with(&tight, check_irregular_rhythm, &readings), Some(NOW));
    }
}
