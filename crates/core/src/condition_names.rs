//! Fixed condition labels carried by [`AlertEvent`](crate::alert::AlertEvent)s.
//!
//! Each rule in [`crate::rules::RULES`] is tagged with exactly one of these.

/// Systolic pressure above 180 or below 90.
pub const CONDITION_SYSTOLIC_CRITICAL: &str = "Critical systolic blood pressure";

/// Diastolic pressure above 120 or below 60.
pub const CONDITION_DIASTOLIC_CRITICAL: &str = "Critical diastolic blood pressure";

/// Blood saturation below 92%.
pub const CONDITION_LOW_SATURATION: &str = "Low blood saturation";

/// ECG value below 50 or above 100.
pub const CONDITION_ABNORMAL_ECG: &str = "Abnormal ECG reading";

/// Heart rate below 50 or above 100 (generic 24h checker).
pub const CONDITION_ABNORMAL_HEART_RATE: &str = "Heart Rate Alert";

/// Monotonic blood pressure trend across three 1-minute windows.
pub const CONDITION_PRESSURE_TREND: &str = "Increasing or Decreasing trend in blood pressure found";

/// Saturation fell by 5% or more inside 10 minutes.
pub const CONDITION_RAPID_DESATURATION: &str = "Rapid Saturation Drop detected";

/// Low systolic pressure together with low saturation.
pub const CONDITION_HYPOTENSIVE_HYPOXEMIA: &str = "Hypotensive Hypoxemia detected";

/// Adjacent ECG readings differ by more than the irregularity threshold.
pub const CONDITION_IRREGULAR_RHYTHM: &str = "Irregular heart beat detected";

/// Injected (manual) alert drained from the active-alert registry.
pub const CONDITION_MANUAL_ALERT: &str = "Manual alert triggered";
