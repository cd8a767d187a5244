/// Patients are identified by a plain integer id.
pub type PatientId = i64;

/// All timestamps are UTC milliseconds since the Unix epoch.
pub type TimestampMs = i64;

/// One second in timestamp units.
pub const SECOND_MS: TimestampMs = 1_000;

/// One minute in timestamp units.
pub const MINUTE_MS: TimestampMs = 60 * SECOND_MS;

/// One hour in timestamp units.
pub const HOUR_MS: TimestampMs = 60 * MINUTE_MS;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> TimestampMs {
    chrono::Utc::now().timestamp_millis()
}
