//! Per-patient reading timelines.
//!
//! [`TimeSeriesStore`] shards by patient: the outer [`DashMap`] is only held
//! long enough to clone the timeline handle, and each timeline has its own
//! lock. A query copies the matching readings under a read lock, so callers
//! never observe a half-applied append.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use cardio_core::reading::{Reading, VitalType};
use cardio_core::types::{PatientId, TimestampMs};
use dashmap::DashMap;
use parking_lot::RwLock;

// ---------------------------------------------------------------------------
// PatientTimeline
// ---------------------------------------------------------------------------

/// Readings of one type keyed by `(timestamp, arrival sequence)`.
type Series = BTreeMap<(TimestampMs, u64), Reading>;

/// Readings for one patient.
///
/// Arrival order need not match timestamp order. Each reading type is kept
/// in its own timestamp-ordered series tagged with an arrival sequence
/// number, so a range lookup only visits readings inside the range and
/// results can still be returned in arrival order.
#[derive(Debug, Default)]
pub struct PatientTimeline {
    series: HashMap<VitalType, Series>,
    next_seq: u64,
}

fn series_range(
    series: &Series,
    start: TimestampMs,
    end: TimestampMs,
) -> impl Iterator<Item = (u64, Reading)> + '_ {
    let bounds = (start <= end).then_some(((start, 0), (end, u64::MAX)));
    bounds
        .into_iter()
        .flat_map(move |(lo, hi)| series.range(lo..=hi))
        .map(|(&(_, seq), reading)| (seq, *reading))
}

impl PatientTimeline {
    pub fn push(&mut self, reading: Reading) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.series
            .entry(reading.vital)
            .or_default()
            .insert((reading.timestamp, seq), reading);
    }

    /// Readings with `start <= timestamp <= end`, in arrival order.
    pub fn range(&self, start: TimestampMs, end: TimestampMs) -> Vec<Reading> {
        let mut hits: Vec<(u64, Reading)> = self
            .series
            .values()
            .flat_map(|series| series_range(series, start, end))
            .collect();
        hits.sort_unstable_by_key(|(seq, _)| *seq);
        hits.into_iter().map(|(_, reading)| reading).collect()
    }

    /// Last-arrived reading of `vital` with `start <= timestamp <= end`.
    pub fn latest(&self, vital: VitalType, start: TimestampMs, end: TimestampMs) -> Option<Reading> {
        self.series
            .get(&vital)
            .into_iter()
            .flat_map(|series| series_range(series, start, end))
            .max_by_key(|(seq, _)| *seq)
            .map(|(_, reading)| reading)
    }

    pub fn len(&self) -> usize {
        self.next_seq as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next_seq == 0
    }
}

// ---------------------------------------------------------------------------
// TimeSeriesStore
// ---------------------------------------------------------------------------

type TimelineHandle = Arc<RwLock<PatientTimeline>>;

/// Concurrent store of every patient's timeline.
#[derive(Default)]
pub struct TimeSeriesStore {
    timelines: DashMap<PatientId, TimelineHandle>,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn timeline(&self, patient_id: PatientId) -> Option<TimelineHandle> {
        self.timelines.get(&patient_id).map(|t| Arc::clone(t.value()))
    }

    /// Append a reading to `reading.patient_id`'s timeline, creating the
    /// timeline on first use.
    pub fn append(&self, reading: Reading) {
        let timeline = match self.timeline(reading.patient_id) {
            Some(t) => t,
            None => Arc::clone(
                self.timelines
                    .entry(reading.patient_id)
                    .or_default()
                    .value(),
            ),
        };
        timeline.write().push(reading);
    }

    /// Append a batch for one tick. Each reading becomes visible on its own.
    pub fn append_all(&self, readings: impl IntoIterator<Item = Reading>) {
        for reading in readings {
            self.append(reading);
        }
    }

    /// Readings with `start <= timestamp <= end`, in append order. Empty for
    /// an unknown patient.
    pub fn query(&self, patient_id: PatientId, start: TimestampMs, end: TimestampMs) -> Vec<Reading> {
        self.timeline(patient_id)
            .map(|t| t.read().range(start, end))
            .unwrap_or_default()
    }

    /// Last-arrived reading of one type in `[start, end]`.
    pub fn latest(
        &self,
        patient_id: PatientId,
        vital: VitalType,
        start: TimestampMs,
        end: TimestampMs,
    ) -> Option<Reading> {
        self.timeline(patient_id)
            .and_then(|t| t.read().latest(vital, start, end))
    }

    /// Every patient with a timeline, sorted.
    pub fn list_patients(&self) -> BTreeSet<PatientId> {
        self.timelines.iter().map(|entry| *entry.key()).collect()
    }

    pub fn reading_count(&self, patient_id: PatientId) -> usize {
        self.timeline(patient_id).map_or(0, |t| t.read().len())
    }

    pub fn total_readings(&self) -> usize {
        self.timelines.iter().map(|entry| entry.value().read().len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
