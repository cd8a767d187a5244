//! Periodic per-patient ticks.
//!
//! [`Scheduler::start`] spawns one task per patient. Each task sleeps for a
//! random startup jitter, then ticks at a fixed period until the run cap is
//! reached or the schedule is cancelled. A tick, once admitted, always runs
//! to completion:
//!
//! 1. every vital-sign generator -> store append -> hub publish
//! 2. the injected-alert process -> registry transition -> marker reading
//! 3. one evaluator pass for the patient -> hub publish of each alert
//!
//! Admission is bounded by a semaphore sized `slots_per_patient * patients`;
//! a tick holds one slot per vital-sign generator.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cardio_core::alert::AlertTransition;
use cardio_core::generators::GeneratorKind;
use cardio_core::reading::{Reading, VitalType, ALERT_RESOLVED_VALUE, ALERT_TRIGGERED_VALUE};
use cardio_core::types::{now_ms, PatientId};
use cardio_events::BroadcastHub;
use cardio_store::{ActiveAlertRegistry, TimeSeriesStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Semaphore;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::evaluator::AlertEvaluator;
use crate::generators::{GeneratorSet, VITAL_KINDS};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);
pub const DEFAULT_STARTUP_JITTER: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_RUNS: u64 = 5;
pub const DEFAULT_SLOTS_PER_PATIENT: usize = 4;

/// Shorter periods, zero included, are raised to this.
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub period: Duration,
    /// Exclusive upper bound of each patient's startup delay.
    pub startup_jitter: Duration,
    /// Ticks per patient; `None` runs until cancelled.
    pub max_runs: Option<u64>,
    pub slots_per_patient: usize,
    /// Seed for the jitter draw.
    pub seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_TICK_PERIOD,
            startup_jitter: DEFAULT_STARTUP_JITTER,
            max_runs: Some(DEFAULT_MAX_RUNS),
            slots_per_patient: DEFAULT_SLOTS_PER_PATIENT,
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SchedulerStats {
    invocations: [AtomicU64; GeneratorKind::COUNT],
    ticks: AtomicU64,
    readings: AtomicU64,
    alerts: AtomicU64,
}

impl SchedulerStats {
    fn record_invocation(&self, kind: GeneratorKind) {
        if let Some(i) = GeneratorKind::ALL.iter().position(|k| *k == kind) {
            self.invocations[i].fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            invocations: GeneratorKind::ALL
                .iter()
                .zip(&self.invocations)
                .map(|(kind, count)| (*kind, count.load(Ordering::Relaxed)))
                .collect(),
            ticks: self.ticks.load(Ordering::Relaxed),
            readings: self.readings.load(Ordering::Relaxed),
            alerts: self.alerts.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the scheduler counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub invocations: BTreeMap<GeneratorKind, u64>,
    /// Completed ticks across all patients.
    pub ticks: u64,
    /// Readings appended, alert markers included.
    pub readings: u64,
    /// Alerts published.
    pub alerts: u64,
}

impl StatsSnapshot {
    pub fn invocations(&self, kind: GeneratorKind) -> u64 {
        self.invocations.get(&kind).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

struct TickContext {
    store: Arc<TimeSeriesStore>,
    registry: Arc<ActiveAlertRegistry>,
    hub: Arc<BroadcastHub>,
    evaluator: Arc<AlertEvaluator>,
    generators: GeneratorSet,
    stats: SchedulerStats,
}

pub struct Scheduler {
    ctx: TickContext,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        store: Arc<TimeSeriesStore>,
        registry: Arc<ActiveAlertRegistry>,
        hub: Arc<BroadcastHub>,
        evaluator: Arc<AlertEvaluator>,
        generators: GeneratorSet,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            ctx: TickContext {
                store,
                registry,
                hub,
                evaluator,
                generators,
                stats: SchedulerStats::default(),
            },
            config,
        }
    }

    /// Spawn the per-patient tasks. Must be called inside a Tokio runtime.
    pub fn start(self, patients: &[PatientId]) -> SchedulerHandle {
        let Scheduler { ctx, mut config } = self;
        if config.period < MIN_TICK_PERIOD {
            tracing::warn!(
                period_us = config.period.as_micros() as u64,
                "Tick period below minimum, using 1ms",
            );
            config.period = MIN_TICK_PERIOD;
        }
        let ctx = Arc::new(ctx);
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();
        let slots = (config.slots_per_patient * patients.len()).max(VITAL_KINDS.len());
        let permits = Arc::new(Semaphore::new(slots));
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let jitter_ms = u64::try_from(config.startup_jitter.as_millis()).unwrap_or(u64::MAX);

        for &patient_id in patients {
            let delay = if jitter_ms == 0 {
                Duration::ZERO
            } else {
                Duration::from_millis(rng.random_range(0..jitter_ms))
            };
            tracker.spawn(run_patient(
                Arc::clone(&ctx),
                patient_id,
                delay,
                config.clone(),
                Arc::clone(&permits),
                cancel.clone(),
            ));
        }
        tracker.close();

        tracing::info!(
            patients = patients.len(),
            period_ms = config.period.as_millis() as u64,
            max_runs = ?config.max_runs,
            slots,
            "Scheduler started",
        );

        SchedulerHandle {
            ctx,
            cancel,
            tracker,
        }
    }
}

async fn run_patient(
    ctx: Arc<TickContext>,
    patient_id: PatientId,
    delay: Duration,
    config: SchedulerConfig,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
) {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(delay) => {}
    }

    let mut interval = tokio::time::interval(config.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let slots_per_tick = VITAL_KINDS.len() as u32;
    let mut runs: u64 = 0;

    while !config.max_runs.is_some_and(|max| runs >= max) {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&permits).acquire_many_owned(slots_per_tick) => permit,
        };
        let Ok(_permit) = permit else { break };

        ctx.tick(patient_id).await;
        runs += 1;
    }

    tracing::debug!(patient_id, runs, "Patient schedule finished");
}

impl TickContext {
    async fn tick(&self, patient_id: PatientId) {
        let now = now_ms();

        for kind in VITAL_KINDS {
            self.stats.record_invocation(kind);
            match self.generators.generate(kind, patient_id, now) {
                Ok(readings) => {
                    for reading in readings {
                        self.record(reading).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(patient_id, generator = %kind, error = %e, "Generator failed");
                }
            }
        }

        self.stats.record_invocation(GeneratorKind::InjectedAlert);
        let active = self.registry.is_active(patient_id);
        let step = self.generators.injected_step(patient_id, active);
        if let Err(e) = &step {
            tracing::warn!(patient_id, generator = %GeneratorKind::InjectedAlert, error = %e, "Generator failed");
        }
        if let Ok(Some(transition)) = step {
            match self.registry.transition(patient_id, transition, now) {
                Ok(_) => {
                    let value = match transition {
                        AlertTransition::Triggered => ALERT_TRIGGERED_VALUE,
                        AlertTransition::Resolved => ALERT_RESOLVED_VALUE,
                    };
                    self.record(Reading::new(patient_id, VitalType::AlertMarker, value, now))
                        .await;
                }
                Err(e) => {
                    tracing::warn!(patient_id, error = %e, "Injected alert transition skipped");
                }
            }
        }

        for alert in self.evaluator.evaluate_tick(patient_id, now) {
            self.stats.alerts.fetch_add(1, Ordering::Relaxed);
            self.hub.publish_alert(alert).await;
        }

        self.stats.ticks.fetch_add(1, Ordering::Relaxed);
    }

    async fn record(&self, reading: Reading) {
        self.store.append(reading);
        self.stats.readings.fetch_add(1, Ordering::Relaxed);
        self.hub.publish_reading(reading).await;
    }
}

// ---------------------------------------------------------------------------
// SchedulerHandle
// ---------------------------------------------------------------------------

/// Control handle for a running schedule.
pub struct SchedulerHandle {
    ctx: Arc<TickContext>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl SchedulerHandle {
    /// Stop admitting ticks. In-flight ticks still complete.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("Scheduler stopping");
        }
        self.cancel.cancel();
    }

    /// Wait until every patient task has exited.
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }

    /// [`stop`](Self::stop) then [`wait`](Self::wait).
    pub async fn shutdown(&self) {
        self.stop();
        self.wait().await;
        tracing::info!(ticks = self.stats().ticks, "Scheduler stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.tracker.is_empty()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.ctx.stats.snapshot()
    }
}
