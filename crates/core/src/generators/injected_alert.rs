use rand::rngs::StdRng;
use rand::Rng;

use crate::alert::AlertTransition;

/// Default trigger rate per tick for an idle patient.
pub const DEFAULT_TRIGGER_RATE: f64 = 0.7;

/// Default per-tick probability that an active injected alert resolves.
pub const DEFAULT_RESOLVE_PROBABILITY: f64 = 0.9;

/// Randomly raises and clears "manual" alerts.
///
/// The process is stateless per patient: the caller supplies whether an
/// alert is currently active (normally from the active-alert registry).
/// An idle patient triggers with probability `1 - e^(-rate)`.
pub struct InjectedAlertProcess {
    rng: StdRng,
    trigger_probability: f64,
    resolve_probability: f64,
}

impl InjectedAlertProcess {
    pub fn new(rng: StdRng) -> Self {
        Self::with_rates(rng, DEFAULT_TRIGGER_RATE, DEFAULT_RESOLVE_PROBABILITY)
    }

    pub fn with_rates(rng: StdRng, trigger_rate: f64, resolve_probability: f64) -> Self {
        Self {
            rng,
            trigger_probability: -(-trigger_rate).exp_m1(),
            resolve_probability: resolve_probability.clamp(0.0, 1.0),
        }
    }

    pub fn trigger_probability(&self) -> f64 {
        self.trigger_probability
    }

    pub fn resolve_probability(&self) -> f64 {
        self.resolve_probability
    }

    /// Decide this tick's transition, if any.
    pub fn step(&mut self, active: bool) -> Option<AlertTransition> {
        let roll = self.rng.random::<f64>();
        if active {
            (roll < self.resolve_probability).then_some(AlertTransition::Resolved)
        } else {
            (roll < self.trigger_probability).then_some(AlertTransition::Triggered)
        }
    }
}
