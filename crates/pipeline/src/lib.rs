//! The simulation pipeline: generator ownership, windowed alert evaluation
//! and the per-patient tick scheduler.

pub mod evaluator;
pub mod generators;
pub mod scheduler;

pub use evaluator::{AlertEvaluator, EvaluatorConfig};
pub use generators::GeneratorSet;
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerHandle, StatsSnapshot};
