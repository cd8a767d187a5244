//! Shared mutable state of the simulator: reading timelines and the
//! injected-alert registry. Both are designed to be wrapped in `Arc`.

pub mod registry;
pub mod timeseries;

pub use registry::ActiveAlertRegistry;
pub use timeseries::TimeSeriesStore;
