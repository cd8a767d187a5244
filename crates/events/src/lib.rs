//! Fan-out of readings and alerts to live subscribers.
//!
//! - [`BroadcastHub`]: per-subscriber bounded queues; a full queue drops
//!   the message for that subscriber only.
//! - [`HubMessage`]: the published envelope and its line renderings.
//! - [`delivery`]: side-effect handlers run for every published alert.

pub mod delivery;
pub mod hub;
pub mod message;

pub use delivery::{AlertNotifier, NotifyChannel};
pub use hub::{BroadcastHub, HubConfig, HubStats, Subscription};
pub use message::HubMessage;
