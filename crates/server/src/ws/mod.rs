//! WebSocket stream of hub messages, with inbound text treated as ingest.

mod handler;

pub use handler::{ws_handler, HEARTBEAT_INTERVAL};
