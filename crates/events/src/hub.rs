//! Subscriber registry and fan-out.
//!
//! Each subscriber owns a bounded queue. Publishing never waits: a full
//! queue drops the message for that subscriber, a closed queue removes the
//! subscriber. The subscriber map is only locked for the duration of one
//! publish, so joins and leaves never interleave with a fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cardio_core::alert::AlertEvent;
use cardio_core::reading::Reading;
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::delivery::AlertNotifier;
use crate::message::HubMessage;

/// Default per-subscriber queue depth.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 1024;

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub subscriber_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub subscribers: usize,
    pub published: u64,
    pub dropped: u64,
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Receiving end handed to a subscriber.
///
/// Ends (`recv` returns `None`) once the subscriber is removed from the hub.
pub struct Subscription {
    pub id: Uuid,
    receiver: mpsc::Receiver<Arc<HubMessage>>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<Arc<HubMessage>> {
        self.receiver.recv().await
    }

    /// Non-blocking receive; `None` when nothing is queued.
    pub fn try_recv(&mut self) -> Option<Arc<HubMessage>> {
        self.receiver.try_recv().ok()
    }
}

// ---------------------------------------------------------------------------
// BroadcastHub
// ---------------------------------------------------------------------------

pub struct BroadcastHub {
    subscribers: RwLock<HashMap<Uuid, mpsc::Sender<Arc<HubMessage>>>>,
    notifiers: Vec<Arc<dyn AlertNotifier>>,
    buffer: usize,
    published: AtomicU64,
    dropped: AtomicU64,
}

impl BroadcastHub {
    pub fn new(config: HubConfig) -> Self {
        Self::with_notifiers(config, Vec::new())
    }

    pub fn with_notifiers(config: HubConfig, notifiers: Vec<Arc<dyn AlertNotifier>>) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            notifiers,
            buffer: config.subscriber_buffer.max(1),
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub async fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = Uuid::new_v4();
        self.subscribers.write().await.insert(id, tx);
        tracing::debug!(subscriber = %id, "Subscriber connected");
        Subscription { id, receiver: rx }
    }

    pub async fn unsubscribe(&self, id: Uuid) {
        if self.subscribers.write().await.remove(&id).is_some() {
            tracing::debug!(subscriber = %id, "Subscriber disconnected");
        }
    }

    pub async fn publish_reading(&self, reading: Reading) -> usize {
        self.publish(HubMessage::Reading(reading)).await
    }

    /// Fan the alert out to subscribers, then run every notifier.
    pub async fn publish_alert(&self, alert: AlertEvent) -> usize {
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(&alert) {
                tracing::warn!(
                    channel = notifier.channel(),
                    patient_id = alert.patient_id,
                    error = %e,
                    "Alert notification failed",
                );
            }
        }
        self.publish(HubMessage::Alert(alert)).await
    }

    /// Queue a message for every subscriber and return how many accepted it.
    pub async fn publish(&self, message: HubMessage) -> usize {
        let message = Arc::new(message);
        self.published.fetch_add(1, Ordering::Relaxed);

        let mut delivered = 0;
        let mut closed = Vec::new();
        {
            let subscribers = self.subscribers.read().await;
            for (id, tx) in subscribers.iter() {
                match tx.try_send(Arc::clone(&message)) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(subscriber = %id, "Subscriber queue full, message dropped");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in closed {
                subscribers.remove(&id);
                tracing::debug!(subscriber = %id, "Removed closed subscriber");
            }
        }
        delivered
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn stats(&self) -> HubStats {
        HubStats {
            subscribers: self.subscriber_count().await,
            published: self.published.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    /// Drop every subscriber queue, ending all subscriptions.
    pub async fn shutdown_all(&self) {
        let mut subscribers = self.subscribers.write().await;
        let count = subscribers.len();
        subscribers.clear();
        tracing::info!(count, "Closed all subscriber channels");
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}
