//! Owner-scoped change notification.
//!
//! Invalidate-then-pull: events carry no payload, they only tell a
//! subscriber that something under its owner changed and a fresh pull is
//! due. One broadcast channel per owner, created lazily on first subscribe
//! and pruned once the last receiver is gone.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Buffered events per owner channel before a slow receiver lags.
pub const CHANNEL_CAPACITY: usize = 64;

/// Change event pushed to subscribers.
///
/// A single generic variant: missed or coalesced events collapse into the
/// next pull, so nothing finer-grained is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    TimerChanged,
}

/// Per-owner broadcast hub.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    channels: Mutex<HashMap<String, broadcast::Sender<ChangeEvent>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event to the owner's subscribers.
    ///
    /// A missing channel or an owner without subscribers is not an error;
    /// the event is simply dropped and the channel pruned.
    pub fn publish(&self, owner: &str, event: ChangeEvent) {
        let mut channels = self.lock();
        if let Some(tx) = channels.get(owner) {
            if tx.send(event).is_err() || tx.receiver_count() == 0 {
                channels.remove(owner);
            }
        }
    }

    /// Subscribe to changes for one owner.
    ///
    /// Dropping the returned subscription unsubscribes.
    pub fn subscribe(&self, owner: &str) -> ChangeSubscription {
        let mut channels = self.lock();
        let tx = channels
            .entry(owner.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        ChangeSubscription { rx: tx.subscribe() }
    }

    /// Number of live subscribers for an owner.
    pub fn subscriber_count(&self, owner: &str) -> usize {
        self.lock()
            .get(owner)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    // A panic while holding this lock cannot leave the map inconsistent,
    // so a poisoned lock is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<ChangeEvent>>> {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Receiving half of an owner subscription.
pub struct ChangeSubscription {
    rx: broadcast::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    /// Wait for the next event.
    ///
    /// A lagged receiver is not an error: the overflow collapses into a
    /// synthetic `TimerChanged`, since the payload-free event already means
    /// "pull again". `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        match self.rx.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("change subscription lagged, skipped {skipped} events");
                Some(ChangeEvent::TimerChanged)
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!("change subscription lagged, skipped {skipped} events");
                Some(ChangeEvent::TimerChanged)
            }
            Err(_) => None,
        }
    }
}

/// Exponential backoff schedule for callers that bridge the notifier over
/// a remote transport: `base * 2^attempt`, exponent capped at 6.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    /// Initial retry delay in milliseconds.
    pub base_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
        }
    }
}

impl ReconnectPolicy {
    pub fn new(base_delay_ms: u64) -> Self {
        Self { base_delay_ms }
    }

    /// Delay before reconnect attempt `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms * (1 << attempt.min(6)))
    }
}
