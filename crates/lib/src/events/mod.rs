//! Change notification hub.
//!
//! The hub keeps a registry of live subscribers, per key and for the firehose,
//! and fans committed changes out to them. Publishing happens on the commit
//! path, so it must never block or fail the writer: events go through bounded
//! channels with `try_send`, and a subscriber that is gone or too slow to keep
//! up is dropped from the registry and its stream closes. Delivery is
//! best-effort at-least-once to currently connected subscribers; there is no
//! replay after a reconnect.

use std::{collections::HashMap, sync::Mutex};

use serde::Serialize;
use tokio::sync::mpsc;

/// Per-subscriber channel capacity. A subscriber this far behind is dropped.
const SUBSCRIBER_BUFFER: usize = 256;

/// A committed change, addressed by key.
///
/// Values are not embedded; subscribers re-fetch if they need the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    /// The key that was set or deleted.
    pub key: String,
}

/// A live change-feed registration.
pub struct Subscription {
    rx: mpsc::Receiver<ChangeEvent>,
}

impl Subscription {
    /// Receive the next event. Returns `None` once the hub has dropped this
    /// subscriber or the hub itself is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }
}

#[derive(Default)]
struct Registry {
    by_key: HashMap<String, Vec<mpsc::Sender<ChangeEvent>>>,
    firehose: Vec<mpsc::Sender<ChangeEvent>>,
}

/// Per-key subscriber registry with commit-ordered fan-out.
#[derive(Default)]
pub struct ChangeHub {
    inner: Mutex<Registry>,
}

impl ChangeHub {
    /// Create a new hub with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to changes of a single key.
    pub fn subscribe(&self, key: impl Into<String>) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let mut inner = self.inner.lock().unwrap();
        inner.by_key.entry(key.into()).or_default().push(tx);
        Subscription { rx }
    }

    /// Subscribe to changes of every key.
    pub fn subscribe_all(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let mut inner = self.inner.lock().unwrap();
        inner.firehose.push(tx);
        Subscription { rx }
    }

    /// Publish one commit's events.
    ///
    /// `keys` must already be in the commit's key order; each key produces one
    /// event. Non-blocking: a full or closed channel unsubscribes its owner.
    pub fn publish(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        for key in keys {
            let event = ChangeEvent { key: key.clone() };

            if let Some(senders) = inner.by_key.get_mut(key) {
                senders.retain(|tx| deliver(tx, &event));
                if senders.is_empty() {
                    inner.by_key.remove(key);
                }
            }

            inner.firehose.retain(|tx| deliver(tx, &event));
        }
    }

    /// Number of live registrations, across keys and the firehose.
    pub fn subscriber_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.by_key.values().map(Vec::len).sum::<usize>() + inner.firehose.len()
    }
}

/// Attempt delivery; `false` drops the subscriber from the registry.
fn deliver(tx: &mpsc::Sender<ChangeEvent>, event: &ChangeEvent) -> bool {
    match tx.try_send(event.clone()) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::warn!(key = %event.key, "dropping slow change subscriber");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}
