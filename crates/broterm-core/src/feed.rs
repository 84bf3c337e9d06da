//! Process-wide publish/subscribe hub for server-pushed notifications.
//!
//! Delivery is best-effort: each subscriber owns a bounded channel and a full
//! channel drops the event being published for that subscriber only. A slow
//! consumer never blocks the publisher or any other subscriber. Consumers
//! treat every event as "something changed, re-fetch", not as a delta log.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Topic carrying relationship and presence changes for the signed-in user.
pub const PROFILE_UPDATES: &str = "profile-updates";

/// Payload codes published on [`PROFILE_UPDATES`].
pub mod profile {
    pub const RELATIONSHIP_CHANGED: &str = "relationship-changed";
    pub const PRESENCE_CHANGED: &str = "presence-changed";
}

/// Default per-subscriber channel capacity.
pub const DEFAULT_CAPACITY: usize = 16;

/// Opaque handle identifying one `subscribe` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving end of a subscription.
#[derive(Debug)]
pub struct Subscription<T> {
    id: SubscriptionId,
    topic: String,
    rx: mpsc::Receiver<T>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the next event; `None` once the hub dropped this subscriber.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

struct Subscriber<T> {
    id: SubscriptionId,
    tx: mpsc::Sender<T>,
}

struct HubInner<T> {
    next_id: AtomicU64,
    capacity: usize,
    topics: RwLock<HashMap<String, Vec<Subscriber<T>>>>,
}

/// Fan-out registry shared by every publisher and listener.
pub struct FeedHub<T> {
    inner: Arc<HubInner<T>>,
}

impl<T> Clone for FeedHub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for FeedHub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedHub")
            .field("capacity", &self.inner.capacity)
            .field("topics", &self.inner.topics.read().len())
            .finish()
    }
}

impl<T: Clone + Send + 'static> Default for FeedHub<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T: Clone + Send + 'static> FeedHub<T> {
    /// Creates a hub whose subscribers each buffer at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
                topics: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Registers a listener for `topic`.
    ///
    /// Only events published after this call returns are delivered.
    pub fn subscribe(&self, topic: impl Into<String>) -> Subscription<T> {
        let topic = topic.into();
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        self.inner
            .topics
            .write()
            .entry(topic.clone())
            .or_default()
            .push(Subscriber { id, tx });
        debug!(%id, %topic, "feed subscribe");
        Subscription { id, topic, rx }
    }

    /// Removes a listener. Returns false if it was already gone.
    ///
    /// Once this returns no publish can deliver to the subscription, even one
    /// running concurrently.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut topics = self.inner.topics.write();
        let mut removed = false;
        topics.retain(|_, subs| {
            let before = subs.len();
            subs.retain(|s| s.id != id);
            removed |= subs.len() != before;
            !subs.is_empty()
        });
        if removed {
            debug!(%id, "feed unsubscribe");
        }
        removed
    }

    /// Delivers `payload` to every current subscriber of `topic`.
    ///
    /// Never blocks. Returns how many subscribers accepted the event.
    pub fn publish(&self, topic: &str, payload: T) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();
        {
            let topics = self.inner.topics.read();
            let Some(subs) = topics.get(topic) else {
                return 0;
            };
            for sub in subs {
                match sub.tx.try_send(payload.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(id = %sub.id, %topic, "subscriber lagging; dropped event");
                    }
                    Err(TrySendError::Closed(_)) => closed.push(sub.id),
                }
            }
        }
        for id in closed {
            self.unsubscribe(id);
        }
        delivered
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.topics.read().get(topic).map_or(0, Vec::len)
    }
}
