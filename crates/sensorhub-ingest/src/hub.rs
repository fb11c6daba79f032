//! Observer registry and non-blocking fan-out.
//!
//! The hub maps each connected observer to its own bounded mailbox. A
//! publish walks the registry and enqueues the reading into every mailbox
//! without ever awaiting, so ingestion liveness never depends on observer
//! behavior. When a mailbox is full the pending backlog is replaced by the
//! newest reading: a slow observer may miss intermediate readings but
//! resumes from the most recent ones, and the publisher never stalls.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use sensorhub_types::StoredReading;
use tokio::sync::Notify;
use tracing::debug;

/// Per-observer mailbox capacity.
///
/// An observer that falls more than this many readings behind loses its
/// backlog and resumes from the newest reading.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// Bounded delivery queue for one observer.
struct Mailbox {
    queue: Mutex<VecDeque<StoredReading>>,
    notify: Notify,
    closed: AtomicBool,
    capacity: usize,
}

impl Mailbox {
    fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            capacity,
        }
    }

    /// Enqueue a reading without blocking. Replaces the backlog when full.
    fn push(&self, reading: StoredReading) {
        if let Ok(mut queue) = self.queue.lock() {
            if queue.len() >= self.capacity {
                queue.clear();
            }
            queue.push_back(reading);
        }
        self.notify.notify_one();
    }

    fn pop(&self) -> Option<StoredReading> {
        self.queue.lock().ok()?.pop_front()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

struct HubInner {
    observers: Mutex<HashMap<u64, Arc<Mailbox>>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl HubInner {
    /// Remove an observer and wake it so a pending `recv` can terminate.
    /// Removing an id twice (or an unknown id) is a no-op.
    fn remove(&self, id: u64) {
        let removed = self
            .observers
            .lock()
            .ok()
            .and_then(|mut observers| observers.remove(&id));
        if let Some(mailbox) = removed {
            mailbox.close();
            debug!(observer_id = id, "observer unregistered");
        }
    }
}

/// Registry of live observers with decoupled per-observer delivery.
///
/// Cheap to clone; all clones share the same registry.
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

impl BroadcastHub {
    /// Create a hub with the default mailbox capacity.
    pub fn new() -> Self {
        Self::with_mailbox_capacity(DEFAULT_MAILBOX_CAPACITY)
    }

    /// Create a hub with a custom per-observer mailbox capacity.
    ///
    /// A capacity of zero is treated as one.
    pub fn with_mailbox_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                observers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Register a new observer.
    ///
    /// Effective immediately: every reading published after this call is
    /// delivered to the returned feed.
    pub fn register(&self) -> ObserverFeed {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mailbox = Arc::new(Mailbox::new(self.inner.capacity));
        if let Ok(mut observers) = self.inner.observers.lock() {
            observers.insert(id, Arc::clone(&mailbox));
        }
        debug!(observer_id = id, "observer registered");
        ObserverFeed {
            id,
            mailbox,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Remove an observer by id. Idempotent; safe after the feed is gone.
    pub fn unregister(&self, id: u64) {
        self.inner.remove(id);
    }

    /// Deliver a reading to every currently registered observer.
    ///
    /// Never blocks and never awaits: each observer's mailbox is updated
    /// under a short lock and the observer task is woken afterwards.
    /// Returns the number of observers the reading was enqueued for.
    pub fn publish(&self, reading: &StoredReading) -> usize {
        let mailboxes: Vec<Arc<Mailbox>> = match self.inner.observers.lock() {
            Ok(observers) => observers.values().cloned().collect(),
            Err(_) => return 0,
        };
        for mailbox in &mailboxes {
            mailbox.push(reading.clone());
        }
        mailboxes.len()
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .lock()
            .map(|observers| observers.len())
            .unwrap_or(0)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// One observer's end of the broadcast stream.
///
/// Dropping the feed unregisters the observer.
pub struct ObserverFeed {
    id: u64,
    mailbox: Arc<Mailbox>,
    hub: Weak<HubInner>,
}

impl ObserverFeed {
    /// The registry id of this observer, usable with
    /// [`BroadcastHub::unregister`].
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Receive the next reading.
    ///
    /// Returns `None` once the observer has been unregistered and its
    /// remaining backlog drained.
    pub async fn recv(&mut self) -> Option<StoredReading> {
        loop {
            // Arm the notification before checking the queue so a push
            // that lands between the check and the await is not missed.
            let notified = self.mailbox.notify.notified();
            if let Some(reading) = self.mailbox.pop() {
                return Some(reading);
            }
            if self.mailbox.is_closed() {
                return None;
            }
            notified.await;
        }
    }
}

impl Drop for ObserverFeed {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            inner.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use super::*;
    use chrono::Utc;
    use sensorhub_types::{Reading, ReadingId};

    fn reading(temperature: f64) -> StoredReading {
        StoredReading::new(
            ReadingId::new(),
            Reading {
                temperature: Some(temperature),
                humidity: None,
                observed_at: Utc::now(),
                topic: String::from("test/topic"),
                received_at: Utc::now(),
                raw_fallback: None,
            },
        )
    }

    #[tokio::test]
    async fn delivers_to_all_observers() {
        let hub = BroadcastHub::new();
        let mut first = hub.register();
        let mut second = hub.register();

        let delivered = hub.publish(&reading(1.0));
        assert_eq!(delivered, 2);

        assert_eq!(first.recv().await.unwrap().temperature, Some(1.0));
        assert_eq!(second.recv().await.unwrap().temperature, Some(1.0));
    }

    #[tokio::test]
    async fn publish_without_observers_is_fine() {
        let hub = BroadcastHub::new();
        assert_eq!(hub.publish(&reading(1.0)), 0);
    }

    #[tokio::test]
    async fn slow_observer_loses_backlog_not_liveness() {
        let hub = BroadcastHub::with_mailbox_capacity(4);
        let mut slow = hub.register();
        let mut fast = hub.register();

        // Publish well past the slow observer's capacity without draining
        // it. Every publish returns immediately.
        for i in 1..=10 {
            hub.publish(&reading(f64::from(i)));
            // The fast observer keeps up and sees every reading.
            assert_eq!(fast.recv().await.unwrap().temperature, Some(f64::from(i)));
        }

        // The slow observer missed intermediate readings but ends on the
        // newest one, in order.
        let mut seen = Vec::new();
        hub.unregister(slow.id());
        while let Some(r) = slow.recv().await {
            seen.push(r.temperature.unwrap());
        }
        assert!(seen.len() < 10, "backlog should have been replaced");
        assert_eq!(seen.last().copied(), Some(10.0));
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "order preserved");
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let hub = BroadcastHub::new();
        let feed = hub.register();
        let id = feed.id();

        hub.unregister(id);
        hub.unregister(id);
        assert_eq!(hub.observer_count(), 0);

        // Dropping the feed after explicit unregister is also fine.
        drop(feed);
        assert_eq!(hub.observer_count(), 0);
    }

    #[tokio::test]
    async fn recv_returns_none_after_unregister() {
        let hub = BroadcastHub::new();
        let mut feed = hub.register();
        hub.publish(&reading(1.0));
        hub.unregister(feed.id());

        // Backlog drains first, then the feed terminates.
        assert!(feed.recv().await.is_some());
        assert!(feed.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropping_feed_unregisters() {
        let hub = BroadcastHub::new();
        let feed = hub.register();
        assert_eq!(hub.observer_count(), 1);
        drop(feed);
        assert_eq!(hub.observer_count(), 0);
    }

    #[tokio::test]
    async fn registration_is_effective_for_subsequent_publishes_only() {
        let hub = BroadcastHub::new();
        hub.publish(&reading(1.0));

        let mut feed = hub.register();
        hub.publish(&reading(2.0));
        assert_eq!(feed.recv().await.unwrap().temperature, Some(2.0));
    }
}
