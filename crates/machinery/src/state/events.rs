//! Event fan-out for repository watches.

use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::runtime::Object;

/// Per-subscription buffer size. A subscriber that falls this far behind is
/// evicted rather than allowed to block the store.
const SUBSCRIPTION_BUFFER: usize = 100;

/// Old and new state of an object; emitted for every persisting state
/// change.
#[derive(Debug, Clone)]
pub struct Event {
    pub old: Option<Arc<dyn Object>>,
    pub new: Option<Arc<dyn Object>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Added,
    Modified,
    Deleted,
}

impl Event {
    pub fn event_type(&self) -> EventType {
        if self.new.is_none() {
            EventType::Deleted
        } else if self.old.is_none() {
            EventType::Added
        } else {
            EventType::Modified
        }
    }

    /// The most recent state carried by the event.
    pub fn object(&self) -> Option<&Arc<dyn Object>> {
        self.new.as_ref().or(self.old.as_ref())
    }
}

#[derive(Default)]
struct HubState {
    next_id: u64,
    subscribers: Vec<(u64, mpsc::Sender<Event>)>,
}

/// Single-producer multi-consumer broadcast, one per repository.
#[derive(Default)]
pub(crate) struct EventHub {
    state: Arc<Mutex<HubState>>,
}

impl EventHub {
    pub(crate) fn register(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let mut state = self.state.lock().expect("event hub lock poisoned");
        state.next_id += 1;
        let id = state.next_id;
        state.subscribers.push((id, tx));
        Subscription {
            id,
            rx,
            hub: Arc::downgrade(&self.state),
        }
    }

    /// Delivers an event to every live subscription without blocking.
    /// A subscription whose buffer is full (or whose receiver is gone) is
    /// closed and removed.
    pub(crate) fn broadcast(&self, old: Option<Arc<dyn Object>>, new: Option<Arc<dyn Object>>) {
        let event = Event { old, new };
        let mut state = self.state.lock().expect("event hub lock poisoned");
        state
            .subscribers
            .retain(|(_, tx)| match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => false,
            });
    }

    /// Closes every subscription.
    pub(crate) fn shutdown(&self) {
        self.state
            .lock()
            .expect("event hub lock poisoned")
            .subscribers
            .clear();
    }
}

/// A single stream of events from a repository.
///
/// Receives events broadcast after registration, in broadcast order. The
/// stream ends when the subscription is evicted or the hub shuts down.
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<Event>,
    hub: Weak<Mutex<HubState>>,
}

impl Subscription {
    /// The next event, or `None` once the subscription is closed and
    /// drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Unregisters from the hub.
    pub fn close(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.lock()
                .expect("event hub lock poisoned")
                .subscribers
                .retain(|(id, _)| *id != self.id);
        }
        self.rx.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}
