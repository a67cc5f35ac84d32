//! Deduplicating work queue for a single consumer.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

struct State<T> {
    queue: VecDeque<T>,
    dirty: HashSet<T>,
    processing: HashSet<T>,
    shutting_down: bool,
}

/// FIFO queue that deduplicates items and defers re-delivery of an item
/// that is currently being processed until [`WorkQueue::done`] is called.
///
/// Built for one consumer blocking in [`WorkQueue::get`] and any number of
/// producers. `add_after` spawns its timer on the ambient Tokio runtime.
pub struct WorkQueue<T> {
    state: Mutex<State<T>>,
    notify: Notify,
}

impl<T> WorkQueue<T>
where
    T: Clone + Eq + Hash + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                dirty: HashSet::new(),
                processing: HashSet::new(),
                shutting_down: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Queues an item unless it is already queued. An item added while it is
    /// being processed is re-queued when `done` is called for it. Silently
    /// dropped once the queue is shutting down.
    pub fn add(&self, item: T) {
        let mut state = self.state.lock().expect("work queue lock poisoned");
        if state.shutting_down {
            return;
        }
        if state.dirty.contains(&item) {
            return;
        }
        state.dirty.insert(item.clone());
        if state.processing.contains(&item) {
            return;
        }
        state.queue.push_back(item);
        drop(state);
        self.notify.notify_one();
    }

    /// Queues the item after the given delay without blocking the caller.
    pub fn add_after(self: &Arc<Self>, item: T, after: Duration) {
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            queue.add(item);
        });
    }

    /// Waits for the next item. Returns `None` when the queue is empty and
    /// shutting down; queued items still drain during shutdown.
    pub async fn get(&self) -> Option<T> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().expect("work queue lock poisoned");
                if let Some(item) = state.queue.pop_front() {
                    state.dirty.remove(&item);
                    state.processing.insert(item.clone());
                    return Some(item);
                }
                if state.shutting_down {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks an item as processed; if it went dirty in the meantime it is
    /// queued again.
    pub fn done(&self, item: &T) {
        let mut state = self.state.lock().expect("work queue lock poisoned");
        state.processing.remove(item);
        if state.dirty.contains(item) {
            state.queue.push_back(item.clone());
            drop(state);
            self.notify.notify_one();
        }
    }

    /// Stops the queue and wakes all waiters.
    pub fn shutdown(&self) {
        let mut state = self.state.lock().expect("work queue lock poisoned");
        state.shutting_down = true;
        drop(state);
        self.notify.notify_waiters();
    }
}

impl<T> Default for WorkQueue<T>
where
    T: Clone + Eq + Hash + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn delivers_in_fifo_order() {
        let queue = WorkQueue::new();
        queue.add("a");
        queue.add("b");

        assert_eq!(queue.get().await, Some("a"));
        assert_eq!(queue.get().await, Some("b"));
    }

    #[tokio::test]
    async fn deduplicates_queued_items() {
        let queue = WorkQueue::new();
        queue.add("a");
        queue.add("a");
        queue.add("a");

        assert_eq!(queue.get().await, Some("a"));
        queue.done(&"a");

        queue.shutdown();
        assert_eq!(queue.get().await, None);
    }

    #[tokio::test]
    async fn requeues_items_added_during_processing() {
        let queue = WorkQueue::new();
        queue.add("a");

        assert_eq!(queue.get().await, Some("a"));
        // Burst of adds while "a" is in flight collapses into one re-run.
        queue.add("a");
        queue.add("a");
        queue.done(&"a");

        assert_eq!(queue.get().await, Some("a"));
        queue.done(&"a");

        queue.shutdown();
        assert_eq!(queue.get().await, None);
    }

    #[tokio::test]
    async fn drains_queued_items_during_shutdown() {
        let queue = WorkQueue::new();
        queue.add("a");
        queue.shutdown();
        queue.add("b");

        assert_eq!(queue.get().await, Some("a"));
        assert_eq!(queue.get().await, None);
    }

    #[tokio::test]
    async fn get_wakes_on_add() {
        let queue = Arc::new(WorkQueue::new());

        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.get().await })
        };
        tokio::task::yield_now().await;
        queue.add("a");

        assert_eq!(waiter.await.unwrap(), Some("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn add_after_delays_delivery() {
        let queue = Arc::new(WorkQueue::new());
        let start = tokio::time::Instant::now();
        queue.add_after("a", Duration::from_secs(3));

        assert_eq!(queue.get().await, Some("a"));
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
