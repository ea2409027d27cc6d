//! Bounded work queues in front of the network adapters.
//!
//! Callers never wait on a push. When the queue is full one item is dropped
//! according to the queue's [`OverflowPolicy`], and a fixed pool of workers
//! caps how many requests are in flight.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued item to make room.
    #[default]
    DropOldest,
    /// Reject the item being pushed.
    DropNewest,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PushOutcome<T> {
    Queued,
    /// The queue was full; this item was discarded.
    Dropped(T),
    Closed(T),
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

pub struct BoundedQueue<T> {
    name: &'static str,
    capacity: usize,
    policy: OverflowPolicy,
    state: Mutex<QueueState<T>>,
    notify: Notify,
}

impl<T> BoundedQueue<T> {
    pub fn new(name: &'static str, capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            name,
            capacity,
            policy,
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&self, item: T) -> PushOutcome<T> {
        let outcome = {
            let mut state = self.lock();
            if state.closed {
                return PushOutcome::Closed(item);
            }
            if state.items.len() < self.capacity {
                state.items.push_back(item);
                PushOutcome::Queued
            } else {
                match self.policy {
                    OverflowPolicy::DropNewest => return PushOutcome::Dropped(item),
                    OverflowPolicy::DropOldest => {
                        let evicted = state.items.pop_front();
                        state.items.push_back(item);
                        match evicted {
                            Some(old) => PushOutcome::Dropped(old),
                            None => PushOutcome::Queued,
                        }
                    }
                }
            }
        };
        self.notify.notify_one();
        outcome
    }

    /// Next item, or `None` once the queue is closed and drained.
    pub async fn pop(&self) -> Option<T> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.lock();
                if let Some(item) = state.items.pop_front() {
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Stops accepting items. Workers finish what is already queued.
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_waiters();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState<T>> {
        // Pushes and pops never panic while holding the lock.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Spawns `workers` tasks that feed queued items to `handler` until the queue closes.
pub fn spawn_workers<T, F, Fut>(
    queue: Arc<BoundedQueue<T>>,
    workers: usize,
    handler: F,
) -> Vec<JoinHandle<()>>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    (0..workers.max(1))
        .map(|worker| {
            let queue = Arc::clone(&queue);
            let handler = handler.clone();
            tokio::spawn(async move {
                tracing::debug!(queue = queue.name(), worker, "dispatch worker started");
                while let Some(item) = queue.pop().await {
                    handler(item).await;
                }
                tracing::debug!(queue = queue.name(), worker, "dispatch worker stopped");
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn drop_oldest_evicts_front() {
        let queue = BoundedQueue::new("test", 2, OverflowPolicy::DropOldest);
        assert_eq!(queue.push(1), PushOutcome::Queued);
        assert_eq!(queue.push(2), PushOutcome::Queued);
        assert_eq!(queue.push(3), PushOutcome::Dropped(1));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn drop_newest_rejects_incoming() {
        let queue = BoundedQueue::new("test", 1, OverflowPolicy::DropNewest);
        assert_eq!(queue.push(1), PushOutcome::Queued);
        assert_eq!(queue.push(2), PushOutcome::Dropped(2));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn closed_queue_refuses_items() {
        let queue = BoundedQueue::new("test", 4, OverflowPolicy::DropOldest);
        queue.close();
        assert_eq!(queue.push(9), PushOutcome::Closed(9));
    }

    #[tokio::test]
    async fn pop_drains_then_ends_after_close() {
        let queue = BoundedQueue::new("test", 4, OverflowPolicy::DropOldest);
        queue.push("a");
        queue.push("b");
        queue.close();
        assert_eq!(queue.pop().await, Some("a"));
        assert_eq!(queue.pop().await, Some("b"));
        assert_eq!(queue.pop().await, None);
    }

    #[tokio::test]
    async fn workers_process_every_queued_item() {
        let queue = Arc::new(BoundedQueue::new("test", 16, OverflowPolicy::DropNewest));
        let handled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&handled);
        let handles = spawn_workers(Arc::clone(&queue), 3, move |n: usize| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(n, Ordering::SeqCst);
            }
        });

        for n in 1..=10 {
            queue.push(n);
        }
        queue.close();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(handled.load(Ordering::SeqCst), 55);
    }
}
