//! Unbounded FIFO queues with bounded-wait pops.
//!
//! Stages hand records to each other through [`RecordQueue`]. Pushes never
//! block; pops wait up to a caller-supplied timeout so a consumer can suspend
//! itself (clear its gate) when its producer goes quiet.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{Instant, timeout_at};

#[derive(Debug)]
struct Inner<T> {
    items: Mutex<VecDeque<T>>,
    available: Notify,
}

/// A thread-safe unbounded FIFO queue.
///
/// Cloning is cheap and all clones share the same underlying queue. Depth is
/// unbounded by design; callers watch [`RecordQueue::len`] for backlog.
#[derive(Debug, Clone)]
pub struct RecordQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> RecordQueue<T> {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                items: Mutex::new(VecDeque::new()),
                available: Notify::new(),
            }),
        }
    }

    /// Appends an item to the back of the queue and wakes one waiting consumer.
    pub fn push(&self, item: T) {
        {
            let mut items = self.inner.items.lock().unwrap();
            items.push_back(item);
        }
        self.inner.available.notify_one();
    }

    /// Removes and returns the front item, if any.
    pub fn try_pop(&self) -> Option<T> {
        let mut items = self.inner.items.lock().unwrap();
        items.pop_front()
    }

    /// Returns the number of queued items.
    pub fn len(&self) -> usize {
        let items = self.inner.items.lock().unwrap();
        items.len()
    }

    /// Returns `true` if the queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns the front item, waiting up to `timeout` for one to
    /// arrive.
    ///
    /// Returns `None` if the queue stays empty for the whole window. `None` is
    /// starvation, not an error; the caller is expected to suspend itself.
    pub async fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;

        loop {
            // Register for notification before checking emptiness, so a push
            // that lands between the check and the await is not missed.
            let notified = self.inner.available.notified();

            if let Some(item) = self.try_pop() {
                return Some(item);
            }

            if timeout_at(deadline, notified).await.is_err() {
                // One last check: a push may have raced the deadline.
                return self.try_pop();
            }
        }
    }
}

impl<T> Default for RecordQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pops_preserve_push_order() {
        let queue = RecordQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));
        assert_eq!(queue.try_pop(), Some(3));
        assert_eq!(queue.try_pop(), None);
    }

    #[tokio::test]
    async fn pop_timeout_returns_queued_item_immediately() {
        let queue = RecordQueue::new();
        queue.push("record");

        let item = queue.pop_timeout(Duration::from_secs(5)).await;
        assert_eq!(item, Some("record"));
    }

    #[tokio::test]
    async fn pop_timeout_wakes_on_concurrent_push() {
        let queue = RecordQueue::new();
        let producer_queue = queue.clone();

        let producer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer_queue.push(42);
        });

        let item = queue.pop_timeout(Duration::from_secs(5)).await;
        assert_eq!(item, Some(42));
        producer.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn pop_timeout_expires_on_empty_queue() {
        let queue: RecordQueue<u64> = RecordQueue::new();

        let item = queue.pop_timeout(Duration::from_secs(10)).await;
        assert_eq!(item, None);
    }

    #[tokio::test]
    async fn len_tracks_depth() {
        let queue = RecordQueue::new();
        assert!(queue.is_empty());

        queue.push(1);
        queue.push(2);
        assert_eq!(queue.len(), 2);

        queue.try_pop();
        assert_eq!(queue.len(), 1);
    }
}
