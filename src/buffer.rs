//! Durable buffer (spec.md §4.3 "Buffer semantics"): bounded FIFO of
//! write-failed items, flushed by a single-flight retry pass.

use crate::model::BufferedItem;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::warn;

const CAPACITY: usize = 500;

pub struct DurableBuffer {
    items: Mutex<VecDeque<BufferedItem>>,
    flushing: AtomicBool,
}

impl Default for DurableBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DurableBuffer {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(CAPACITY)),
            flushing: AtomicBool::new(false),
        }
    }

    /// Appends an item, evicting the oldest on overflow (spec.md §8
    /// invariant 3: size always ≤ 500).
    pub fn push(&self, item: BufferedItem) {
        let mut items = self.items.lock().unwrap();
        if items.len() >= CAPACITY {
            items.pop_front();
            warn!("durable buffer at capacity, dropped oldest item");
        }
        items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attempts to persist every buffered item once via `retry`. Concurrent
    /// calls while a flush is already running no-op (single-flight).
    /// Items that fail remain in the buffer with their retry counter
    /// incremented; successes are removed in batch.
    pub async fn flush<F, Fut>(&self, retry: F)
    where
        F: Fn(BufferedItem) -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        if self
            .flushing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let pending: Vec<BufferedItem> = {
            let mut items = self.items.lock().unwrap();
            items.drain(..).collect()
        };

        let mut remaining = VecDeque::new();
        for mut item in pending {
            if retry(item.clone()).await {
                continue;
            }
            item.retry_count += 1;
            remaining.push_back(item);
        }

        {
            let mut items = self.items.lock().unwrap();
            for item in remaining.into_iter().rev() {
                items.push_front(item);
            }
        }

        self.flushing.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UpstreamMessage;
    use chrono::Utc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    fn item(message_id: i64) -> BufferedItem {
        BufferedItem {
            raw: UpstreamMessage {
                message_id,
                chat_id: -1001,
                chat_title: "Test".into(),
                text: "text".into(),
                sender_name: None,
                message_date: Utc::now(),
                has_media: None,
                files: None,
            },
            parsed: None,
            fingerprint: format!("-1001_{message_id}"),
            retry_count: 0,
            enqueued_at: Instant::now(),
        }
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let buffer = DurableBuffer::new();
        for i in 0..(CAPACITY as i64 + 1) {
            buffer.push(item(i));
        }
        assert_eq!(buffer.len(), CAPACITY);
    }

    #[tokio::test]
    async fn flush_persists_all_items_and_empties_buffer() {
        let buffer = DurableBuffer::new();
        buffer.push(item(1));
        buffer.push(item(2));
        buffer.push(item(3));

        buffer.flush(|_item| async { true }).await;

        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn second_flush_after_success_is_a_no_op() {
        let buffer = DurableBuffer::new();
        buffer.push(item(1));
        let calls = AtomicUsize::new(0);

        buffer
            .flush(|_item| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { true }
            })
            .await;
        buffer
            .flush(|_item| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { true }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_items_remain_with_incremented_retry_count() {
        let buffer = DurableBuffer::new();
        buffer.push(item(1));

        buffer.flush(|_item| async { false }).await;

        assert_eq!(buffer.len(), 1);
        let retry_count = {
            let items = buffer.items.lock().unwrap();
            items[0].retry_count
        };
        assert_eq!(retry_count, 1);
    }
}
