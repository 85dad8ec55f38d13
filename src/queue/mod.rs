//! Pending text segments for Queue Mode.
//!
//! A plain FIFO: no priority, no dedup and no bound. Producers that stream
//! faster than the engine types are responsible for their own backpressure.

use std::collections::VecDeque;
use std::time::Duration;

/// One segment waiting to be revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// The full text of the segment.
    pub text: String,
    /// Wait before the first character of this segment is revealed.
    pub delay: Option<Duration>,
    /// Byte offset to resume from after a pause.
    pub start_index: Option<usize>,
}

impl QueueItem {
    pub fn new(text: impl Into<String>, delay: Option<Duration>) -> Self {
        Self {
            text: text.into(),
            delay,
            start_index: None,
        }
    }

    /// The pre-reveal wait, treating a zero delay as none.
    pub fn pending_delay(&self) -> Option<Duration> {
        self.delay.filter(|delay| !delay.is_zero())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextQueue {
    items: VecDeque<QueueItem>,
}

impl TextQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, text: impl Into<String>, delay: Option<Duration>) {
        self.items.push_back(QueueItem::new(text, delay));
    }

    pub fn dequeue_next(&mut self) -> Option<QueueItem> {
        self.items.pop_front()
    }

    /// Put an item back at the head, ahead of everything already queued.
    pub fn requeue_front(&mut self, item: QueueItem) {
        self.items.push_front(item);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }
}
