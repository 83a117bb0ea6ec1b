// SPDX-License-Identifier: MIT

//! Bounded FIFO queue used only by the [`crate::event_driven_runner`] (C4).

use avatarflow_core::{Event, NodeId};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// An event paired with the id of the source node that produced it (§4.7
/// step 3).
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub event: Event,
    pub source_node_id: NodeId,
}

/// `put` never blocks: on a full queue it drops the item and increments
/// `dropped_count` (§4.2, P7). `get` suspends until an item is available.
pub struct BoundedEventQueue {
    tx: mpsc::Sender<QueueItem>,
    rx: tokio::sync::Mutex<mpsc::Receiver<QueueItem>>,
    capacity: usize,
    dropped_count: AtomicUsize,
    processing: AtomicBool,
}

impl BoundedEventQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self { tx, rx: tokio::sync::Mutex::new(rx), capacity, dropped_count: AtomicUsize::new(0), processing: AtomicBool::new(false) }
    }

    /// Returns `true` if accepted, `false` if the queue was full (in which
    /// case `dropped_count` is incremented by exactly one, P7).
    pub fn put(&self, item: QueueItem) -> bool {
        match self.tx.try_send(item) {
            Ok(()) => true,
            Err(_) => {
                self.dropped_count.fetch_add(1, Ordering::SeqCst);
                false
            }
        }
    }

    pub async fn get(&self) -> Option<QueueItem> {
        self.rx.lock().await.recv().await
    }

    pub fn size(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped_count.load(Ordering::SeqCst)
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    pub fn set_processing(&self, processing: bool) {
        self.processing.store(processing, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
