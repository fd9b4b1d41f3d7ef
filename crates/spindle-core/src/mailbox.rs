//! Thread-safe FIFO mailbox.
//!
//! The single primitive behind every cross-thread handoff in the hub:
//! session-management packets, background work submissions, and work
//! completions all travel through mailboxes. Both halves are clonable and
//! all clones share one queue, so a mailbox can sit inside an
//! `Arc<EndpointHook>` and be pushed from the hub's listener thread while the
//! owning endpoint drains it.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};

/// Multi-producer/multi-consumer FIFO queue.
///
/// Pushes never block; pops are non-blocking ([`Mailbox::try_pop`]) or
/// bounded-blocking ([`Mailbox::pop_timeout`]). FIFO order holds per
/// producer-consumer pair; there is no ordering across distinct mailboxes.
#[derive(Debug)]
pub struct Mailbox<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Mailbox<T> {
    /// Create an empty mailbox.
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self { tx, rx }
    }

    /// Append an item to the tail of the queue.
    pub fn push(&self, item: T) {
        // Cannot fail: we hold a receiver for the channel's whole lifetime.
        let _ = self.tx.send(item);
    }

    /// Remove the head of the queue, or `None` if empty.
    pub fn try_pop(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Remove the head of the queue, waiting up to `timeout` for an item to
    /// arrive. Returns `None` on timeout.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Remove every item currently queued, in FIFO order.
    pub fn drain(&self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.rx.len());
        while let Some(item) = self.try_pop() {
            items.push(item);
        }
        items
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone(), rx: self.rx.clone() }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
