//! Ordered registry of subscriber callbacks.
//!
//! Every stream keeps one of these, and so do plain event emitters and
//! abort signals. `notify` works on a snapshot of the entries, so a
//! handler that subscribes or unsubscribes while it is being called does
//! not disturb the delivery in progress.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback stored in a [`DispatchList`]
pub type Handler<M> = Arc<dyn Fn(&M) + Send + Sync>;

/// Opaque identifier handed out by [`DispatchList::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchId(u64);

impl fmt::Display for DispatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Entry<M> {
    id: DispatchId,
    handler: Handler<M>,
    once: bool,
}

impl<M> Clone for Entry<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Arc::clone(&self.handler),
            once: self.once,
        }
    }
}

pub struct DispatchList<M> {
    entries: Mutex<Vec<Entry<M>>>,
    next_id: AtomicU64,
}

impl<M> Default for DispatchList<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> DispatchList<M> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a handler. A `once` handler is removed the first time it is notified.
    pub fn add(&self, handler: Handler<M>, once: bool) -> DispatchId {
        let id = DispatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push(Entry { id, handler, once });
        id
    }

    /// Remove a handler, returning `false` if it was not registered.
    pub fn remove(&self, id: DispatchId) -> bool {
        let removed = {
            let mut entries = self.entries.lock();
            entries
                .iter()
                .position(|entry| entry.id == id)
                .map(|position| entries.remove(position))
        };
        // dropped outside the lock: a handler may own the last handle to another stream
        removed.is_some()
    }

    /// Invoke every handler registered at the time of the call.
    ///
    /// Panics raised by handlers are not caught.
    pub fn notify(&self, message: &M) {
        self.notify_until(message, || false);
    }

    /// Like [`DispatchList::notify`], but stops before the next handler once `halted` is true
    pub fn notify_until<H>(&self, message: &M, halted: H)
    where
        H: Fn() -> bool,
    {
        let snapshot: Vec<Entry<M>> = {
            let mut entries = self.entries.lock();
            let snapshot = entries.clone();
            // once-handlers leave before they run so a re-entrant notify cannot reach them twice
            entries.retain(|entry| !entry.once);
            snapshot
        };
        log::trace!("dispatching to {} handler(s)", snapshot.len());
        for entry in snapshot {
            if halted() {
                break;
            }
            (entry.handler)(message);
        }
    }

    pub fn clear(&self) {
        let cleared = std::mem::take(&mut *self.entries.lock());
        drop(cleared);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

impl<M> fmt::Debug for DispatchList<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchList")
            .field("handlers", &self.len())
            .finish()
    }
}
