//! Cooperative cancellation tokens handed to function and iterable sources.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::dispatch::{DispatchId, DispatchList};
use crate::error::{RxError, RxResult};

struct AbortState {
    aborted: AtomicBool,
    reason: Mutex<Option<String>>,
    listeners: DispatchList<String>,
    notify: Notify,
}

/// Owner side: the only thing that can abort
#[derive(Clone)]
pub struct AbortController {
    state: Arc<AbortState>,
}

/// Observer side: checked by the code being cancelled
#[derive(Clone)]
pub struct AbortSignal {
    state: Arc<AbortState>,
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortController {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AbortState {
                aborted: AtomicBool::new(false),
                reason: Mutex::new(None),
                listeners: DispatchList::new(),
                notify: Notify::new(),
            }),
        }
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            state: Arc::clone(&self.state),
        }
    }

    /// Abort once; later calls are ignored.
    pub fn abort(&self, reason: impl Into<String>) {
        if self.state.aborted.swap(true, Ordering::AcqRel) {
            return;
        }
        let reason = reason.into();
        *self.state.reason.lock() = Some(reason.clone());
        self.state.notify.notify_waiters();
        self.state.listeners.notify(&reason);
        self.state.listeners.clear();
    }

    pub fn is_aborted(&self) -> bool {
        self.state.aborted.load(Ordering::Acquire)
    }
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        self.state.aborted.load(Ordering::Acquire)
    }

    pub fn reason(&self) -> Option<String> {
        self.state.reason.lock().clone()
    }

    /// Run `listener` once when aborted. Runs immediately if already aborted.
    pub fn on_abort<F>(&self, listener: F) -> Option<DispatchId>
    where
        F: Fn(&String) + Send + Sync + 'static,
    {
        if self.is_aborted() {
            listener(&self.reason().unwrap_or_default());
            return None;
        }
        let listener: Arc<dyn Fn(&String) + Send + Sync> = Arc::new(listener);
        let id = self.state.listeners.add(Arc::clone(&listener), true);
        // an abort that raced the registration has already cleared the list
        if self.is_aborted() && self.state.listeners.remove(id) {
            listener(&self.reason().unwrap_or_default());
            return None;
        }
        Some(id)
    }

    /// `Err(Cancelled)` once aborted
    pub fn check(&self) -> RxResult<()> {
        match self.is_aborted() {
            true => Err(RxError::Cancelled(self.reason().unwrap_or_default())),
            false => Ok(()),
        }
    }

    pub fn remove_listener(&self, id: DispatchId) -> bool {
        self.state.listeners.remove(id)
    }

    /// Resolves once aborted
    pub async fn aborted(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortSignal")
            .field("aborted", &self.is_aborted())
            .field("reason", &self.reason())
            .finish()
    }
}

impl fmt::Debug for AbortController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortController")
            .field("aborted", &self.is_aborted())
            .finish()
    }
}
