//! The reactive primitive: a disposable, subscribable source of messages.
//!
//! An [`RxStream`] is a cheap handle; clones share one stream. The
//! producer side of a stream (timers, upstream subscriptions, listeners)
//! is attached through start/stop/dispose hooks, and the stream's
//! [`Lazy`] policy decides when those hooks run relative to the number
//! of subscribers.
//!
//! A stream delivers one message at a time. Producers on other threads
//! wait on a per-stream delivery lock until the current message has
//! reached every subscriber. The lock is re-entrant, so a callback may
//! still subscribe, unsubscribe, set or dispose on the stream that
//! called it.

use parking_lot::{Mutex, ReentrantMutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::dispatch::{DispatchId, DispatchList, Handler};
use crate::error::{RxError, RxResult};
use crate::message::{Message, Signal, SignalKind};
use crate::stream_configuration::{Lazy, StreamOptions};

type StartHook = Box<dyn FnMut() + Send>;
type StopHook = Box<dyn FnMut() + Send>;
type DisposeHook = Box<dyn FnOnce(&str) + Send>;

/// Producer-side lifecycle callbacks attached by the stream's owner
#[derive(Default)]
pub struct Hooks {
    pub on_start: Option<StartHook>,
    pub on_stop: Option<StopHook>,
    pub on_dispose: Option<DisposeHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start<F: FnMut() + Send + 'static>(mut self, f: F) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn on_stop<F: FnMut() + Send + 'static>(mut self, f: F) -> Self {
        self.on_stop = Some(Box::new(f));
        self
    }

    pub fn on_dispose<F: FnOnce(&str) + Send + 'static>(mut self, f: F) -> Self {
        self.on_dispose = Some(Box::new(f));
        self
    }
}

struct StreamInner<T> {
    label: String,
    lazy: Lazy,
    dispatch: DispatchList<Message<T>>,
    delivery: ReentrantMutex<()>,
    disposed: AtomicBool,
    dispose_reason: Mutex<Option<String>>,
    active: Mutex<bool>,
    on_start: Mutex<Option<StartHook>>,
    on_stop: Mutex<Option<StopHook>>,
    on_dispose: Mutex<Option<DisposeHook>>,
    track_last: bool,
    replay: bool,
    last: Mutex<Option<T>>,
}

impl<T> StreamInner<T> {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn ensure_live(&self) -> RxResult<()> {
        if self.is_disposed() {
            let reason = self.dispose_reason.lock().clone().unwrap_or_default();
            return Err(RxError::disposed(&self.label, &reason));
        }
        Ok(())
    }

    fn start(&self) {
        {
            let mut active = self.active.lock();
            if *active || self.is_disposed() {
                return;
            }
            *active = true;
        }
        log::debug!("{}: start", self.label);
        // the hook leaves its slot while it runs so it may re-enter the stream
        let hook = self.on_start.lock().take();
        if let Some(mut hook) = hook {
            hook();
            if !self.is_disposed() {
                self.on_start.lock().get_or_insert(hook);
            }
        }
    }

    fn stop(&self) {
        {
            let mut active = self.active.lock();
            if !*active {
                return;
            }
            *active = false;
        }
        log::debug!("{}: stop", self.label);
        let hook = self.on_stop.lock().take();
        if let Some(mut hook) = hook {
            hook();
            if !self.is_disposed() {
                self.on_stop.lock().get_or_insert(hook);
            }
        }
    }

    fn release_if_idle(&self) {
        if self.lazy == Lazy::Very && self.dispatch.is_empty() && !self.is_disposed() {
            self.stop();
        }
    }

    fn unsubscribe(&self, id: DispatchId) {
        if self.dispatch.remove(id) {
            self.release_if_idle();
        }
    }

    fn dispose(&self, reason: &str) {
        {
            let _delivery = self.delivery.lock();
            if self.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            *self.dispose_reason.lock() = Some(reason.to_string());
            log::debug!("{}: dispose ({})", self.label, reason);
            self.dispatch.notify(&Message::Signal(Signal::done(reason)));
            self.dispatch.clear();
        }

        let was_active = std::mem::replace(&mut *self.active.lock(), false);
        let stop = self.on_stop.lock().take();
        if let (true, Some(mut stop)) = (was_active, stop) {
            stop();
        }
        self.on_start.lock().take();
        let on_dispose = self.on_dispose.lock().take();
        if let Some(on_dispose) = on_dispose {
            on_dispose(reason);
        }
    }
}

impl<T> Drop for StreamInner<T> {
    // the last handle went away without a dispose: release the producer side
    fn drop(&mut self) {
        if *self.disposed.get_mut() {
            return;
        }
        log::debug!("{}: dropped while live", self.label);
        if *self.active.get_mut() {
            if let Some(mut stop) = self.on_stop.get_mut().take() {
                stop();
            }
        }
        if let Some(on_dispose) = self.on_dispose.get_mut().take() {
            on_dispose("dropped");
        }
    }
}

/// Handle to a reactive stream
pub struct RxStream<T> {
    inner: Arc<StreamInner<T>>,
}

impl<T> Clone for RxStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Non-owning handle, for timers and hooks that must not keep a stream alive
pub struct WeakRxStream<T> {
    inner: Weak<StreamInner<T>>,
}

impl<T> Clone for WeakRxStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> WeakRxStream<T> {
    pub fn upgrade(&self) -> Option<RxStream<T>> {
        self.inner.upgrade().map(|inner| RxStream { inner })
    }
}

impl<T> Default for RxStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A stream with [`Lazy::Initial`] and no hooks, written to with [`RxStream::set`]
    pub fn new() -> Self {
        Self::with_options(StreamOptions::default())
    }

    pub fn labelled(label: impl Into<String>) -> Self {
        Self::with_options(StreamOptions::default().label(label))
    }

    pub fn with_options(options: StreamOptions<T>) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                label: options.label,
                lazy: options.lazy,
                dispatch: DispatchList::new(),
                delivery: ReentrantMutex::new(()),
                disposed: AtomicBool::new(false),
                dispose_reason: Mutex::new(None),
                active: Mutex::new(false),
                on_start: Mutex::new(None),
                on_stop: Mutex::new(None),
                on_dispose: Mutex::new(None),
                track_last: options.track_last || options.replay || options.initial.is_some(),
                replay: options.replay,
                last: Mutex::new(options.initial),
            }),
        }
    }

    /// A stream that is already disposed with `reason`
    pub fn closed(label: impl Into<String>, reason: &str) -> Self {
        let stream = Self::labelled(label);
        stream.dispose(reason);
        stream
    }

    /// Attach producer hooks. A [`Lazy::Never`] stream starts right away,
    /// as does a lazy one that already has subscribers.
    pub fn install(&self, hooks: Hooks) {
        *self.inner.on_start.lock() = hooks.on_start;
        *self.inner.on_stop.lock() = hooks.on_stop;
        *self.inner.on_dispose.lock() = hooks.on_dispose;
        if self.inner.lazy == Lazy::Never || !self.inner.dispatch.is_empty() {
            self.inner.start();
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn lazy(&self) -> Lazy {
        self.inner.lazy
    }

    /// Emit a value to every current subscriber
    pub fn set(&self, value: T) -> RxResult<()> {
        {
            let _delivery = self.inner.delivery.lock();
            self.inner.ensure_live()?;
            if self.inner.track_last {
                *self.inner.last.lock() = Some(value.clone());
            }
            self.inner
                .dispatch
                .notify_until(&Message::Value(value), || self.inner.is_disposed());
        }
        self.inner.release_if_idle();
        Ok(())
    }

    /// Emit a signal. A `Done` signal disposes the stream with `context` as the reason.
    pub fn signal(&self, kind: SignalKind, context: Option<String>) -> RxResult<()> {
        self.inner.ensure_live()?;
        if kind == SignalKind::Done {
            self.dispose(context.as_deref().unwrap_or("done"));
            return Ok(());
        }
        {
            let _delivery = self.inner.delivery.lock();
            self.inner.ensure_live()?;
            self.inner.dispatch.notify_until(
                &Message::Signal(Signal::new(kind, context)),
                || self.inner.is_disposed(),
            );
        }
        self.inner.release_if_idle();
        Ok(())
    }

    pub fn warn(&self, context: impl Into<String>) -> RxResult<()> {
        self.signal(SignalKind::Warn, Some(context.into()))
    }

    /// Pass an upstream signal along, disposing on `done`. Ignored once disposed.
    pub fn forward(&self, signal: &Signal) {
        if signal.is_done() {
            self.dispose(signal.context_str());
        } else if !self.is_disposed() {
            let _ = self.signal(signal.kind.clone(), signal.context.clone());
        }
    }

    /// Terminate the stream. Subscribers get one `done` carrying `reason`;
    /// later calls are no-ops.
    pub fn dispose(&self, reason: &str) {
        self.inner.dispose(reason);
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// `Err(Disposed)` once the stream has been disposed
    pub fn ensure_live(&self) -> RxResult<()> {
        self.inner.ensure_live()
    }

    pub fn dispose_reason(&self) -> Option<String> {
        self.inner.dispose_reason.lock().clone()
    }

    /// True while the producer side holds its resources
    pub fn is_active(&self) -> bool {
        *self.inner.active.lock()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.dispatch.len()
    }

    /// Subscribe to every message
    pub fn on<F>(&self, handler: F) -> RxResult<Subscription>
    where
        F: Fn(&Message<T>) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(handler), false)
    }

    /// Subscribe to values only
    pub fn on_value<F>(&self, handler: F) -> RxResult<Subscription>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on(move |message| {
            if let Message::Value(value) = message {
                handler(value);
            }
        })
    }

    /// Subscribe for the next message only
    pub fn once<F>(&self, handler: F) -> RxResult<Subscription>
    where
        F: Fn(&Message<T>) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(handler), true)
    }

    fn subscribe(&self, handler: Handler<Message<T>>, once: bool) -> RxResult<Subscription> {
        let id = {
            // a value set concurrently is either replayed or delivered, never both
            let _delivery = self.inner.delivery.lock();
            self.inner.ensure_live()?;
            if self.inner.replay {
                let last = self.last();
                if let Some(last) = last {
                    handler(&Message::Value(last));
                    if once {
                        return Ok(Subscription::noop());
                    }
                }
            }
            self.inner.dispatch.add(handler, once)
        };
        if self.inner.lazy != Lazy::Never {
            self.inner.start();
        }
        let stream = self.clone();
        Ok(Subscription::new(move || stream.inner.unsubscribe(id)))
    }

    /// Most recent value, when the stream tracks it
    pub fn last(&self) -> Option<T> {
        self.inner.last.lock().clone()
    }

    pub fn downgrade(&self) -> WeakRxStream<T> {
        WeakRxStream {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn ptr_eq(&self, other: &RxStream<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> fmt::Debug for RxStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RxStream")
            .field("label", &self.inner.label)
            .field("lazy", &self.inner.lazy)
            .field("subscribers", &self.inner.dispatch.len())
            .field("active", &*self.inner.active.lock())
            .field("disposed", &self.inner.is_disposed())
            .finish()
    }
}

/// Unsubscribe capability returned by [`RxStream::on`]. Idempotent.
pub struct Subscription {
    cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    pub fn new<F: FnOnce() + Send + 'static>(cancel: F) -> Self {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    pub fn noop() -> Self {
        Self {
            cancel: Mutex::new(None),
        }
    }

    pub fn unsubscribe(&self) {
        let cancel = self.cancel.lock().take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.cancel.lock().is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}
