//! Operators that react to silence from their upstream
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use crate::binder::Upstream;
use crate::scheduler::{self, Scheduler, TimerHandle};
use crate::sources::Pingable;
use crate::stream::RxStream;
use crate::stream_configuration::{TimeoutOptions, UpstreamOptions};

/// Where the value emitted on a timeout comes from
pub enum Fallback<T> {
    Value(T),
    Function(Arc<dyn Fn() -> T + Send + Sync>),
    /// Next item of an iterator; nothing is emitted once it is exhausted
    Generator(Mutex<Box<dyn Iterator<Item = T> + Send>>),
}

impl<T> Fallback<T> {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Fallback::Function(Arc::new(f))
    }

    pub fn generator<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Fallback::Generator(Mutex::new(Box::new(items.into_iter())))
    }

    fn produce(&self) -> Option<T>
    where
        T: Clone,
    {
        match self {
            Fallback::Value(value) => Some(value.clone()),
            Fallback::Function(f) => Some(f()),
            Fallback::Generator(items) => items.lock().next(),
        }
    }
}

impl<T> fmt::Debug for Fallback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fallback::Value(_) => f.write_str("Fallback::Value"),
            Fallback::Function(_) => f.write_str("Fallback::Function"),
            Fallback::Generator(_) => f.write_str("Fallback::Generator"),
        }
    }
}

type FireFn<T> = Arc<dyn Fn(&RxStream<T>) -> bool + Send + Sync>;

/// Pass values through, calling `fire` whenever `interval` passes without one.
/// `fire` returns false to stop a repeating timer.
fn on_silence<T>(
    source: &RxStream<T>,
    label: &str,
    options: TimeoutOptions,
    fire: FireFn<T>,
) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    let scheduler = match Scheduler::current() {
        Ok(scheduler) => scheduler,
        Err(err) => return scheduler::unscheduled(label, err),
    };
    let timer = Arc::new(Mutex::new(TimerHandle::idle()));
    let TimeoutOptions {
        interval,
        repeat,
        immediate,
    } = options;

    let arm_timer = Arc::clone(&timer);
    let arm = Arc::new(move |downstream: &RxStream<T>| {
        let weak = downstream.downgrade();
        let fire = Arc::clone(&fire);
        let handle = if repeat {
            scheduler.schedule_repeating(interval, move || {
                weak.upgrade().is_some_and(|downstream| fire(&downstream))
            })
        } else {
            scheduler.schedule(interval, move || {
                if let Some(downstream) = weak.upgrade() {
                    fire(&downstream);
                }
            })
        };
        *arm_timer.lock() = handle;
    });

    let value_arm = Arc::clone(&arm);
    let mut upstream = Upstream::new(
        source,
        UpstreamOptions::labelled(label),
        move |value, downstream: &RxStream<T>| {
            // re-arm before emitting so a stop triggered by the emission cancels it
            value_arm(downstream);
            let _ = downstream.set(value);
        },
    );
    if immediate {
        upstream = upstream.on_start(move |downstream| arm(downstream));
    }
    upstream.on_stop(move || timer.lock().cancel()).build()
}

/// Pass values through, emitting a fallback whenever `interval` passes
/// without an upstream value
pub fn timeout_value<T>(
    source: &RxStream<T>,
    fallback: Fallback<T>,
    options: TimeoutOptions,
) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    let fire: FireFn<T> = Arc::new(move |downstream: &RxStream<T>| match fallback.produce() {
        Some(value) => downstream.set(value).is_ok(),
        None => false,
    });
    on_silence(source, "timeout_value", options, fire)
}

/// Pass values through, pinging `target` whenever `interval` passes
/// without an upstream value
pub fn timeout_ping<T>(
    source: &RxStream<T>,
    target: Arc<dyn Pingable>,
    options: TimeoutOptions,
) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    let fire: FireFn<T> = Arc::new(move |downstream: &RxStream<T>| match target.ping() {
        Ok(()) => true,
        Err(err) => {
            log::warn!("{}: ping failed: {}", downstream.label(), err);
            false
        }
    });
    on_silence(source, "timeout_ping", options, fire)
}
