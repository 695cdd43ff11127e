//! Rate limiting operators
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::binder::{init_upstream, Upstream};
use crate::scheduler::{self, Scheduler, TimerHandle};
use crate::stream::RxStream;
use crate::stream_configuration::UpstreamOptions;

/// Emit a value only after `window` passes with no newer value.
///
/// Every value restarts the timer; when it fires the latest value is
/// emitted. A value still pending when the upstream finishes is flushed
/// before the stream closes.
pub fn debounce<T>(source: &RxStream<T>, window: Duration) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    let scheduler = match Scheduler::current() {
        Ok(scheduler) => scheduler,
        Err(err) => return scheduler::unscheduled("debounce", err),
    };
    let pending: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
    let timer = Arc::new(Mutex::new(TimerHandle::idle()));

    let value_pending = Arc::clone(&pending);
    let value_timer = Arc::clone(&timer);
    let done_pending = Arc::clone(&pending);
    let done_timer = Arc::clone(&timer);

    Upstream::new(
        source,
        UpstreamOptions::labelled("debounce"),
        move |value, downstream: &RxStream<T>| {
            *value_pending.lock() = Some(value);
            let weak = downstream.downgrade();
            let pending = Arc::clone(&value_pending);
            *value_timer.lock() = scheduler.schedule(window, move || {
                let Some(downstream) = weak.upgrade() else {
                    return;
                };
                let latest = pending.lock().take();
                if let Some(latest) = latest {
                    let _ = downstream.set(latest);
                }
            });
        },
    )
    .on_source_done(move |_, downstream| {
        done_timer.lock().cancel();
        let latest = done_pending.lock().take();
        if let Some(latest) = latest {
            let _ = downstream.set(latest);
        }
    })
    .on_stop(move || {
        timer.lock().cancel();
        pending.lock().take();
    })
    .build()
}

/// Emit a value only if at least `window` passed since the last emission.
/// Values arriving sooner are dropped, not delayed.
pub fn throttle<T>(source: &RxStream<T>, window: Duration) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    let last_emit: Mutex<Option<Instant>> = Mutex::new(None);
    init_upstream(source, UpstreamOptions::labelled("throttle"), move |value, downstream| {
        let now = Instant::now();
        let emit = {
            let mut last_emit = last_emit.lock();
            match *last_emit {
                Some(last) if now.duration_since(last) < window => false,
                _ => {
                    *last_emit = Some(now);
                    true
                }
            }
        };
        if emit {
            let _ = downstream.set(value);
        }
    })
}
