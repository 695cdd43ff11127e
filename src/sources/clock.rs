use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::scheduler::{self, Scheduler, TimerHandle};
use crate::stream::{Hooks, RxStream};
use crate::stream_configuration::{Lazy, StreamOptions};

/// Emit an increasing tick count every `period`.
///
/// Use [`Lazy::Never`] for a clock that must run whether or not anyone listens.
pub fn clock(period: Duration, lazy: Lazy) -> RxStream<u64> {
    let scheduler = match Scheduler::current() {
        Ok(scheduler) => scheduler,
        Err(err) => return scheduler::unscheduled("clock", err),
    };
    let stream = RxStream::with_options(StreamOptions::default().lazy(lazy).label("clock"));
    let ticks = Arc::new(AtomicU64::new(0));
    let timer = Arc::new(Mutex::new(TimerHandle::idle()));

    let weak = stream.downgrade();
    let start_timer = Arc::clone(&timer);
    let start = move || {
        let weak = weak.clone();
        let ticks = Arc::clone(&ticks);
        *start_timer.lock() = scheduler.schedule_repeating(period, move || {
            let Some(stream) = weak.upgrade() else {
                return false;
            };
            let tick = ticks.fetch_add(1, Ordering::AcqRel);
            stream.set(tick).is_ok()
        });
    };

    let stop_timer = Arc::clone(&timer);
    stream.install(
        Hooks::new()
            .on_start(start)
            .on_stop(move || stop_timer.lock().cancel())
            .on_dispose(move |_| timer.lock().cancel()),
    );
    stream
}
