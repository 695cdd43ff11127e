use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::scheduler::{self, Scheduler, TimerHandle};
use crate::stream::{Hooks, RxStream};
use crate::stream_configuration::{ArrayOptions, StreamOptions, WhenStopped};

/// Emit `items` in order, one per `options.interval`, then dispose.
pub fn from_array<T>(items: Vec<T>, options: ArrayOptions) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    let scheduler = match Scheduler::current() {
        Ok(scheduler) => scheduler,
        Err(err) => return scheduler::unscheduled(&options.label, err),
    };
    let stream = RxStream::with_options(
        StreamOptions::default()
            .lazy(options.lazy)
            .label(options.label.clone()),
    );
    let items = Arc::new(items);
    let index = Arc::new(AtomicUsize::new(0));
    let task = Arc::new(Mutex::new(TimerHandle::idle()));
    let interval = options.interval;

    let weak = stream.downgrade();
    let start_task = Arc::clone(&task);
    let start_index = Arc::clone(&index);
    let start = move || {
        let weak = weak.clone();
        let items = Arc::clone(&items);
        let index = Arc::clone(&start_index);
        let handle = scheduler.spawn(async move {
            loop {
                let position = index.load(Ordering::Acquire);
                let Some(stream) = weak.upgrade() else {
                    break;
                };
                if position >= items.len() {
                    stream.dispose("source array complete");
                    break;
                }
                drop(stream);
                scheduler::pause(interval).await;
                let Some(stream) = weak.upgrade() else {
                    break;
                };
                // advance first: set() may stop and reset this source synchronously
                index.store(position + 1, Ordering::Release);
                if stream.set(items[position].clone()).is_err() {
                    break;
                }
            }
        });
        *start_task.lock() = handle;
    };

    let when_stopped = options.when_stopped;
    let stop_task = Arc::clone(&task);
    let stop = move || {
        stop_task.lock().cancel();
        if when_stopped == WhenStopped::Reset {
            index.store(0, Ordering::Release);
        }
    };

    stream.install(
        Hooks::new()
            .on_start(start)
            .on_stop(stop)
            .on_dispose(move |_| task.lock().cancel()),
    );
    stream
}
