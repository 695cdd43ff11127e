use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::abort::AbortController;
use crate::error::{RxError, RxResult};
use crate::scheduler::{self, Scheduler, TimerHandle};
use crate::stream::{Hooks, RxStream};
use crate::stream_configuration::{FunctionOptions, StreamOptions};

/// Something that can be asked to produce again
pub trait Pingable: Send + Sync {
    fn ping(&self) -> RxResult<()>;
}

/// A stream fed by repeatedly calling a function.
///
/// In polling mode the function is called every `interval`. In manual
/// mode it is called once per [`FunctionSource::ping`].
pub struct FunctionSource<T> {
    stream: RxStream<T>,
    trigger: Arc<Notify>,
}

impl<T> Clone for FunctionSource<T> {
    fn clone(&self) -> Self {
        Self {
            stream: self.stream.clone(),
            trigger: Arc::clone(&self.trigger),
        }
    }
}

impl<T> FunctionSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn stream(&self) -> RxStream<T> {
        self.stream.clone()
    }

    /// Request one more call in manual mode. Pings are not queued beyond one.
    pub fn ping(&self) -> RxResult<()> {
        self.stream.ensure_live()?;
        self.trigger.notify_one();
        Ok(())
    }
}

impl<T> Pingable for FunctionSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn ping(&self) -> RxResult<()> {
        FunctionSource::ping(self)
    }
}

impl<T> From<FunctionSource<T>> for RxStream<T> {
    fn from(source: FunctionSource<T>) -> Self {
        source.stream
    }
}

impl<T> fmt::Debug for FunctionSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSource")
            .field("stream", &self.stream)
            .finish()
    }
}

/// Call an async function to produce values.
///
/// Each call receives an [`crate::abort::AbortSignal`] that is aborted when
/// the source stops, so a slow call can give up early.
pub fn from_function<T, E, F, Fut>(f: F, options: FunctionOptions) -> FunctionSource<T>
where
    T: Clone + Send + Sync + 'static,
    E: fmt::Display + Send + 'static,
    F: Fn(crate::abort::AbortSignal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let scheduler = match Scheduler::current() {
        Ok(scheduler) => scheduler,
        Err(err) => {
            return FunctionSource {
                stream: scheduler::unscheduled(&options.label, err),
                trigger: Arc::new(Notify::new()),
            }
        }
    };
    let stream = RxStream::with_options(
        StreamOptions::default()
            .lazy(options.lazy)
            .label(options.label.clone()),
    );
    let trigger = Arc::new(Notify::new());
    let f = Arc::new(f);
    let task = Arc::new(Mutex::new(TimerHandle::idle()));
    let controller: Arc<Mutex<Option<AbortController>>> = Arc::new(Mutex::new(None));
    let repeats = Arc::new(AtomicUsize::new(0));

    let weak = stream.downgrade();
    let start_task = Arc::clone(&task);
    let start_controller = Arc::clone(&controller);
    let start_trigger = Arc::clone(&trigger);
    let config = options.clone();
    let start = move || {
        let abort = AbortController::new();
        *start_controller.lock() = Some(abort.clone());
        let weak = weak.clone();
        let f = Arc::clone(&f);
        let trigger = Arc::clone(&start_trigger);
        let repeats = Arc::clone(&repeats);
        let config = config.clone();
        let handle = scheduler.spawn(async move {
            if !config.predelay.is_zero() {
                tokio::time::sleep(config.predelay).await;
            }
            let mut errors = 0usize;
            loop {
                if config.manual {
                    trigger.notified().await;
                }
                let result = f(abort.signal()).await;
                let Some(stream) = weak.upgrade() else {
                    break;
                };
                match result {
                    Ok(value) => {
                        errors = 0;
                        let count = repeats.fetch_add(1, Ordering::AcqRel) + 1;
                        if stream.set(value).is_err() {
                            break;
                        }
                        if config.maximum_repeats.is_some_and(|max| count >= max) {
                            stream.dispose("maximum repeats reached");
                            break;
                        }
                    }
                    Err(err) => {
                        errors += 1;
                        if config.close_on_error || errors >= config.error_limit {
                            log::warn!("{}: closing after error: {}", config.label, err);
                            stream.dispose(&RxError::Operator(err.to_string()).to_string());
                            break;
                        }
                        log::warn!("{}: function error ({} so far): {}", config.label, errors, err);
                        if stream.warn(err.to_string()).is_err() {
                            break;
                        }
                    }
                }
                drop(stream);
                if !config.manual {
                    scheduler::pause(config.interval).await;
                }
            }
        });
        *start_task.lock() = handle;
    };

    let stop_task = Arc::clone(&task);
    let stop_controller = Arc::clone(&controller);
    let stop = move || {
        stop_task.lock().cancel();
        let abort = stop_controller.lock().take();
        if let Some(abort) = abort {
            abort.abort("source stopped");
        }
    };

    stream.install(
        Hooks::new()
            .on_start(start)
            .on_stop(stop)
            .on_dispose(move |reason| {
                task.lock().cancel();
                let abort = controller.lock().take();
                if let Some(abort) = abort {
                    abort.abort(reason);
                }
            }),
    );

    if let Some(signal) = &options.signal {
        let weak = stream.downgrade();
        signal.on_abort(move |reason| {
            if let Some(stream) = weak.upgrade() {
                stream.dispose(&RxError::Cancelled(reason.clone()).to_string());
            }
        });
    }

    FunctionSource { stream, trigger }
}

/// Poll a plain synchronous function
pub fn from_sync_function<T, F>(f: F, options: FunctionOptions) -> FunctionSource<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    let f = Arc::new(f);
    from_function(
        move |_| {
            let value = f();
            async move { Ok::<T, std::convert::Infallible>(value) }
        },
        options,
    )
}
