use futures_core::Stream;
use futures_util::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::RxError;
use crate::scheduler::{self, Scheduler, TimerHandle};
use crate::stream::{Hooks, RxStream};
use crate::stream_configuration::{IterableOptions, StreamOptions};

/// Drain an async iterable into a stream.
///
/// One item is read every `interval`. A read that takes longer than
/// `read_timeout` disposes the stream. Stopping and restarting resumes
/// from where reading left off.
pub fn from_async_iterable<T, S>(iterable: S, options: IterableOptions) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
    S: Stream<Item = T> + Send + 'static,
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
    let reader: Arc<tokio::sync::Mutex<BoxStream<'static, T>>> =
        Arc::new(tokio::sync::Mutex::new(iterable.boxed()));
    let task = Arc::new(Mutex::new(TimerHandle::idle()));

    let weak = stream.downgrade();
    let start_task = Arc::clone(&task);
    let IterableOptions {
        interval,
        read_timeout,
        label,
        ..
    } = options.clone();
    let start = move || {
        let weak = weak.clone();
        let reader = Arc::clone(&reader);
        let label = label.clone();
        let handle = scheduler.spawn(async move {
            loop {
                scheduler::pause(interval).await;
                let next = {
                    let mut reader = reader.lock().await;
                    tokio::time::timeout(read_timeout, reader.next()).await
                };
                let Some(stream) = weak.upgrade() else {
                    break;
                };
                match next {
                    Ok(Some(value)) => {
                        if stream.set(value).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        stream.dispose("iterable complete");
                        break;
                    }
                    Err(_) => {
                        log::warn!("{}: read timed out after {:?}", label, read_timeout);
                        stream.dispose(&RxError::Timeout(read_timeout).to_string());
                        break;
                    }
                }
            }
        });
        *start_task.lock() = handle;
    };

    let stop_task = Arc::clone(&task);
    stream.install(
        Hooks::new()
            .on_start(start)
            .on_stop(move || stop_task.lock().cancel())
            .on_dispose(move |_| task.lock().cancel()),
    );

    if let Some(signal) = &options.signal {
        let weak = stream.downgrade();
        signal.on_abort(move |reason| {
            if let Some(stream) = weak.upgrade() {
                stream.dispose(&RxError::Cancelled(reason.clone()).to_string());
            }
        });
    }

    stream
}

/// Drain a synchronous iterator into a stream
pub fn from_iterator<T, I>(iterable: I, options: IterableOptions) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
{
    from_async_iterable(stream::iter(iterable), options)
}
