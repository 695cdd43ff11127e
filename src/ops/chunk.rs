//! Grouping values into arrays
use parking_lot::Mutex;
use std::sync::Arc;

use crate::binder::Upstream;
use crate::error::{RxError, RxResult};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::stream::RxStream;
use crate::stream_configuration::{ChunkOptions, UpstreamOptions};

struct ChunkState<T> {
    buffer: Vec<T>,
    timer: TimerHandle,
}

impl<T> ChunkState<T> {
    fn take(&mut self) -> Vec<T> {
        self.timer.cancel();
        std::mem::take(&mut self.buffer)
    }
}

/// Gather values into arrays.
///
/// A chunk is flushed when it holds `quantity` values or when `elapsed`
/// has passed since its first value, whichever comes first. At least one
/// of the two thresholds must be set.
pub fn chunk<T>(source: &RxStream<T>, options: ChunkOptions) -> RxResult<RxStream<Vec<T>>>
where
    T: Clone + Send + Sync + 'static,
{
    if options.quantity == 0 && options.elapsed.is_none() {
        return Err(RxError::InvalidConfig(
            "chunk needs a quantity or an elapsed threshold".to_string(),
        ));
    }
    // only a time threshold needs a runtime
    let scheduler = elapsed_scheduler(options.elapsed.is_some())?;
    let ChunkOptions {
        quantity,
        elapsed,
        return_remainder,
    } = options;

    let state = Arc::new(Mutex::new(ChunkState {
        buffer: Vec::new(),
        timer: TimerHandle::idle(),
    }));
    let value_state = Arc::clone(&state);
    let done_state = Arc::clone(&state);

    let stream = Upstream::new(
        source,
        UpstreamOptions::labelled("chunk"),
        move |value, downstream: &RxStream<Vec<T>>| {
            let full = {
                let mut state = value_state.lock();
                state.buffer.push(value);
                if quantity > 0 && state.buffer.len() >= quantity {
                    Some(state.take())
                } else {
                    if let (1, Some(elapsed), Some(scheduler)) =
                        (state.buffer.len(), elapsed, scheduler.as_ref())
                    {
                        let weak = downstream.downgrade();
                        let timed_state = Arc::clone(&value_state);
                        state.timer = scheduler.schedule(elapsed, move || {
                            let Some(downstream) = weak.upgrade() else {
                                return;
                            };
                            let flushed = std::mem::take(&mut timed_state.lock().buffer);
                            if !flushed.is_empty() {
                                let _ = downstream.set(flushed);
                            }
                        });
                    }
                    None
                }
            };
            if let Some(full) = full {
                let _ = downstream.set(full);
            }
        },
    )
    .on_source_done(move |_, downstream| {
        let remainder = done_state.lock().take();
        if return_remainder && !remainder.is_empty() {
            let _ = downstream.set(remainder);
        }
    })
    .on_stop(move || {
        state.lock().timer.cancel();
    })
    .build();
    Ok(stream)
}

fn elapsed_scheduler(timed: bool) -> RxResult<Option<Scheduler>> {
    if timed {
        Scheduler::current().map(Some)
    } else {
        Ok(None)
    }
}
