//! Combinators over several upstream streams
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::binder::Joined;
use crate::error::RxError;
use crate::message::{Message, Signal};
use crate::scheduler::{self, Scheduler, TimerHandle};
use crate::stream::RxStream;
use crate::stream_configuration::{CombineLatestOptions, FinalValue, OnSourceDone, SyncOptions};

struct LatestSlots<T> {
    slots: Vec<Option<T>>,
    done: Vec<bool>,
}

impl<T> LatestSlots<T> {
    fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| None).collect(),
            done: vec![false; len],
        }
    }

    /// Mark a source finished, returning true when all of them are
    fn finish(&mut self, index: usize) -> bool {
        self.done[index] = true;
        self.done.iter().all(|done| *done)
    }
}

fn combine_latest_with<T, Out, F>(
    sources: &[RxStream<T>],
    label: &str,
    options: CombineLatestOptions,
    assemble: F,
) -> RxStream<Out>
where
    T: Clone + Send + Sync + 'static,
    Out: Clone + Send + Sync + 'static,
    F: Fn(Vec<T>) -> Out + Send + Sync + 'static,
{
    let state = Mutex::new(LatestSlots::<T>::new(sources.len()));
    Joined::new(sources, label, move |index, message, downstream: &RxStream<Out>| {
        match message {
            Message::Value(value) => {
                let snapshot = {
                    let mut state = state.lock();
                    state.slots[index] = Some(value.clone());
                    state.slots.iter().cloned().collect::<Option<Vec<T>>>()
                };
                if let Some(snapshot) = snapshot {
                    let _ = downstream.set(assemble(snapshot));
                }
            }
            Message::Signal(signal) if signal.is_done() => {
                on_source_finished(&state, index, signal, options.on_source_done, downstream)
            }
            Message::Signal(signal) => downstream.forward(signal),
        }
    })
    .build()
}

fn on_source_finished<T, Out>(
    state: &Mutex<LatestSlots<T>>,
    index: usize,
    signal: &Signal,
    policy: OnSourceDone,
    downstream: &RxStream<Out>,
) where
    Out: Clone + Send + Sync + 'static,
{
    match policy {
        OnSourceDone::Break => downstream.dispose(signal.context_str()),
        OnSourceDone::Allow => {
            let all_done = state.lock().finish(index);
            if all_done {
                downstream.dispose("all sources done");
            }
        }
    }
}

/// Emit the latest value of every source whenever any of them emits.
///
/// Nothing is emitted until each source has produced at least one value.
pub fn combine_latest_to_array<T>(
    sources: &[RxStream<T>],
    options: CombineLatestOptions,
) -> RxStream<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    combine_latest_with(sources, "combine_latest", options, |values| values)
}

/// Keyed form of [`combine_latest_to_array`]
pub fn combine_latest_to_object<T>(
    sources: Vec<(String, RxStream<T>)>,
    options: CombineLatestOptions,
) -> RxStream<BTreeMap<String, T>>
where
    T: Clone + Send + Sync + 'static,
{
    let (keys, streams): (Vec<String>, Vec<RxStream<T>>) = sources.into_iter().unzip();
    combine_latest_with(&streams, "combine_latest_object", options, move |values| {
        keys.iter().cloned().zip(values).collect()
    })
}

struct SyncSlots<T> {
    slots: Vec<Option<T>>,
    latest: Vec<Option<T>>,
    fresh: Vec<bool>,
    done: Vec<bool>,
}

impl<T: Clone> SyncSlots<T> {
    fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| None).collect(),
            latest: (0..len).map(|_| None).collect(),
            fresh: vec![false; len],
            done: vec![false; len],
        }
    }

    /// Take a joint emission if every live source has a fresh value.
    /// Finished sources always count as fresh.
    fn take_ready(&mut self) -> Option<Vec<Option<T>>> {
        let live: Vec<usize> = (0..self.done.len()).filter(|i| !self.done[*i]).collect();
        if live.is_empty() || live.iter().any(|i| !self.fresh[*i]) {
            return None;
        }
        let snapshot = self.slots.clone();
        for i in live {
            self.slots[i] = None;
            self.fresh[i] = false;
        }
        Some(snapshot)
    }
}

fn arm_watchdog<Out>(
    scheduler: Option<&Scheduler>,
    timer: &Mutex<TimerHandle>,
    downstream: &RxStream<Out>,
    wait: Duration,
) where
    Out: Clone + Send + Sync + 'static,
{
    let Some(scheduler) = scheduler else {
        return;
    };
    let weak = downstream.downgrade();
    *timer.lock() = scheduler.schedule(wait, move || {
        if let Some(downstream) = weak.upgrade() {
            log::warn!("{}: no joint value within {:?}", downstream.label(), wait);
            downstream.dispose(&RxError::Timeout(wait).to_string());
        }
    });
}

/// Emit one value from each source once all of them have produced a
/// fresh value since the previous emission.
///
/// Slots are cleared after every emission. A watchdog disposes the
/// stream when no emission happens within `maximum_wait`; a zero wait
/// disables it. With [`OnSourceDone::Allow`] a finished source counts as
/// fresh from then on, contributing its last value or `None` according
/// to `final_value`.
pub fn sync_to_array<T>(sources: &[RxStream<T>], options: SyncOptions) -> RxStream<Vec<Option<T>>>
where
    T: Clone + Send + Sync + 'static,
{
    let SyncOptions {
        on_source_done,
        final_value,
        maximum_wait,
    } = options;
    // a zero wait has no watchdog and so needs no runtime
    let scheduler = if maximum_wait.is_zero() {
        None
    } else {
        match Scheduler::current() {
            Ok(scheduler) => Some(scheduler),
            Err(err) => return scheduler::unscheduled("sync", err),
        }
    };
    let start_scheduler = scheduler.clone();
    let state = Mutex::new(SyncSlots::<T>::new(sources.len()));
    let watchdog = Arc::new(Mutex::new(TimerHandle::idle()));
    let message_watchdog = Arc::clone(&watchdog);
    let start_watchdog = Arc::clone(&watchdog);

    Joined::new(
        sources,
        "sync",
        move |index, message, downstream: &RxStream<Vec<Option<T>>>| {
            let ready = match message {
                Message::Value(value) => {
                    let mut state = state.lock();
                    state.slots[index] = Some(value.clone());
                    state.latest[index] = Some(value.clone());
                    state.fresh[index] = true;
                    state.take_ready()
                }
                Message::Signal(signal) if signal.is_done() => match on_source_done {
                    OnSourceDone::Break => {
                        downstream.dispose(signal.context_str());
                        return;
                    }
                    OnSourceDone::Allow => {
                        let mut state = state.lock();
                        state.done[index] = true;
                        let retained = match final_value {
                            FinalValue::Last => state.latest[index].clone(),
                            FinalValue::Undefined => None,
                        };
                        state.slots[index] = retained;
                        state.take_ready()
                    }
                },
                Message::Signal(signal) => {
                    downstream.forward(signal);
                    return;
                }
            };
            if let Some(ready) = ready {
                arm_watchdog(scheduler.as_ref(), &message_watchdog, downstream, maximum_wait);
                let _ = downstream.set(ready);
            }
            if !downstream.is_disposed() && state.lock().done.iter().all(|done| *done) {
                downstream.dispose("all sources done");
            }
        },
    )
    .on_start(move |downstream| {
        arm_watchdog(start_scheduler.as_ref(), &start_watchdog, downstream, maximum_wait)
    })
    .on_stop(move || watchdog.lock().cancel())
    .build()
}

/// Forward every value from every source in arrival order.
/// Closes once all sources are done.
pub fn merged<T>(sources: &[RxStream<T>]) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    let state = Mutex::new(LatestSlots::<T>::new(sources.len()));
    Joined::new(sources, "merged", move |index, message, downstream: &RxStream<T>| {
        match message {
            Message::Value(value) => {
                let _ = downstream.set(value.clone());
            }
            Message::Signal(signal) if signal.is_done() => {
                on_source_finished(&state, index, signal, OnSourceDone::Allow, downstream)
            }
            Message::Signal(signal) => downstream.forward(signal),
        }
    })
    .build()
}
