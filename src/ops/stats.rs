//! Running aggregates.
//!
//! Each operator keeps its state across the whole stream (no windows) and
//! emits the updated aggregate after every input that changes it.
use parking_lot::Mutex;
use std::cmp::Ordering;

use crate::binder::init_upstream;
use crate::stream::RxStream;
use crate::stream_configuration::{RankOptions, UpstreamOptions};

/// Fold every value into `state` with `step`; `Some` results are emitted
fn accumulate<In, Out, S, F>(source: &RxStream<In>, label: &str, state: S, step: F) -> RxStream<Out>
where
    In: Clone + Send + Sync + 'static,
    Out: Clone + Send + Sync + 'static,
    S: Send + 'static,
    F: Fn(&mut S, In) -> Option<Out> + Send + Sync + 'static,
{
    let state = Mutex::new(state);
    init_upstream(source, UpstreamOptions::labelled(label), move |value, downstream| {
        let emitted = step(&mut state.lock(), value);
        if let Some(emitted) = emitted {
            let _ = downstream.set(emitted);
        }
    })
}

/// Smallest value so far. NaN inputs are ignored.
pub fn min(source: &RxStream<f64>) -> RxStream<f64> {
    accumulate(source, "min", None::<f64>, |lowest, value| {
        if value.is_nan() {
            return None;
        }
        let next = lowest.map_or(value, |lowest| lowest.min(value));
        *lowest = Some(next);
        Some(next)
    })
}

/// Largest value so far. NaN inputs are ignored.
pub fn max(source: &RxStream<f64>) -> RxStream<f64> {
    accumulate(source, "max", None::<f64>, |highest, value| {
        if value.is_nan() {
            return None;
        }
        let next = highest.map_or(value, |highest| highest.max(value));
        *highest = Some(next);
        Some(next)
    })
}

/// Running total. NaN inputs are ignored.
pub fn sum(source: &RxStream<f64>) -> RxStream<f64> {
    accumulate(source, "sum", 0.0_f64, |total, value| {
        if value.is_nan() {
            return None;
        }
        *total += value;
        Some(*total)
    })
}

/// Running mean. NaN inputs are ignored.
pub fn average(source: &RxStream<f64>) -> RxStream<f64> {
    accumulate(source, "average", (0.0_f64, 0_u64), |(total, count), value| {
        if value.is_nan() {
            return None;
        }
        *total += value;
        *count += 1;
        Some(*total / *count as f64)
    })
}

/// Number of values seen so far
pub fn tally<T>(source: &RxStream<T>) -> RxStream<u64>
where
    T: Clone + Send + Sync + 'static,
{
    accumulate(source, "tally", 0_u64, |count, _| {
        *count += 1;
        Some(*count)
    })
}

/// Number of items seen so far across array values
pub fn tally_items<T>(source: &RxStream<Vec<T>>) -> RxStream<u64>
where
    T: Clone + Send + Sync + 'static,
{
    accumulate(source, "tally_items", 0_u64, |count, items: Vec<T>| {
        *count += items.len() as u64;
        Some(*count)
    })
}

/// Emit the best value so far, as ordered by `compare`.
///
/// A value is emitted when `compare(value, best)` is `Greater`. Ties are
/// emitted with `emit_equal_ranked`; with `emit_repeat_highest` the
/// current best is re-emitted for values that do not beat it.
pub fn rank<T, F>(source: &RxStream<T>, compare: F, options: RankOptions) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    accumulate(source, "rank", None::<T>, move |best, value| {
        let Some(current) = best.as_ref() else {
            *best = Some(value.clone());
            return Some(value);
        };
        match compare(&value, current) {
            Ordering::Greater => {
                *best = Some(value.clone());
                Some(value)
            }
            Ordering::Equal if options.emit_equal_ranked => Some(value),
            _ if options.emit_repeat_highest => Some(current.clone()),
            _ => None,
        }
    })
}
