//! Operators that attach or remember state alongside each value
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::binder::{init_upstream, Upstream};
use crate::stream::RxStream;
use crate::stream_configuration::{Lazy, UpstreamOptions};

/// A value paired with something computed from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotated<T, A> {
    pub value: T,
    pub annotation: A,
}

/// Emit each value together with `f(value)`
pub fn annotate<T, A, F>(source: &RxStream<T>, f: F) -> RxStream<Annotated<T, A>>
where
    T: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
    F: Fn(&T) -> A + Send + Sync + 'static,
{
    init_upstream(source, UpstreamOptions::labelled("annotate"), move |value, downstream| {
        let annotation = f(&value);
        let _ = downstream.set(Annotated { value, annotation });
    })
}

/// Keep the most recent value readable through [`RxStream::last`].
///
/// The upstream is subscribed immediately so the cache stays current
/// even while nothing subscribes downstream.
pub fn with_value<T>(source: &RxStream<T>, initial: Option<T>) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    Upstream::new(
        source,
        UpstreamOptions::labelled("with_value").lazy(Lazy::Never),
        |value, downstream: &RxStream<T>| {
            let _ = downstream.set(value);
        },
    )
    .track_last(initial)
    .build()
}

/// Emit `f(previous, current)`, where `previous` is the last emitted value.
/// The first value passes through unchanged.
pub fn compute_with_previous<T, F>(source: &RxStream<T>, f: F) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&T, &T) -> T + Send + Sync + 'static,
{
    let previous: Mutex<Option<T>> = Mutex::new(None);
    init_upstream(
        source,
        UpstreamOptions::labelled("compute_with_previous"),
        move |value, downstream| {
            let next = {
                let mut previous = previous.lock();
                let next = match previous.as_ref() {
                    Some(prev) => f(prev, &value),
                    None => value,
                };
                *previous = Some(next.clone());
                next
            };
            let _ = downstream.set(next);
        },
    )
}
