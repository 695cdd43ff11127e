//! Per-value mapping and side effects
use std::fmt;

use crate::binder::init_upstream;
use crate::error::RxError;
use crate::stream::RxStream;
use crate::stream_configuration::{TransformOptions, UpstreamOptions};

/// Map each value through `f`
pub fn transform<In, Out, F>(source: &RxStream<In>, f: F) -> RxStream<Out>
where
    In: Clone + Send + Sync + 'static,
    Out: Clone + Send + Sync + 'static,
    F: Fn(In) -> Out + Send + Sync + 'static,
{
    init_upstream(source, UpstreamOptions::labelled("transform"), move |value, downstream| {
        let _ = downstream.set(f(value));
    })
}

/// Map each value through a fallible `f`.
///
/// A failure closes the stream with the error text as the `done`
/// context, or becomes a `warn` signal when `close_on_error` is off.
pub fn try_transform<In, Out, E, F>(
    source: &RxStream<In>,
    f: F,
    options: TransformOptions,
) -> RxStream<Out>
where
    In: Clone + Send + Sync + 'static,
    Out: Clone + Send + Sync + 'static,
    E: fmt::Display,
    F: Fn(In) -> Result<Out, E> + Send + Sync + 'static,
{
    let close_on_error = options.close_on_error;
    init_upstream(source, options.upstream, move |value, downstream| match f(value) {
        Ok(out) => {
            let _ = downstream.set(out);
        }
        Err(err) if close_on_error => {
            log::debug!("{}: closing after error: {}", downstream.label(), err);
            downstream.dispose(&RxError::Operator(err.to_string()).to_string());
        }
        Err(err) => {
            log::warn!("{}: {}", downstream.label(), err);
            let _ = downstream.warn(err.to_string());
        }
    })
}

/// Run `f` for its side effect and pass the value on
pub fn tap<T, F>(source: &RxStream<T>, f: F) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&T) + Send + Sync + 'static,
{
    init_upstream(source, UpstreamOptions::labelled("tap"), move |value, downstream| {
        f(&value);
        let _ = downstream.set(value);
    })
}
