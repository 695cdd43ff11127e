use futures_util::stream::BoxStream;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{RxError, RxResult};
use crate::sources::{from_array, from_async_iterable, from_iterator, from_sync_function};
use crate::stream::RxStream;
use crate::stream_configuration::{ArrayOptions, FunctionOptions, IterableOptions};

/// Every input shape that can be turned into a stream
pub enum Source<T> {
    Array(Vec<T>),
    Function(Arc<dyn Fn() -> T + Send + Sync>),
    Iterable(Box<dyn Iterator<Item = T> + Send>),
    AsyncIterable(BoxStream<'static, T>),
    Stream(RxStream<T>),
}

impl<T> Source<T> {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Source::Function(Arc::new(f))
    }

    pub fn iterable<I>(iterable: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Source::Iterable(Box::new(iterable.into_iter()))
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Source::Array(_) => "array",
            Source::Function(_) => "function",
            Source::Iterable(_) => "iterable",
            Source::AsyncIterable(_) => "async iterable",
            Source::Stream(_) => "stream",
        }
    }
}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Source::{}", self.shape())
    }
}

impl<T> From<Vec<T>> for Source<T> {
    fn from(items: Vec<T>) -> Self {
        Source::Array(items)
    }
}

impl<T> From<RxStream<T>> for Source<T> {
    fn from(stream: RxStream<T>) -> Self {
        Source::Stream(stream)
    }
}

impl<T> From<BoxStream<'static, T>> for Source<T> {
    fn from(stream: BoxStream<'static, T>) -> Self {
        Source::AsyncIterable(stream)
    }
}

fn json_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Dynamic values resolve only when they are arrays
impl TryFrom<Value> for Source<Value> {
    type Error = RxError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(items) => Ok(Source::Array(items)),
            other => Err(RxError::UnsupportedSource(format!(
                "cannot make a stream from a JSON {}",
                json_shape(&other)
            ))),
        }
    }
}

/// Per-shape options used while resolving
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub array: ArrayOptions,
    pub function: FunctionOptions,
    pub iterable: IterableOptions,
}

/// Turn any [`Source`] into a stream. Existing streams come back unchanged.
pub fn resolve_source<T, S>(source: S, options: &ResolveOptions) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
    S: Into<Source<T>>,
{
    let source = source.into();
    log::trace!("resolving {} source", source.shape());
    match source {
        Source::Array(items) => from_array(items, options.array.clone()),
        Source::Function(f) => from_sync_function(move || f(), options.function.clone()).stream(),
        Source::Iterable(iter) => from_iterator(iter, options.iterable.clone()),
        Source::AsyncIterable(stream) => from_async_iterable(stream, options.iterable.clone()),
        Source::Stream(stream) => stream,
    }
}

/// Resolve a dynamically-typed value, failing for shapes that are not sources
pub fn resolve_json(value: Value, options: &ResolveOptions) -> RxResult<RxStream<Value>> {
    let source = Source::try_from(value)?;
    Ok(resolve_source(source, options))
}
