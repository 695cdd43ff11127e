//! Fluent chaining over streams: `wrap(source).filter(..).debounce(..)`.
use futures_util::stream::BoxStream;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::RxResult;
use crate::message::Message;
use crate::ops::{self, Annotated, Case, Fallback};
use crate::pipe::Pipe;
use crate::sinks;
use crate::sources::{resolve_source, Pingable, ResolveOptions, Source};
use crate::stream::{RxStream, Subscription};
use crate::stream_configuration::{
    ChunkOptions, CombineLatestOptions, RankOptions, SwitchMatch, SyncOptions, TimeoutOptions,
    ToArrayOptions, TransformOptions,
};

/// Resolve `source` and wrap it for chaining
pub fn wrap<T, S>(source: S) -> Wrapped<T>
where
    T: Clone + Send + Sync + 'static,
    S: Into<Source<T>>,
{
    Wrapped::new(resolve_source(source, &ResolveOptions::default()))
}

/// A stream with every operator and sink available as a method
pub struct Wrapped<T> {
    stream: RxStream<T>,
}

impl<T> Clone for Wrapped<T> {
    fn clone(&self) -> Self {
        Self {
            stream: self.stream.clone(),
        }
    }
}

impl<T> fmt::Debug for Wrapped<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Wrapped").field(&self.stream).finish()
    }
}

impl<T> From<Wrapped<T>> for RxStream<T> {
    fn from(wrapped: Wrapped<T>) -> Self {
        wrapped.stream
    }
}

impl<T> Wrapped<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(stream: RxStream<T>) -> Self {
        Self { stream }
    }

    /// The underlying stream
    pub fn stream(&self) -> &RxStream<T> {
        &self.stream
    }

    pub fn into_stream(self) -> RxStream<T> {
        self.stream
    }

    pub fn on<F>(&self, handler: F) -> RxResult<Subscription>
    where
        F: Fn(&Message<T>) + Send + Sync + 'static,
    {
        self.stream.on(handler)
    }

    pub fn on_value<F>(&self, handler: F) -> RxResult<Subscription>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.stream.on_value(handler)
    }

    pub fn dispose(&self, reason: &str) {
        self.stream.dispose(reason);
    }

    pub fn through<O>(self, pipe: &Pipe<T, O>) -> Wrapped<O>
    where
        O: Clone + Send + Sync + 'static,
    {
        Wrapped::new(pipe.apply(&self.stream))
    }

    pub fn transform<O, F>(self, f: F) -> Wrapped<O>
    where
        O: Clone + Send + Sync + 'static,
        F: Fn(T) -> O + Send + Sync + 'static,
    {
        Wrapped::new(ops::transform(&self.stream, f))
    }

    pub fn try_transform<O, E, F>(self, f: F, options: TransformOptions) -> Wrapped<O>
    where
        O: Clone + Send + Sync + 'static,
        E: fmt::Display,
        F: Fn(T) -> Result<O, E> + Send + Sync + 'static,
    {
        Wrapped::new(ops::try_transform(&self.stream, f, options))
    }

    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Wrapped::new(ops::filter(&self.stream, predicate))
    }

    pub fn drop<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Wrapped::new(ops::drop(&self.stream, predicate))
    }

    pub fn tap<F>(self, f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Wrapped::new(ops::tap(&self.stream, f))
    }

    pub fn annotate<A, F>(self, f: F) -> Wrapped<Annotated<T, A>>
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(&T) -> A + Send + Sync + 'static,
    {
        Wrapped::new(ops::annotate(&self.stream, f))
    }

    pub fn with_value(self, initial: Option<T>) -> Self {
        Wrapped::new(ops::with_value(&self.stream, initial))
    }

    pub fn compute_with_previous<F>(self, f: F) -> Self
    where
        F: Fn(&T, &T) -> T + Send + Sync + 'static,
    {
        Wrapped::new(ops::compute_with_previous(&self.stream, f))
    }

    pub fn debounce(self, window: Duration) -> Self {
        Wrapped::new(ops::debounce(&self.stream, window))
    }

    pub fn throttle(self, window: Duration) -> Self {
        Wrapped::new(ops::throttle(&self.stream, window))
    }

    pub fn chunk(self, options: ChunkOptions) -> RxResult<Wrapped<Vec<T>>> {
        ops::chunk(&self.stream, options).map(Wrapped::new)
    }

    pub fn timeout_value(self, fallback: Fallback<T>, options: TimeoutOptions) -> Self {
        Wrapped::new(ops::timeout_value(&self.stream, fallback, options))
    }

    pub fn timeout_ping(self, target: Arc<dyn Pingable>, options: TimeoutOptions) -> Self {
        Wrapped::new(ops::timeout_ping(&self.stream, target, options))
    }

    /// Combine with `others`, this stream taking the first slot
    pub fn combine_latest(
        self,
        others: &[RxStream<T>],
        options: CombineLatestOptions,
    ) -> Wrapped<Vec<T>> {
        let sources = self.with_others(others);
        Wrapped::new(ops::combine_latest_to_array(&sources, options))
    }

    /// Synchronise with `others`, this stream taking the first slot
    pub fn sync(self, others: &[RxStream<T>], options: SyncOptions) -> Wrapped<Vec<Option<T>>> {
        let sources = self.with_others(others);
        Wrapped::new(ops::sync_to_array(&sources, options))
    }

    pub fn merge(self, others: &[RxStream<T>]) -> Self {
        let sources = self.with_others(others);
        Wrapped::new(ops::merged(&sources))
    }

    pub fn split(self, quantity: usize) -> Vec<Wrapped<T>> {
        ops::split(&self.stream, quantity)
            .into_iter()
            .map(Wrapped::new)
            .collect()
    }

    pub fn switcher(
        self,
        cases: Vec<Case<T>>,
        matching: SwitchMatch,
    ) -> HashMap<String, Wrapped<T>> {
        ops::switcher(&self.stream, cases, matching)
            .into_iter()
            .map(|(name, stream)| (name, Wrapped::new(stream)))
            .collect()
    }

    pub fn tally(self) -> Wrapped<u64> {
        Wrapped::new(ops::tally(&self.stream))
    }

    pub fn rank<F>(self, compare: F, options: RankOptions) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Wrapped::new(ops::rank(&self.stream, compare, options))
    }

    pub async fn to_array(&self, options: ToArrayOptions<T>) -> RxResult<Vec<T>> {
        sinks::to_array(&self.stream, options).await
    }

    pub fn to_generator(&self) -> RxResult<BoxStream<'static, T>> {
        sinks::to_generator(&self.stream)
    }

    fn with_others(self, others: &[RxStream<T>]) -> Vec<RxStream<T>> {
        std::iter::once(self.stream).chain(others.iter().cloned()).collect()
    }
}

impl Wrapped<f64> {
    pub fn min(self) -> Self {
        Wrapped::new(ops::min(&self.stream))
    }

    pub fn max(self) -> Self {
        Wrapped::new(ops::max(&self.stream))
    }

    pub fn sum(self) -> Self {
        Wrapped::new(ops::sum(&self.stream))
    }

    pub fn average(self) -> Self {
        Wrapped::new(ops::average(&self.stream))
    }
}

impl Wrapped<Value> {
    pub fn field(self, path: &str, fallback: Option<Value>) -> Self {
        Wrapped::new(ops::field(&self.stream, path, fallback))
    }
}

impl<T> Wrapped<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn tally_items(self) -> Wrapped<u64> {
        Wrapped::new(ops::tally_items(&self.stream))
    }
}
