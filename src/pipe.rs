//! Stream-to-stream stages that can be stored, shared and chained
//! before they are attached to a source.

use std::sync::Arc;

use crate::ops;
use crate::stream::RxStream;

/// Operator chain taking a stream of `I` to a stream of `O`
pub struct Pipe<I, O> {
    build: Arc<dyn Fn(&RxStream<I>) -> RxStream<O> + Send + Sync + 'static>,
}

impl<I, O> Clone for Pipe<I, O> {
    fn clone(&self) -> Self {
        Pipe {
            build: Arc::clone(&self.build),
        }
    }
}

impl<I, O> Pipe<I, O> {
    /// `build` is called once per [`Pipe::apply`] and must wire up fresh operators each time
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&RxStream<I>) -> RxStream<O> + Send + Sync + 'static,
    {
        Pipe {
            build: Arc::new(build),
        }
    }

    /// Attach the chain to `input`, returning the chain's last stream
    pub fn apply(&self, input: &RxStream<I>) -> RxStream<O> {
        (self.build)(input)
    }
}

/// [`ops::transform`] as a pipe
pub fn map<I, O, F>(f: F) -> Pipe<I, O>
where
    F: Fn(I) -> O + Send + Sync + Clone + 'static,
    I: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    Pipe::new(move |input| ops::transform(input, f.clone()))
}

/// [`ops::filter`] as a pipe
pub fn filter<I, F>(predicate: F) -> Pipe<I, I>
where
    F: Fn(&I) -> bool + Send + Sync + Clone + 'static,
    I: Clone + Send + Sync + 'static,
{
    Pipe::new(move |input| ops::filter(input, predicate.clone()))
}

/// `first` feeding `second`
pub fn compose<I, M, O>(first: Pipe<I, M>, second: Pipe<M, O>) -> Pipe<I, O>
where
    I: 'static,
    M: 'static,
    O: 'static,
{
    Pipe::new(move |input| second.apply(&first.apply(input)))
}

/// Hands back the input stream itself; no operator is added
pub fn identity<I>() -> Pipe<I, I>
where
    I: 'static,
{
    Pipe::new(|input: &RxStream<I>| input.clone())
}

/// Method form of [`compose`]
pub trait PipeExt<I, O> {
    fn compose<P>(self, next: Pipe<O, P>) -> Pipe<I, P>
    where
        P: 'static;
}

impl<I, O> PipeExt<I, O> for Pipe<I, O>
where
    I: 'static,
    O: 'static,
{
    fn compose<P>(self, next: Pipe<O, P>) -> Pipe<I, P>
    where
        P: 'static,
    {
        compose(self, next)
    }
}
