//! Binding a downstream stream to an upstream one.
//!
//! The downstream subscribes to its upstream when it starts and drops
//! that subscription when it stops or is disposed, so producer-side
//! resources follow the downstream's own subscribers. Values go through
//! the operator's `on_value`; non-terminal signals pass through as-is;
//! an upstream `done` disposes the downstream with the same context
//! unless the binding opts out.
//!
//! A downstream asking for [`Lazy::Initial`] on top of a [`Lazy::Very`]
//! source becomes `Very` itself, so the source is released as soon as the
//! end of the chain loses its last subscriber.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::message::{Message, Signal};
use crate::stream::{Hooks, RxStream, Subscription};
use crate::stream_configuration::{Lazy, StreamOptions, UpstreamOptions};

type ValueFn<In, Out> = Arc<dyn Fn(In, &RxStream<Out>) + Send + Sync>;
type DoneFn<Out> = Arc<dyn Fn(&Signal, &RxStream<Out>) + Send + Sync>;

/// Builder for an operator's downstream
pub struct Upstream<In, Out> {
    source: RxStream<In>,
    options: UpstreamOptions,
    on_value: ValueFn<In, Out>,
    on_start: Option<Box<dyn FnMut(&RxStream<Out>) + Send>>,
    on_stop: Option<Box<dyn FnMut() + Send>>,
    on_source_done: Option<DoneFn<Out>>,
    track_last: bool,
    initial: Option<Out>,
}

impl<In, Out> Upstream<In, Out>
where
    In: Clone + Send + Sync + 'static,
    Out: Clone + Send + Sync + 'static,
{
    pub fn new<F>(source: &RxStream<In>, options: UpstreamOptions, on_value: F) -> Self
    where
        F: Fn(In, &RxStream<Out>) + Send + Sync + 'static,
    {
        Self {
            source: source.clone(),
            options,
            on_value: Arc::new(on_value),
            on_start: None,
            on_stop: None,
            on_source_done: None,
            track_last: false,
            initial: None,
        }
    }

    /// Runs after the upstream subscription is in place
    pub fn on_start<F>(mut self, f: F) -> Self
    where
        F: FnMut(&RxStream<Out>) + Send + 'static,
    {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Runs after the upstream subscription is dropped
    pub fn on_stop<F>(mut self, f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_stop = Some(Box::new(f));
        self
    }

    /// Runs when the upstream sends `done`, before the downstream is disposed
    pub fn on_source_done<F>(mut self, f: F) -> Self
    where
        F: Fn(&Signal, &RxStream<Out>) + Send + Sync + 'static,
    {
        self.on_source_done = Some(Arc::new(f));
        self
    }

    pub fn track_last(mut self, initial: Option<Out>) -> Self {
        self.track_last = true;
        self.initial = initial;
        self
    }

    pub fn build(self) -> RxStream<Out> {
        let Upstream {
            source,
            options,
            on_value,
            mut on_start,
            mut on_stop,
            on_source_done,
            track_last,
            initial,
        } = self;

        let mut stream_options = StreamOptions::default()
            .lazy(inherit_lazy(options.lazy, [source.lazy()]))
            .label(options.label.clone())
            .track_last(track_last);
        stream_options.initial = initial;
        let downstream = RxStream::with_options(stream_options);

        let subscription: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let dispose_if_source_done = options.dispose_if_source_done;
        let label = options.label;

        let weak = downstream.downgrade();
        let start_subscription = Arc::clone(&subscription);
        let start = move || {
            let Some(downstream) = weak.upgrade() else {
                return;
            };
            let forward_to = downstream.downgrade();
            let on_value = Arc::clone(&on_value);
            let on_source_done = on_source_done.clone();
            let handler = move |message: &Message<In>| {
                let Some(downstream) = forward_to.upgrade() else {
                    return;
                };
                match message {
                    Message::Value(value) => on_value(value.clone(), &downstream),
                    Message::Signal(signal) if signal.is_done() => {
                        if let Some(on_source_done) = &on_source_done {
                            on_source_done(signal, &downstream);
                        }
                        if dispose_if_source_done {
                            downstream.dispose(signal.context_str());
                        }
                    }
                    Message::Signal(signal) => downstream.forward(signal),
                }
            };
            match source.on(handler) {
                Ok(sub) => {
                    let previous = start_subscription.lock().replace(sub);
                    if let Some(previous) = previous {
                        previous.unsubscribe();
                    }
                    if downstream.is_disposed() {
                        let sub = start_subscription.lock().take();
                        if let Some(sub) = sub {
                            sub.unsubscribe();
                        }
                        return;
                    }
                }
                Err(err) => {
                    log::debug!("{}: upstream unavailable: {}", label, err);
                    downstream.dispose(&format!("upstream unavailable: {err}"));
                    return;
                }
            }
            if let Some(on_start) = on_start.as_mut() {
                if !downstream.is_disposed() {
                    on_start(&downstream);
                }
            }
        };

        let stop_subscription = Arc::clone(&subscription);
        let stop = move || {
            let sub = stop_subscription.lock().take();
            if let Some(sub) = sub {
                sub.unsubscribe();
            }
            if let Some(on_stop) = on_stop.as_mut() {
                on_stop();
            }
        };

        let dispose = move |_reason: &str| {
            let sub = subscription.lock().take();
            if let Some(sub) = sub {
                sub.unsubscribe();
            }
        };

        downstream.install(
            Hooks::new()
                .on_start(start)
                .on_stop(stop)
                .on_dispose(dispose),
        );
        downstream
    }
}

/// Bind `source` to a new downstream whose values come from `on_value`
pub fn init_upstream<In, Out, F>(
    source: &RxStream<In>,
    options: UpstreamOptions,
    on_value: F,
) -> RxStream<Out>
where
    In: Clone + Send + Sync + 'static,
    Out: Clone + Send + Sync + 'static,
    F: Fn(In, &RxStream<Out>) + Send + Sync + 'static,
{
    Upstream::new(source, options, on_value).build()
}

type MessageFn<In, Out> = Arc<dyn Fn(usize, &Message<In>, &RxStream<Out>) + Send + Sync>;

/// Builder for a downstream fed by several upstreams at once.
///
/// All sources are subscribed together when the downstream starts and
/// released together when it stops. Each message reaches `on_message`
/// with the index of the source it came from.
pub struct Joined<In, Out> {
    sources: Vec<RxStream<In>>,
    label: String,
    lazy: Lazy,
    on_message: MessageFn<In, Out>,
    on_start: Option<Box<dyn FnMut(&RxStream<Out>) + Send>>,
    on_stop: Option<Box<dyn FnMut() + Send>>,
}

impl<In, Out> Joined<In, Out>
where
    In: Clone + Send + Sync + 'static,
    Out: Clone + Send + Sync + 'static,
{
    pub fn new<F>(sources: &[RxStream<In>], label: impl Into<String>, on_message: F) -> Self
    where
        F: Fn(usize, &Message<In>, &RxStream<Out>) + Send + Sync + 'static,
    {
        Self {
            sources: sources.to_vec(),
            label: label.into(),
            lazy: Lazy::Initial,
            on_message: Arc::new(on_message),
            on_start: None,
            on_stop: None,
        }
    }

    pub fn lazy(mut self, lazy: Lazy) -> Self {
        self.lazy = lazy;
        self
    }

    /// Runs after every source is subscribed
    pub fn on_start<F>(mut self, f: F) -> Self
    where
        F: FnMut(&RxStream<Out>) + Send + 'static,
    {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Runs after every source is released
    pub fn on_stop<F>(mut self, f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_stop = Some(Box::new(f));
        self
    }

    pub fn build(self) -> RxStream<Out> {
        let Joined {
            sources,
            label,
            lazy,
            on_message,
            mut on_start,
            mut on_stop,
        } = self;

        let lazy = inherit_lazy(lazy, sources.iter().map(RxStream::lazy));
        let downstream =
            RxStream::with_options(StreamOptions::default().lazy(lazy).label(label.clone()));
        let subscriptions: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));

        let weak = downstream.downgrade();
        let start_subscriptions = Arc::clone(&subscriptions);
        let start = move || {
            let Some(downstream) = weak.upgrade() else {
                return;
            };
            for (index, source) in sources.iter().enumerate() {
                let forward_to = downstream.downgrade();
                let on_message = Arc::clone(&on_message);
                let subscribed = source.on(move |message| {
                    if let Some(downstream) = forward_to.upgrade() {
                        on_message(index, message, &downstream);
                    }
                });
                match subscribed {
                    Ok(sub) => start_subscriptions.lock().push(sub),
                    Err(err) => {
                        log::debug!("{}: source {} unavailable: {}", label, index, err);
                        downstream.dispose(&format!("source {index} unavailable: {err}"));
                    }
                }
                if downstream.is_disposed() {
                    release_all(&start_subscriptions);
                    return;
                }
            }
            if let Some(on_start) = on_start.as_mut() {
                on_start(&downstream);
            }
        };

        let stop_subscriptions = Arc::clone(&subscriptions);
        let stop = move || {
            release_all(&stop_subscriptions);
            if let Some(on_stop) = on_stop.as_mut() {
                on_stop();
            }
        };

        downstream.install(
            Hooks::new()
                .on_start(start)
                .on_stop(stop)
                .on_dispose(move |_| release_all(&subscriptions)),
        );
        downstream
    }
}

fn inherit_lazy(requested: Lazy, upstream: impl IntoIterator<Item = Lazy>) -> Lazy {
    match requested {
        Lazy::Initial if upstream.into_iter().any(|lazy| lazy == Lazy::Very) => Lazy::Very,
        requested => requested,
    }
}

fn release_all(subscriptions: &Mutex<Vec<Subscription>>) {
    let released = std::mem::take(&mut *subscriptions.lock());
    for sub in released {
        sub.unsubscribe();
    }
}
