//! One upstream feeding several independent downstreams.
//!
//! The upstream is subscribed while at least one downstream is active
//! and released when the last one stops, so disposing one output never
//! interrupts its siblings.
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::message::Message;
use crate::stream::{Hooks, RxStream, Subscription, WeakRxStream};
use crate::stream_configuration::{Lazy, StreamOptions, SwitchMatch};

/// Positional outputs; `None` where an output has been dropped
type Router<T> = Arc<dyn Fn(&T, &[Option<RxStream<T>>]) + Send + Sync>;

struct FanOut<T> {
    source: RxStream<T>,
    outputs: Mutex<Vec<WeakRxStream<T>>>,
    attached: Mutex<usize>,
    subscription: Mutex<Option<Subscription>>,
    route: Router<T>,
}

impl<T> FanOut<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn live_outputs(&self) -> Vec<Option<RxStream<T>>> {
        self.outputs.lock().iter().map(WeakRxStream::upgrade).collect()
    }

    fn attach(self: &Arc<Self>) {
        let first = {
            let mut attached = self.attached.lock();
            *attached += 1;
            *attached == 1
        };
        if !first {
            return;
        }
        log::debug!("{}: fan-out attached", self.source.label());
        let fan_out: Weak<Self> = Arc::downgrade(self);
        let subscribed = self.source.on(move |message| {
            let Some(fan_out) = fan_out.upgrade() else {
                return;
            };
            fan_out.deliver(message);
        });
        match subscribed {
            Ok(sub) => *self.subscription.lock() = Some(sub),
            Err(err) => {
                for output in self.live_outputs().into_iter().flatten() {
                    output.dispose(&format!("upstream unavailable: {err}"));
                }
            }
        }
    }

    fn detach(&self) {
        let last = {
            let mut attached = self.attached.lock();
            *attached = attached.saturating_sub(1);
            *attached == 0
        };
        if last {
            log::debug!("{}: fan-out detached", self.source.label());
            let sub = self.subscription.lock().take();
            if let Some(sub) = sub {
                sub.unsubscribe();
            }
        }
    }

    fn deliver(&self, message: &Message<T>) {
        let outputs = self.live_outputs();
        match message {
            Message::Value(value) => (self.route)(value, &outputs),
            Message::Signal(signal) => {
                for output in outputs.into_iter().flatten() {
                    output.forward(signal);
                }
            }
        }
    }
}

fn fan_out<T>(source: &RxStream<T>, labels: Vec<String>, route: Router<T>) -> Vec<RxStream<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let core = Arc::new(FanOut {
        source: source.clone(),
        outputs: Mutex::new(Vec::new()),
        attached: Mutex::new(0),
        subscription: Mutex::new(None),
        route,
    });
    let outputs: Vec<RxStream<T>> = labels
        .into_iter()
        .map(|label| {
            RxStream::with_options(StreamOptions::default().lazy(Lazy::Initial).label(label))
        })
        .collect();
    *core.outputs.lock() = outputs.iter().map(RxStream::downgrade).collect();

    for output in &outputs {
        let start_core = Arc::clone(&core);
        let stop_core = Arc::clone(&core);
        output.install(
            Hooks::new()
                .on_start(move || start_core.attach())
                .on_stop(move || stop_core.detach()),
        );
    }
    outputs
}

/// Copy every value of `source` into `quantity` independent streams
pub fn split<T>(source: &RxStream<T>, quantity: usize) -> Vec<RxStream<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let labels = (0..quantity).map(|i| format!("split:{i}")).collect();
    fan_out(source, labels, Arc::new(broadcast::<T>))
}

/// Like [`split`], with the outputs keyed by label
pub fn split_labelled<T>(source: &RxStream<T>, labels: &[&str]) -> HashMap<String, RxStream<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let labels: Vec<String> = labels.iter().map(|label| label.to_string()).collect();
    let outputs = fan_out(source, labels.clone(), Arc::new(broadcast::<T>));
    labels.into_iter().zip(outputs).collect()
}

fn broadcast<T>(value: &T, outputs: &[Option<RxStream<T>>])
where
    T: Clone + Send + Sync + 'static,
{
    for output in outputs.iter().flatten() {
        let _ = output.set(value.clone());
    }
}

/// A named predicate for [`switcher`]
pub type Case<T> = (String, Arc<dyn Fn(&T) -> bool + Send + Sync>);

/// Route each value to the output of the first matching case, or of every
/// matching case with [`SwitchMatch::All`]. Unmatched values are dropped.
pub fn switcher<T>(
    source: &RxStream<T>,
    cases: Vec<Case<T>>,
    matching: SwitchMatch,
) -> HashMap<String, RxStream<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let (names, predicates): (Vec<String>, Vec<_>) = cases.into_iter().unzip();
    let labels = names.iter().map(|name| format!("switch:{name}")).collect();
    let route: Router<T> = Arc::new(move |value: &T, outputs: &[Option<RxStream<T>>]| {
        for (predicate, output) in predicates.iter().zip(outputs) {
            if predicate(value) {
                if let Some(output) = output {
                    let _ = output.set(value.clone());
                }
                if matching == SwitchMatch::First {
                    break;
                }
            }
        }
    });
    let outputs = fan_out(source, labels, route);
    names.into_iter().zip(outputs).collect()
}
