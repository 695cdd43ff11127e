#![allow(dead_code)]

use parking_lot::Mutex;
use rxflow::{Message, RxStream, Signal, SignalKind, Subscription};
use std::sync::Arc;

/// Subscribes to a stream and keeps every message it receives
pub struct Recorder<T> {
    messages: Arc<Mutex<Vec<Message<T>>>>,
    pub subscription: Subscription,
}

impl<T> Recorder<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn attach(stream: &RxStream<T>) -> Self {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        let subscription = stream
            .on(move |message| sink.lock().push(message.clone()))
            .expect("stream should accept subscribers");
        Self {
            messages,
            subscription,
        }
    }

    pub fn values(&self) -> Vec<T> {
        self.messages
            .lock()
            .iter()
            .filter_map(|message| message.value().cloned())
            .collect()
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.messages
            .lock()
            .iter()
            .filter_map(|message| message.signal().cloned())
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.signals()
            .into_iter()
            .filter(|signal| signal.kind == SignalKind::Warn)
            .map(|signal| signal.context_str().to_string())
            .collect()
    }

    pub fn done_count(&self) -> usize {
        self.signals().iter().filter(|signal| signal.is_done()).count()
    }

    pub fn done_context(&self) -> Option<String> {
        self.signals()
            .into_iter()
            .find(|signal| signal.is_done())
            .map(|signal| signal.context_str().to_string())
    }

    /// True when the last message received was `done`
    pub fn done_is_last(&self) -> bool {
        self.messages.lock().last().is_some_and(|message| message.is_done())
    }

    pub fn unsubscribe(&self) {
        self.subscription.unsubscribe();
    }
}
