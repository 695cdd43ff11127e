use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::{DispatchId, DispatchList};
use crate::stream::{Hooks, RxStream};
use crate::stream_configuration::{Lazy, StreamOptions};

pub type EventListener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Anything listeners can be attached to by event name.
///
/// Removing a listener that is not attached must be a no-op.
pub trait EventTarget<E>: Send + Sync {
    fn add_listener(&self, name: &str, listener: EventListener<E>);
    fn remove_listener(&self, name: &str, listener: &EventListener<E>);
}

fn listener_key<E>(listener: &EventListener<E>) -> usize {
    Arc::as_ptr(listener) as *const () as usize
}

/// Plain named-event emitter
pub struct EventEmitter<E> {
    events: Mutex<HashMap<String, Arc<DispatchList<E>>>>,
    registered: Mutex<Vec<(String, usize, DispatchId)>>,
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
            registered: Mutex::new(Vec::new()),
        }
    }

    /// Deliver `event` to every listener of `name`
    pub fn fire(&self, name: &str, event: &E) {
        let list = self.events.lock().get(name).cloned();
        if let Some(list) = list {
            list.notify(event);
        }
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.events
            .lock()
            .get(name)
            .map(|list| list.len())
            .unwrap_or(0)
    }

    pub fn clear(&self) {
        self.events.lock().clear();
        self.registered.lock().clear();
    }
}

impl<E: 'static> EventTarget<E> for EventEmitter<E> {
    fn add_listener(&self, name: &str, listener: EventListener<E>) {
        let key = listener_key(&listener);
        let list = Arc::clone(
            self.events
                .lock()
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(DispatchList::new())),
        );
        let id = list.add(listener, false);
        self.registered.lock().push((name.to_string(), key, id));
    }

    fn remove_listener(&self, name: &str, listener: &EventListener<E>) {
        let key = listener_key(listener);
        let removed: Vec<DispatchId> = {
            let mut registered = self.registered.lock();
            let mut removed = Vec::new();
            registered.retain(|(event, k, id)| {
                if event == name && *k == key {
                    removed.push(*id);
                    false
                } else {
                    true
                }
            });
            removed
        };
        let list = self.events.lock().get(name).cloned();
        if let Some(list) = list {
            for id in removed {
                list.remove(id);
            }
        }
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("events", &self.events.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Stream the `name` events of `target`.
///
/// The listener is attached only while the stream is started; with
/// [`Lazy::Very`] it is removed whenever the last subscriber leaves.
pub fn from_event<E>(target: Arc<dyn EventTarget<E>>, name: &str, lazy: Lazy) -> RxStream<E>
where
    E: Clone + Send + Sync + 'static,
{
    let stream = RxStream::with_options(
        StreamOptions::default()
            .lazy(lazy)
            .label(format!("event:{name}")),
    );
    let attached: Arc<Mutex<Option<EventListener<E>>>> = Arc::new(Mutex::new(None));
    let name = name.to_string();

    let weak = stream.downgrade();
    let start_attached = Arc::clone(&attached);
    let start_target = Arc::clone(&target);
    let start_name = name.clone();
    let start = move || {
        let weak = weak.clone();
        let listener: EventListener<E> = Arc::new(move |event: &E| {
            if let Some(stream) = weak.upgrade() {
                let _ = stream.set(event.clone());
            }
        });
        start_target.add_listener(&start_name, Arc::clone(&listener));
        *start_attached.lock() = Some(listener);
    };

    let detach = move || {
        let listener = attached.lock().take();
        if let Some(listener) = listener {
            target.remove_listener(&name, &listener);
        }
    };
    let detach = Arc::new(detach);
    let stop_detach = Arc::clone(&detach);

    stream.install(
        Hooks::new()
            .on_start(start)
            .on_stop(move || stop_detach())
            .on_dispose(move |_| detach()),
    );
    stream
}
