//! Adapters that turn arrays, functions, iterables, events and timers into streams.

pub mod array;
pub mod clock;
pub mod event;
pub mod function;
pub mod iterable;
pub mod resolve;

pub use array::from_array;
pub use clock::clock;
pub use event::{from_event, EventEmitter, EventListener, EventTarget};
pub use function::{from_function, from_sync_function, FunctionSource, Pingable};
pub use iterable::{from_async_iterable, from_iterator};
pub use resolve::{resolve_json, resolve_source, ResolveOptions, Source};
