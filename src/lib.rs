pub mod abort;
pub mod binder;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod scheduler;
pub mod stream;

pub mod object;
pub mod ops;
pub mod pipe;
pub mod sinks;
pub mod sources;
pub mod wrap;

pub mod stream_configuration;

pub use abort::{AbortController, AbortSignal};
pub use binder::{init_upstream, Joined, Upstream};
pub use dispatch::{DispatchId, DispatchList};
pub use error::{RxError, RxResult};
pub use message::{Message, Signal, SignalKind};
pub use object::{ArrayStream, ChangeKind, IndexChange, ObjectStream, PathChange};
pub use pipe::{Pipe, PipeExt};
pub use sinks::{to_array, to_generator};
pub use stream::{Hooks, RxStream, Subscription, WeakRxStream};
pub use stream_configuration::*;
pub use wrap::{wrap, Wrapped};
