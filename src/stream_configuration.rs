//! Configuration types for rxflow streams, sources and operators
//!
//! Every option struct has a `Default` carrying the documented defaults
//! and chainable setters, e.g.
//! `FunctionOptions::default().interval(Duration::from_millis(10)).manual(true)`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::abort::AbortSignal;

/// When a stream acquires and releases its producer-side resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lazy {
    /// Start at construction, regardless of subscribers
    Never,
    /// Start on the first subscriber and stay started
    #[default]
    Initial,
    /// Start on the first subscriber, stop whenever the count drops to zero
    Very,
}

/// Options shared by every stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamOptions<T> {
    pub lazy: Lazy,
    /// Name used in log lines and error messages
    pub label: String,
    /// Keep the most recent value for [`crate::RxStream::last`]
    pub track_last: bool,
    /// Hand the most recent value to each new subscriber
    pub replay: bool,
    /// Value the cache starts with
    pub initial: Option<T>,
}

impl<T> Default for StreamOptions<T> {
    fn default() -> Self {
        Self {
            lazy: Lazy::Initial,
            label: "stream".to_string(),
            track_last: false,
            replay: false,
            initial: None,
        }
    }
}

impl<T> StreamOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lazy(mut self, lazy: Lazy) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn track_last(mut self, track_last: bool) -> Self {
        self.track_last = track_last;
        self
    }

    pub fn replay(mut self, replay: bool) -> Self {
        self.replay = replay;
        if replay {
            self.track_last = true;
        }
        self
    }

    pub fn initial(mut self, initial: T) -> Self {
        self.initial = Some(initial);
        self.track_last = true;
        self
    }
}

/// Options for binding a downstream to an upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamOptions {
    pub lazy: Lazy,
    /// Dispose the downstream when the upstream sends `done`
    pub dispose_if_source_done: bool,
    pub label: String,
}

impl Default for UpstreamOptions {
    fn default() -> Self {
        Self {
            lazy: Lazy::Initial,
            dispose_if_source_done: true,
            label: "upstream".to_string(),
        }
    }
}

impl UpstreamOptions {
    pub fn labelled(label: impl Into<String>) -> Self {
        Self::default().label(label)
    }

    pub fn lazy(mut self, lazy: Lazy) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn dispose_if_source_done(mut self, dispose: bool) -> Self {
        self.dispose_if_source_done = dispose;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// What an array source does when it is stopped part-way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WhenStopped {
    /// Start again from the first item
    Reset,
    /// Resume from the next unsent item
    #[default]
    Continue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayOptions {
    /// Delay between items; zero emits as fast as the scheduler allows
    pub interval: Duration,
    pub lazy: Lazy,
    pub when_stopped: WhenStopped,
    pub label: String,
}

impl Default for ArrayOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5),
            lazy: Lazy::Initial,
            when_stopped: WhenStopped::Continue,
            label: "from_array".to_string(),
        }
    }
}

impl ArrayOptions {
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn lazy(mut self, lazy: Lazy) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn when_stopped(mut self, when_stopped: WhenStopped) -> Self {
        self.when_stopped = when_stopped;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionOptions {
    /// Delay between calls when polling
    pub interval: Duration,
    /// Only call the function when the source is pinged
    pub manual: bool,
    pub lazy: Lazy,
    /// Close on the first failure. When false, failures become `warn`
    /// signals until `error_limit` consecutive failures are reached.
    pub close_on_error: bool,
    pub error_limit: usize,
    /// Close after this many successful calls
    pub maximum_repeats: Option<usize>,
    /// Wait before the first call
    pub predelay: Duration,
    /// External cancellation; aborting it closes the source
    #[serde(skip)]
    pub signal: Option<AbortSignal>,
    pub label: String,
}

impl Default for FunctionOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1),
            manual: false,
            lazy: Lazy::Very,
            close_on_error: true,
            error_limit: 3,
            maximum_repeats: None,
            predelay: Duration::ZERO,
            signal: None,
            label: "from_function".to_string(),
        }
    }
}

impl FunctionOptions {
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn manual(mut self, manual: bool) -> Self {
        self.manual = manual;
        self
    }

    pub fn lazy(mut self, lazy: Lazy) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn close_on_error(mut self, close_on_error: bool) -> Self {
        self.close_on_error = close_on_error;
        self
    }

    pub fn error_limit(mut self, error_limit: usize) -> Self {
        self.error_limit = error_limit;
        self
    }

    pub fn maximum_repeats(mut self, repeats: usize) -> Self {
        self.maximum_repeats = Some(repeats);
        self
    }

    pub fn predelay(mut self, predelay: Duration) -> Self {
        self.predelay = predelay;
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterableOptions {
    /// Delay between reads
    pub interval: Duration,
    /// Close with an error if a single read takes longer than this
    pub read_timeout: Duration,
    pub lazy: Lazy,
    #[serde(skip)]
    pub signal: Option<AbortSignal>,
    pub label: String,
}

impl Default for IterableOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5),
            read_timeout: Duration::from_secs(5 * 60),
            lazy: Lazy::Very,
            signal: None,
            label: "from_iterable".to_string(),
        }
    }
}

impl IterableOptions {
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn lazy(mut self, lazy: Lazy) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Close the stream when the function fails; otherwise emit `warn` and continue
    pub close_on_error: bool,
    pub upstream: UpstreamOptions,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            close_on_error: true,
            upstream: UpstreamOptions::labelled("transform"),
        }
    }
}

impl TransformOptions {
    pub fn close_on_error(mut self, close_on_error: bool) -> Self {
        self.close_on_error = close_on_error;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkOptions {
    /// Flush when this many values are buffered; zero disables the count threshold
    pub quantity: usize,
    /// Flush when this much time passed since the chunk started
    pub elapsed: Option<Duration>,
    /// Flush a partial chunk when the upstream finishes
    pub return_remainder: bool,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            quantity: 0,
            elapsed: None,
            return_remainder: true,
        }
    }
}

impl ChunkOptions {
    pub fn quantity(mut self, quantity: usize) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }

    pub fn return_remainder(mut self, return_remainder: bool) -> Self {
        self.return_remainder = return_remainder;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutOptions {
    pub interval: Duration,
    /// Keep firing every `interval` while the upstream stays silent
    pub repeat: bool,
    /// Arm the timer on start rather than waiting for the first value
    pub immediate: bool,
}

impl Default for TimeoutOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            repeat: false,
            immediate: true,
        }
    }
}

impl TimeoutOptions {
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }
}

/// How a combinator reacts when one of its sources finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OnSourceDone {
    /// Dispose the whole combinator
    #[default]
    Break,
    /// Keep going with the sources that are still live
    Allow,
}

/// What a finished source contributes to later joint emissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FinalValue {
    /// Keep its last value
    Last,
    /// Blank its slot
    #[default]
    Undefined,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CombineLatestOptions {
    pub on_source_done: OnSourceDone,
}

impl CombineLatestOptions {
    pub fn on_source_done(mut self, on_source_done: OnSourceDone) -> Self {
        self.on_source_done = on_source_done;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    pub on_source_done: OnSourceDone,
    pub final_value: FinalValue,
    /// Dispose if no joint emission happens within this window
    pub maximum_wait: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            on_source_done: OnSourceDone::Break,
            final_value: FinalValue::Undefined,
            maximum_wait: Duration::from_secs(2),
        }
    }
}

impl SyncOptions {
    pub fn on_source_done(mut self, on_source_done: OnSourceDone) -> Self {
        self.on_source_done = on_source_done;
        self
    }

    pub fn final_value(mut self, final_value: FinalValue) -> Self {
        self.final_value = final_value;
        self
    }

    pub fn maximum_wait(mut self, maximum_wait: Duration) -> Self {
        self.maximum_wait = maximum_wait;
        self
    }
}

/// Which cases of a switcher receive a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SwitchMatch {
    #[default]
    First,
    All,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct RankOptions {
    /// Also emit when a value ranks equal to the current best
    pub emit_equal_ranked: bool,
    /// Emit the current best on every observation
    pub emit_repeat_highest: bool,
}

impl RankOptions {
    pub fn emit_equal_ranked(mut self, emit: bool) -> Self {
        self.emit_equal_ranked = emit;
        self
    }

    pub fn emit_repeat_highest(mut self, emit: bool) -> Self {
        self.emit_repeat_highest = emit;
        self
    }
}

/// What [`crate::sinks::to_array`] does if the wait expires before `limit` is reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Underflow<T> {
    /// Return what was gathered
    Partial,
    /// Pad up to `limit` with this value
    Fill(T),
    /// Fail with [`crate::RxError::Timeout`]
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToArrayOptions<T> {
    pub limit: Option<usize>,
    pub maximum_wait: Option<Duration>,
    pub underflow: Underflow<T>,
}

impl<T> Default for ToArrayOptions<T> {
    fn default() -> Self {
        Self {
            limit: None,
            maximum_wait: None,
            underflow: Underflow::Partial,
        }
    }
}

impl<T> ToArrayOptions<T> {
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn maximum_wait(mut self, maximum_wait: Duration) -> Self {
        self.maximum_wait = Some(maximum_wait);
        self
    }

    pub fn underflow(mut self, underflow: Underflow<T>) -> Self {
        self.underflow = underflow;
        self
    }
}
