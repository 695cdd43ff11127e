//! Timer primitive used by temporal operators and polling sources.
//!
//! Timers are tokio tasks. An operator captures a [`Scheduler`] for the
//! runtime it was built on, so its timers can be armed later from any
//! thread, including host threads that never entered a runtime. A
//! [`TimerHandle`] cancels its task when cancelled or dropped.

use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::error::{RxError, RxResult};
use crate::stream::RxStream;

#[derive(Debug, Default)]
pub struct TimerHandle {
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    /// A handle with nothing scheduled
    pub fn idle() -> Self {
        Self { task: None }
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// True while the callback has neither run nor been cancelled
    pub fn is_pending(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawns timers onto one tokio runtime
#[derive(Debug, Clone)]
pub struct Scheduler {
    runtime: Handle,
}

impl Scheduler {
    /// The runtime of the calling context.
    ///
    /// Fails with [`RxError::InvalidConfig`] outside a tokio runtime.
    pub fn current() -> RxResult<Self> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(|err| RxError::InvalidConfig(format!("timers need a tokio runtime: {err}")))
    }

    pub fn from_handle(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Run a producer task that is aborted when the handle is cancelled or dropped
    pub fn spawn<F>(&self, future: F) -> TimerHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        TimerHandle {
            task: Some(self.runtime.spawn(future)),
        }
    }

    /// Run `f` once after `delay`
    pub fn schedule<F>(&self, delay: Duration, f: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.spawn(async move {
            time::sleep(delay).await;
            f();
        })
    }

    /// Run `f` every `period`, first after one full period. Stops when `f` returns `false`.
    pub fn schedule_repeating<F>(&self, period: Duration, mut f: F) -> TimerHandle
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let period = period.max(Duration::from_micros(1));
        self.spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !f() {
                    break;
                }
            }
        })
    }
}

/// Sleep for `interval`, or just yield to the scheduler when it is zero
pub async fn pause(interval: Duration) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
    } else {
        time::sleep(interval).await;
    }
}

/// Stand-in for a timed stream built outside a runtime, already disposed with `err`
pub(crate) fn unscheduled<T>(label: &str, err: RxError) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    log::warn!("{}: {}", label, err);
    RxStream::closed(label, &err.to_string())
}
