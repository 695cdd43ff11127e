//! Consuming a stream from async code
use async_stream::stream;
use futures::channel::mpsc;
use futures_util::stream::{BoxStream, StreamExt};
use tokio::time::{self, Instant};

use crate::error::{RxError, RxResult};
use crate::message::Message;
use crate::stream::{RxStream, Subscription};
use crate::stream_configuration::{ToArrayOptions, Underflow};

/// Unsubscribes when dropped
struct Attached(Subscription);

impl Drop for Attached {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}

fn attach<T>(source: &RxStream<T>) -> RxResult<(Attached, mpsc::UnboundedReceiver<Message<T>>)>
where
    T: Clone + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::unbounded();
    let subscription = source.on(move |message| {
        let _ = tx.unbounded_send(message.clone());
    })?;
    Ok((Attached(subscription), rx))
}

/// Collect values until `limit` is reached, the stream finishes, or
/// `maximum_wait` expires.
///
/// On expiry the outcome follows `underflow`: the partial result, the
/// result padded to `limit`, or [`RxError::Timeout`].
pub async fn to_array<T>(source: &RxStream<T>, options: ToArrayOptions<T>) -> RxResult<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let ToArrayOptions {
        limit,
        maximum_wait,
        underflow,
    } = options;
    let (attached, mut rx) = attach(source)?;
    let deadline = maximum_wait.map(|wait| Instant::now() + wait);

    let mut values = Vec::new();
    let mut expired = false;
    loop {
        if limit.is_some_and(|limit| values.len() >= limit) {
            break;
        }
        let next = match deadline {
            Some(deadline) => match time::timeout_at(deadline, rx.next()).await {
                Ok(next) => next,
                Err(_) => {
                    expired = true;
                    break;
                }
            },
            None => rx.next().await,
        };
        match next {
            Some(Message::Value(value)) => values.push(value),
            Some(Message::Signal(signal)) if signal.is_done() => break,
            Some(Message::Signal(_)) => {}
            None => break,
        }
    }
    drop(attached);

    if !expired {
        return Ok(values);
    }
    log::debug!("{}: to_array wait expired with {} values", source.label(), values.len());
    match underflow {
        Underflow::Partial => Ok(values),
        Underflow::Fill(fill) => {
            if let Some(limit) = limit {
                values.resize(limit, fill);
            }
            Ok(values)
        }
        Underflow::Error => Err(RxError::Timeout(maximum_wait.unwrap_or_default())),
    }
}

/// Read a stream as an async iterator that ends when the stream is done.
/// Dropping the iterator unsubscribes.
pub fn to_generator<T>(source: &RxStream<T>) -> RxResult<BoxStream<'static, T>>
where
    T: Clone + Send + Sync + 'static,
{
    let (attached, mut rx) = attach(source)?;
    Ok(stream! {
        let _attached = attached;
        while let Some(message) = rx.next().await {
            match message {
                Message::Value(value) => yield value,
                Message::Signal(signal) if signal.is_done() => break,
                Message::Signal(_) => {}
            }
        }
    }
    .boxed())
}
