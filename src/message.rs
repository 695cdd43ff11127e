//! The shape of everything that travels from a producer to its subscribers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an out-of-band signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// Terminal: the stream will never deliver anything again
    Done,
    /// Advisory: something went wrong but the stream keeps going
    Warn,
    /// Application-defined signal, forwarded untouched by operators
    Custom(String),
}

impl SignalKind {
    pub fn as_str(&self) -> &str {
        match self {
            SignalKind::Done => "done",
            SignalKind::Warn => "warn",
            SignalKind::Custom(kind) => kind,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SignalKind {
    fn from(kind: &str) -> Self {
        match kind {
            "done" => SignalKind::Done,
            "warn" => SignalKind::Warn,
            other => SignalKind::Custom(other.to_string()),
        }
    }
}

/// An out-of-band notice with optional free-text context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub context: Option<String>,
}

impl Signal {
    pub fn new(kind: SignalKind, context: Option<String>) -> Self {
        Self { kind, context }
    }

    pub fn done(reason: impl Into<String>) -> Self {
        Self::new(SignalKind::Done, Some(reason.into()))
    }

    pub fn warn(context: impl Into<String>) -> Self {
        Self::new(SignalKind::Warn, Some(context.into()))
    }

    pub fn is_done(&self) -> bool {
        self.kind == SignalKind::Done
    }

    /// Context text, or an empty string when none was given
    pub fn context_str(&self) -> &str {
        self.context.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{} ({})", self.kind, context),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// A value or a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message<T> {
    Value(T),
    Signal(Signal),
}

impl<T> Message<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Message::Value(value) => Some(value),
            Message::Signal(_) => None,
        }
    }

    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Message::Signal(signal) => Some(signal),
            Message::Value(_) => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Message::Signal(signal) if signal.is_done())
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Message::Value(value) => Some(value),
            Message::Signal(_) => None,
        }
    }
}
