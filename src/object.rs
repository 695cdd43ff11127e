//! Reactive containers mutated through explicit setters.
//!
//! Each mutation computes a diff against the previous contents. When
//! nothing changed nothing is emitted; otherwise the diff stream gets
//! the list of changes and the value stream gets the new contents.
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::binder::init_upstream;
use crate::error::{RxError, RxResult};
use crate::ops::get_path;
use crate::stream::RxStream;
use crate::stream_configuration::{StreamOptions, UpstreamOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

/// One changed leaf of an object, addressed by dotted path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathChange {
    pub path: String,
    pub previous: Option<Value>,
    pub value: Option<Value>,
    pub kind: ChangeKind,
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Collect the changes between two JSON values. Objects are compared key
/// by key; anything else, arrays included, is compared as a whole.
pub fn diff_values(previous: &Value, next: &Value, prefix: &str, changes: &mut Vec<PathChange>) {
    match (previous, next) {
        (Value::Object(before), Value::Object(after)) => {
            for (key, old) in before {
                let path = join_path(prefix, key);
                match after.get(key) {
                    Some(new) => diff_values(old, new, &path, changes),
                    None => changes.push(PathChange {
                        path,
                        previous: Some(old.clone()),
                        value: None,
                        kind: ChangeKind::Removed,
                    }),
                }
            }
            for (key, new) in after {
                if !before.contains_key(key) {
                    changes.push(PathChange {
                        path: join_path(prefix, key),
                        previous: None,
                        value: Some(new.clone()),
                        kind: ChangeKind::Added,
                    });
                }
            }
        }
        (old, new) if old != new => changes.push(PathChange {
            path: prefix.to_string(),
            previous: Some(old.clone()),
            value: Some(new.clone()),
            kind: ChangeKind::Changed,
        }),
        _ => {}
    }
}

/// Merge `partial` into `target`, recursing into nested objects
fn merge_into(target: &mut Value, partial: &Value) {
    match (target, partial) {
        (Value::Object(target), Value::Object(partial)) => {
            for (key, value) in partial {
                let nested = value.is_object() && target.get(key).is_some_and(Value::is_object);
                match target.get_mut(key) {
                    Some(existing) if nested => merge_into(existing, value),
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, partial) => *target = partial.clone(),
    }
}

/// Write `value` at a dotted path, creating intermediate objects
fn set_path(target: &mut Value, path: &str, value: Value) -> RxResult<()> {
    let mut segments = path.split('.').filter(|segment| !segment.is_empty()).peekable();
    let mut current = target;
    while let Some(segment) = segments.next() {
        let Value::Object(map) = current else {
            return Err(RxError::InvalidConfig(format!(
                "cannot set '{path}': '{segment}' is not inside an object"
            )));
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return Ok(());
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    Err(RxError::InvalidConfig("empty field path".to_string()))
}

fn touches(changed: &str, watched: &str) -> bool {
    changed == watched
        || changed.starts_with(&format!("{watched}."))
        || watched.starts_with(&format!("{changed}."))
}

/// A JSON object whose changes are published as streams
#[derive(Clone)]
pub struct ObjectStream {
    current: Arc<Mutex<Value>>,
    values: RxStream<Value>,
    diffs: RxStream<Vec<PathChange>>,
}

impl ObjectStream {
    /// `initial` must be a JSON object
    pub fn new(initial: Value) -> RxResult<Self> {
        if !initial.is_object() {
            return Err(RxError::InvalidConfig(
                "an object stream needs a JSON object".to_string(),
            ));
        }
        Ok(Self {
            current: Arc::new(Mutex::new(initial.clone())),
            values: RxStream::with_options(
                StreamOptions::default().label("object").initial(initial),
            ),
            diffs: RxStream::labelled("object:diff"),
        })
    }

    /// Whole-object values after each change
    pub fn stream(&self) -> RxStream<Value> {
        self.values.clone()
    }

    pub fn on_diff(&self) -> RxStream<Vec<PathChange>> {
        self.diffs.clone()
    }

    /// Values of one dotted path, emitted only when a change touches it.
    /// A removed field is emitted as `null`.
    pub fn on_field(&self, path: &str) -> RxStream<Value> {
        let path = path.to_string();
        let current = Arc::clone(&self.current);
        init_upstream(
            &self.diffs,
            UpstreamOptions::labelled(format!("object:field:{path}")),
            move |changes: Vec<PathChange>, downstream| {
                if changes.iter().any(|change| touches(&change.path, &path)) {
                    let value = get_path(&current.lock(), &path).cloned().unwrap_or(Value::Null);
                    let _ = downstream.set(value);
                }
            },
        )
    }

    pub fn last(&self) -> Value {
        self.current.lock().clone()
    }

    /// Replace the whole object
    pub fn set(&self, value: Value) -> RxResult<()> {
        if !value.is_object() {
            return Err(RxError::InvalidConfig(
                "an object stream needs a JSON object".to_string(),
            ));
        }
        self.mutate(|current| {
            *current = value;
            Ok(())
        })
    }

    /// Merge `partial` into the object
    pub fn update(&self, partial: Value) -> RxResult<()> {
        self.mutate(|current| {
            merge_into(current, &partial);
            Ok(())
        })
    }

    /// Write one dotted path
    pub fn update_field(&self, path: &str, value: Value) -> RxResult<()> {
        self.mutate(|current| set_path(current, path, value))
    }

    pub fn dispose(&self, reason: &str) {
        self.values.dispose(reason);
        self.diffs.dispose(reason);
    }

    fn mutate<F>(&self, apply: F) -> RxResult<()>
    where
        F: FnOnce(&mut Value) -> RxResult<()>,
    {
        self.values.ensure_live()?;
        let (changes, snapshot) = {
            let mut current = self.current.lock();
            let mut next = current.clone();
            apply(&mut next)?;
            let mut changes = Vec::new();
            diff_values(&current, &next, "", &mut changes);
            if !changes.is_empty() {
                *current = next.clone();
            }
            (changes, next)
        };
        if changes.is_empty() {
            return Ok(());
        }
        log::trace!("object: {} changed paths", changes.len());
        self.diffs.set(changes)?;
        self.values.set(snapshot)
    }
}

/// One changed position of an array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexChange<T> {
    pub index: usize,
    pub previous: Option<T>,
    pub value: Option<T>,
    pub kind: ChangeKind,
}

fn diff_items<T: Clone + PartialEq>(previous: &[T], next: &[T]) -> Vec<IndexChange<T>> {
    let longest = previous.len().max(next.len());
    (0..longest)
        .filter_map(|index| match (previous.get(index), next.get(index)) {
            (Some(old), Some(new)) if old != new => Some(IndexChange {
                index,
                previous: Some(old.clone()),
                value: Some(new.clone()),
                kind: ChangeKind::Changed,
            }),
            (Some(old), None) => Some(IndexChange {
                index,
                previous: Some(old.clone()),
                value: None,
                kind: ChangeKind::Removed,
            }),
            (None, Some(new)) => Some(IndexChange {
                index,
                previous: None,
                value: Some(new.clone()),
                kind: ChangeKind::Added,
            }),
            _ => None,
        })
        .collect()
}

/// A list whose changes are published as streams
pub struct ArrayStream<T> {
    current: Arc<Mutex<Vec<T>>>,
    values: RxStream<Vec<T>>,
    diffs: RxStream<Vec<IndexChange<T>>>,
}

impl<T> Clone for ArrayStream<T> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            values: self.values.clone(),
            diffs: self.diffs.clone(),
        }
    }
}

impl<T> ArrayStream<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: Vec<T>) -> Self {
        Self {
            current: Arc::new(Mutex::new(initial.clone())),
            values: RxStream::with_options(
                StreamOptions::default().label("array").initial(initial),
            ),
            diffs: RxStream::labelled("array:diff"),
        }
    }

    pub fn stream(&self) -> RxStream<Vec<T>> {
        self.values.clone()
    }

    pub fn on_diff(&self) -> RxStream<Vec<IndexChange<T>>> {
        self.diffs.clone()
    }

    pub fn last(&self) -> Vec<T> {
        self.current.lock().clone()
    }

    pub fn set(&self, items: Vec<T>) -> RxResult<()> {
        self.mutate(|current| {
            *current = items;
            Ok(())
        })
    }

    pub fn set_at(&self, index: usize, item: T) -> RxResult<()> {
        self.mutate(|current| {
            let len = current.len();
            let slot = current
                .get_mut(index)
                .ok_or(RxError::IndexOutOfRange { index, len })?;
            *slot = item;
            Ok(())
        })
    }

    pub fn push(&self, item: T) -> RxResult<()> {
        self.mutate(|current| {
            current.push(item);
            Ok(())
        })
    }

    pub fn delete_at(&self, index: usize) -> RxResult<()> {
        self.mutate(|current| {
            if index >= current.len() {
                return Err(RxError::IndexOutOfRange {
                    index,
                    len: current.len(),
                });
            }
            current.remove(index);
            Ok(())
        })
    }

    pub fn dispose(&self, reason: &str) {
        self.values.dispose(reason);
        self.diffs.dispose(reason);
    }

    fn mutate<F>(&self, apply: F) -> RxResult<()>
    where
        F: FnOnce(&mut Vec<T>) -> RxResult<()>,
    {
        self.values.ensure_live()?;
        let (changes, snapshot) = {
            let mut current = self.current.lock();
            let mut next = current.clone();
            apply(&mut next)?;
            let changes = diff_items(&current, &next);
            if !changes.is_empty() {
                *current = next.clone();
            }
            (changes, next)
        };
        if changes.is_empty() {
            return Ok(());
        }
        self.diffs.set(changes)?;
        self.values.set(snapshot)
    }
}
