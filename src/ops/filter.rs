//! Selecting values by predicate, and JSON fields by path
use serde_json::Value;

use crate::binder::init_upstream;
use crate::stream::RxStream;
use crate::stream_configuration::UpstreamOptions;

/// Pass only values for which `predicate` is true
pub fn filter<T, F>(source: &RxStream<T>, predicate: F) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    init_upstream(source, UpstreamOptions::labelled("filter"), move |value, downstream| {
        if predicate(&value) {
            let _ = downstream.set(value);
        }
    })
}

/// Pass only values for which `predicate` is false
pub fn drop<T, F>(source: &RxStream<T>, predicate: F) -> RxStream<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    init_upstream(source, UpstreamOptions::labelled("drop"), move |value, downstream| {
        if !predicate(&value) {
            let _ = downstream.set(value);
        }
    })
}

/// Look up a dotted path such as `"position.x"` inside a JSON value.
/// Numeric segments index into arrays.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Project one field out of object values.
///
/// When the field is missing the `fallback` is emitted instead; with no
/// fallback the value is skipped.
pub fn field(source: &RxStream<Value>, path: &str, fallback: Option<Value>) -> RxStream<Value> {
    let path = path.to_string();
    init_upstream(
        source,
        UpstreamOptions::labelled(format!("field:{path}")),
        move |value, downstream| {
            let projected = match get_path(&value, &path) {
                Some(found) if !found.is_null() => Some(found.clone()),
                _ => fallback.clone(),
            };
            if let Some(projected) = projected {
                let _ = downstream.set(projected);
            }
        },
    )
}
