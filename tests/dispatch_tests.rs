use parking_lot::Mutex;
use rxflow::{DispatchId, DispatchList};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_notify_in_registration_order() {
    let list: DispatchList<i32> = DispatchList::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for tag in ["a", "b", "c"] {
        let seen = Arc::clone(&seen);
        list.add(Arc::new(move |value: &i32| seen.lock().push(format!("{tag}{value}"))), false);
    }

    list.notify(&1);
    assert_eq!(*seen.lock(), vec!["a1", "b1", "c1"]);
}

#[test]
fn test_once_handler_runs_once() {
    let list: DispatchList<()> = DispatchList::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    list.add(Arc::new(move |_: &()| {
        counter.fetch_add(1, Ordering::SeqCst);
    }), true);

    list.notify(&());
    list.notify(&());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(list.is_empty());
}

#[test]
fn test_remove_unknown_handler() {
    let list: DispatchList<()> = DispatchList::new();
    let id = list.add(Arc::new(|_: &()| {}), false);
    assert!(list.remove(id));
    assert!(!list.remove(id));
    assert_eq!(list.len(), 0);
}

#[test]
fn test_handler_added_during_notify_waits_for_next_round() {
    let list: Arc<DispatchList<()>> = Arc::new(DispatchList::new());
    let late_calls = Arc::new(AtomicUsize::new(0));
    let added = Arc::new(AtomicUsize::new(0));

    let inner_list = Arc::clone(&list);
    let inner_calls = Arc::clone(&late_calls);
    let inner_added = Arc::clone(&added);
    list.add(Arc::new(move |_: &()| {
        if inner_added.fetch_add(1, Ordering::SeqCst) == 0 {
            let calls = Arc::clone(&inner_calls);
            inner_list.add(Arc::new(move |_: &()| {
                calls.fetch_add(1, Ordering::SeqCst);
            }), false);
        }
    }), false);

    list.notify(&());
    assert_eq!(late_calls.load(Ordering::SeqCst), 0);
    list.notify(&());
    assert_eq!(late_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_handler_removed_during_notify_still_completes_round() {
    let list: Arc<DispatchList<()>> = Arc::new(DispatchList::new());
    let victim: Arc<Mutex<Option<DispatchId>>> = Arc::new(Mutex::new(None));
    let victim_calls = Arc::new(AtomicUsize::new(0));

    let remover_list = Arc::clone(&list);
    let remover_victim = Arc::clone(&victim);
    list.add(Arc::new(move |_: &()| {
        if let Some(id) = *remover_victim.lock() {
            remover_list.remove(id);
        }
    }), false);
    let calls = Arc::clone(&victim_calls);
    let id = list.add(Arc::new(move |_: &()| {
        calls.fetch_add(1, Ordering::SeqCst);
    }), false);
    *victim.lock() = Some(id);

    list.notify(&());
    assert_eq!(victim_calls.load(Ordering::SeqCst), 1);
    list.notify(&());
    assert_eq!(victim_calls.load(Ordering::SeqCst), 1);
    assert_eq!(list.len(), 1);
}

#[test]
fn test_dispatch_id_display() {
    let list: DispatchList<()> = DispatchList::new();
    let first = list.add(Arc::new(|_: &()| {}), false);
    let second = list.add(Arc::new(|_: &()| {}), false);
    assert_ne!(first, second);
    assert!(first.to_string().starts_with('#'));
}
