mod common;

use common::Recorder;
use rxflow::sources::Source;
use rxflow::{wrap, ChunkOptions, RankOptions, RxStream, SwitchMatch, ToArrayOptions, Wrapped};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_test::assert_ok;

#[tokio::test(start_paused = true)]
async fn test_wrap_array_and_chain_operators() {
    let values = wrap::<i32, _>(vec![1, 2, 3, 4, 5, 6])
        .filter(|x: &i32| x % 2 == 0)
        .transform(|x: i32| x * 10)
        .to_array(ToArrayOptions::default())
        .await;

    assert_eq!(assert_ok!(values), vec![20, 40, 60]);
}

#[tokio::test(start_paused = true)]
async fn test_wrap_function_source() {
    let values = wrap::<&str, _>(Source::function(|| "tick"))
        .tally()
        .to_array(ToArrayOptions::default().limit(3))
        .await;

    assert_eq!(assert_ok!(values), vec![1, 2, 3]);
}

#[test]
fn test_wrap_existing_stream_shares_it() {
    let source: RxStream<i32> = RxStream::new();
    let wrapped = wrap::<i32, _>(source.clone());
    assert!(wrapped.stream().ptr_eq(&source));
    assert!(wrapped.into_stream().ptr_eq(&source));
}

#[test]
fn test_wrapped_numeric_aggregates() {
    let source: RxStream<f64> = RxStream::new();
    let total = Wrapped::new(source.clone()).sum();
    let recorder = Recorder::attach(total.stream());

    for value in [1.5, 2.5] {
        source.set(value).unwrap();
    }
    assert_eq!(recorder.values(), vec![1.5, 4.0]);
}

#[test]
fn test_wrapped_json_field_and_rank() {
    let source: RxStream<serde_json::Value> = RxStream::new();
    let best_score = Wrapped::new(source.clone())
        .field("score", Some(json!(0)))
        .rank(
            |a, b| a.as_i64().unwrap_or(0).cmp(&b.as_i64().unwrap_or(0)),
            RankOptions::default(),
        );
    let recorder = Recorder::attach(best_score.stream());

    for score in [json!({"score": 3}), json!({}), json!({"score": 7})] {
        source.set(score).unwrap();
    }
    assert_eq!(recorder.values(), vec![json!(3), json!(7)]);
}

#[tokio::test(start_paused = true)]
async fn test_wrapped_chunk_then_tally_items() {
    let source: RxStream<i32> = RxStream::new();
    let counted = Wrapped::new(source.clone())
        .chunk(ChunkOptions::default().quantity(2))
        .unwrap()
        .tally_items();
    let recorder = Recorder::attach(counted.stream());

    for x in 0..5 {
        source.set(x).unwrap();
    }
    assert_eq!(recorder.values(), vec![2, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_wrapped_debounce() {
    let source: RxStream<&str> = RxStream::new();
    let settled = Wrapped::new(source.clone()).debounce(Duration::from_millis(20));
    let recorder = Recorder::attach(settled.stream());

    source.set("a").unwrap();
    source.set("b").unwrap();
    sleep(Duration::from_millis(30)).await;

    assert_eq!(recorder.values(), vec!["b"]);
}

#[test]
fn test_wrapped_combine_latest_puts_self_first() {
    let (a, b) = (RxStream::new(), RxStream::new());
    let combined = Wrapped::new(a.clone()).combine_latest(&[b.clone()], Default::default());
    let recorder = Recorder::attach(combined.stream());

    b.set(2).unwrap();
    a.set(1).unwrap();
    assert_eq!(recorder.values(), vec![vec![1, 2]]);
}

#[test]
fn test_wrapped_switcher_and_split() {
    let source = RxStream::new();
    let is_negative: Arc<dyn Fn(&i32) -> bool + Send + Sync> = Arc::new(|x: &i32| *x < 0);
    let routes = Wrapped::new(source.clone())
        .switcher(vec![("negative".to_string(), is_negative)], SwitchMatch::First);
    let copies = routes["negative"].clone().split(2);
    let first = Recorder::attach(copies[0].stream());
    let second = Recorder::attach(copies[1].stream());

    for x in [1, -2, 3, -4] {
        source.set(x).unwrap();
    }
    assert_eq!(first.values(), vec![-2, -4]);
    assert_eq!(second.values(), vec![-2, -4]);
}

#[tokio::test(start_paused = true)]
async fn test_wrapped_to_generator() {
    use futures_util::stream::StreamExt;

    let items: Vec<i32> = wrap::<i32, _>(vec![3, 2, 1])
        .compute_with_previous(|previous: &i32, current: &i32| previous * current)
        .to_generator()
        .unwrap()
        .collect()
        .await;
    assert_eq!(items, vec![3, 6, 6]);
}
