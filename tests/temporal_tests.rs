mod common;

use common::Recorder;
use rxflow::ops::{chunk, debounce, throttle, timeout_ping, timeout_value, Fallback};
use rxflow::sources::Pingable;
use rxflow::{ChunkOptions, RxError, RxResult, RxStream, TimeoutOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[tokio::test(start_paused = true)]
async fn test_debounce_emits_latest_after_quiet_window() {
    let source = RxStream::new();
    let settled = debounce(&source, ms(50));
    let recorder = Recorder::attach(&settled);

    for x in 1..=3 {
        source.set(x).unwrap();
        sleep(ms(10)).await;
    }
    assert!(recorder.values().is_empty());

    sleep(ms(60)).await;
    assert_eq!(recorder.values(), vec![3]);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_flushes_pending_value_on_done() {
    let source = RxStream::new();
    let settled = debounce(&source, ms(50));
    let recorder = Recorder::attach(&settled);

    source.set(1).unwrap();
    source.dispose("finished");

    assert_eq!(recorder.values(), vec![1]);
    assert_eq!(recorder.done_context().as_deref(), Some("finished"));
}

#[tokio::test(start_paused = true)]
async fn test_throttle_drops_values_inside_window() {
    let source = RxStream::new();
    let limited = throttle(&source, ms(10));
    let recorder = Recorder::attach(&limited);

    for x in 0..100 {
        source.set(x).unwrap();
        sleep(ms(1)).await;
    }

    let values = recorder.values();
    assert_eq!(values[0], 0);
    assert!(values.len() <= 11, "emitted {} values", values.len());
    assert!(values.len() >= 9, "emitted {} values", values.len());
}

#[tokio::test(start_paused = true)]
async fn test_chunk_by_quantity_with_remainder() {
    let source = RxStream::new();
    let chunks = chunk(&source, ChunkOptions::default().quantity(2)).unwrap();
    let recorder = Recorder::attach(&chunks);

    for x in 1..=5 {
        source.set(x).unwrap();
    }
    assert_eq!(recorder.values(), vec![vec![1, 2], vec![3, 4]]);

    source.dispose("finished");
    assert_eq!(recorder.values(), vec![vec![1, 2], vec![3, 4], vec![5]]);
    assert_eq!(recorder.done_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_chunk_by_elapsed_time() {
    let source = RxStream::new();
    let chunks = chunk(&source, ChunkOptions::default().elapsed(ms(50))).unwrap();
    let recorder = Recorder::attach(&chunks);

    source.set(1).unwrap();
    sleep(ms(20)).await;
    source.set(2).unwrap();
    sleep(ms(40)).await;
    assert_eq!(recorder.values(), vec![vec![1, 2]]);

    source.set(3).unwrap();
    sleep(ms(60)).await;
    assert_eq!(recorder.values(), vec![vec![1, 2], vec![3]]);
}

#[test]
fn test_chunk_needs_a_threshold() {
    let source: RxStream<i32> = RxStream::new();
    let result = chunk(&source, ChunkOptions::default());
    assert!(matches!(result, Err(RxError::InvalidConfig(_))));
}

#[tokio::test(start_paused = true)]
async fn test_chunk_can_discard_remainder() {
    let source = RxStream::new();
    let chunks = chunk(
        &source,
        ChunkOptions::default().quantity(3).return_remainder(false),
    )
    .unwrap();
    let recorder = Recorder::attach(&chunks);

    source.set(1).unwrap();
    source.set(2).unwrap();
    source.dispose("finished");

    assert!(recorder.values().is_empty());
    assert_eq!(recorder.done_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_value_fires_once_per_silence() {
    let source = RxStream::new();
    let guarded = timeout_value(
        &source,
        Fallback::Value(0),
        TimeoutOptions::default().interval(ms(50)),
    );
    let recorder = Recorder::attach(&guarded);

    sleep(ms(60)).await;
    assert_eq!(recorder.values(), vec![0]);
    sleep(ms(200)).await;
    assert_eq!(recorder.values(), vec![0]);

    source.set(5).unwrap();
    sleep(ms(30)).await;
    assert_eq!(recorder.values(), vec![0, 5]);
    sleep(ms(30)).await;
    assert_eq!(recorder.values(), vec![0, 5, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_value_repeats_while_silent() {
    let source: RxStream<i32> = RxStream::new();
    let guarded = timeout_value(
        &source,
        Fallback::function(|| -1),
        TimeoutOptions::default().interval(ms(10)).repeat(true),
    );
    let recorder = Recorder::attach(&guarded);

    sleep(ms(35)).await;
    assert_eq!(recorder.values(), vec![-1, -1, -1]);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_value_waits_for_first_value_unless_immediate() {
    let source = RxStream::new();
    let guarded = timeout_value(
        &source,
        Fallback::Value(0),
        TimeoutOptions::default().interval(ms(50)).immediate(false),
    );
    let recorder = Recorder::attach(&guarded);

    sleep(ms(100)).await;
    assert!(recorder.values().is_empty());

    source.set(1).unwrap();
    sleep(ms(60)).await;
    assert_eq!(recorder.values(), vec![1, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_generator_fallback_goes_quiet() {
    let source: RxStream<i32> = RxStream::new();
    let guarded = timeout_value(
        &source,
        Fallback::generator(vec![7, 8]),
        TimeoutOptions::default().interval(ms(10)).repeat(true),
    );
    let recorder = Recorder::attach(&guarded);

    sleep(ms(100)).await;
    assert_eq!(recorder.values(), vec![7, 8]);
    assert!(!guarded.is_disposed());
}

struct PingCounter {
    pings: AtomicUsize,
    fail: bool,
}

impl Pingable for PingCounter {
    fn ping(&self) -> RxResult<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(RxError::Operator("target gone".to_string()))
        } else {
            Ok(())
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_timeout_ping_pings_target_while_silent() {
    let target = Arc::new(PingCounter {
        pings: AtomicUsize::new(0),
        fail: false,
    });
    let source = RxStream::new();
    let guarded = timeout_ping(
        &source,
        target.clone(),
        TimeoutOptions::default().interval(ms(20)).repeat(true),
    );
    let recorder = Recorder::attach(&guarded);

    sleep(ms(50)).await;
    assert_eq!(target.pings.load(Ordering::SeqCst), 2);

    source.set(1).unwrap();
    sleep(ms(10)).await;
    assert_eq!(target.pings.load(Ordering::SeqCst), 2);
    assert_eq!(recorder.values(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_ping_stops_repeating_after_failure() {
    let target = Arc::new(PingCounter {
        pings: AtomicUsize::new(0),
        fail: true,
    });
    let source: RxStream<i32> = RxStream::new();
    let guarded = timeout_ping(
        &source,
        target.clone(),
        TimeoutOptions::default().interval(ms(20)).repeat(true),
    );
    let _recorder = Recorder::attach(&guarded);

    sleep(ms(100)).await;
    assert_eq!(target.pings.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_timeout_fallbacks_and_values_share_one_order() {
    let source = RxStream::new();
    let guarded = timeout_value(
        &source,
        Fallback::Value(-1),
        TimeoutOptions::default().interval(ms(2)).repeat(true),
    );
    let first = Recorder::attach(&guarded);
    let second = Recorder::attach(&guarded);

    let producer = source.clone();
    let writer = tokio::task::spawn_blocking(move || {
        for x in 0..100 {
            let _ = producer.set(x);
            let gap = if x % 10 == 9 { 8_000 } else { 300 };
            std::thread::sleep(Duration::from_micros(gap));
        }
    });
    sleep(ms(40)).await;
    guarded.dispose("closed mid-flight");
    writer.await.unwrap();

    assert_eq!(first.values(), second.values());
    assert!(first.values().contains(&-1));
    for recorder in [&first, &second] {
        assert_eq!(recorder.done_count(), 1);
        assert!(recorder.done_is_last());
    }
}
