mod common;

use common::Recorder;
use quickcheck::{quickcheck, TestResult};
use rxflow::ops::{average, max, min, rank, sum, tally, tally_items};
use rxflow::{RankOptions, RxStream};

fn feed(source: &RxStream<f64>, values: &[f64]) {
    for value in values {
        source.set(*value).unwrap();
    }
}

#[test]
fn test_running_min_and_max() {
    let source = RxStream::new();
    let lowest = Recorder::attach(&min(&source));
    let highest = Recorder::attach(&max(&source));

    feed(&source, &[3.0, 5.0, 1.0, 4.0]);

    assert_eq!(lowest.values(), vec![3.0, 3.0, 1.0, 1.0]);
    assert_eq!(highest.values(), vec![3.0, 5.0, 5.0, 5.0]);
}

#[test]
fn test_running_sum_and_average() {
    let source = RxStream::new();
    let total = Recorder::attach(&sum(&source));
    let mean = Recorder::attach(&average(&source));

    feed(&source, &[2.0, 4.0, 6.0]);

    assert_eq!(total.values(), vec![2.0, 6.0, 12.0]);
    assert_eq!(mean.values(), vec![2.0, 3.0, 4.0]);
}

#[test]
fn test_nan_inputs_are_ignored() {
    let source = RxStream::new();
    let total = Recorder::attach(&sum(&source));
    let mean = Recorder::attach(&average(&source));

    feed(&source, &[1.0, f64::NAN, 3.0]);

    assert_eq!(total.values(), vec![1.0, 4.0]);
    assert_eq!(mean.values(), vec![1.0, 2.0]);
}

#[test]
fn test_tally_counts_values_and_items() {
    let values: RxStream<&str> = RxStream::new();
    let batches: RxStream<Vec<i32>> = RxStream::new();
    let count = Recorder::attach(&tally(&values));
    let items = Recorder::attach(&tally_items(&batches));

    values.set("a").unwrap();
    values.set("b").unwrap();
    batches.set(vec![1, 2, 3]).unwrap();
    batches.set(vec![]).unwrap();
    batches.set(vec![4]).unwrap();

    assert_eq!(count.values(), vec![1, 2]);
    assert_eq!(items.values(), vec![3, 3, 4]);
}

#[test]
fn test_rank_emits_new_best_only() {
    let source = RxStream::new();
    let best = Recorder::attach(&rank(&source, |a: &i32, b: &i32| a.cmp(b), RankOptions::default()));

    for x in [3, 1, 5, 5, 2, 8] {
        source.set(x).unwrap();
    }
    assert_eq!(best.values(), vec![3, 5, 8]);
}

#[test]
fn test_rank_with_ties_and_repeats() {
    let source = RxStream::new();
    let ties = Recorder::attach(&rank(
        &source,
        |a: &i32, b: &i32| a.cmp(b),
        RankOptions::default().emit_equal_ranked(true),
    ));
    let repeats = Recorder::attach(&rank(
        &source,
        |a: &i32, b: &i32| a.cmp(b),
        RankOptions::default().emit_repeat_highest(true),
    ));

    for x in [3, 3, 1, 4] {
        source.set(x).unwrap();
    }

    assert_eq!(ties.values(), vec![3, 3, 4]);
    assert_eq!(repeats.values(), vec![3, 3, 3, 4]);
}

#[test]
fn test_rank_with_custom_ordering_picks_shortest() {
    let source = RxStream::new();
    let shortest = Recorder::attach(&rank(
        &source,
        |a: &String, b: &String| b.len().cmp(&a.len()),
        RankOptions::default(),
    ));

    for word in ["banana", "fig", "apple", "kiwi", "ox"] {
        source.set(word.to_string()).unwrap();
    }
    assert_eq!(shortest.values(), vec!["banana", "fig", "ox"]);
}

#[test]
fn test_running_max_never_decreases() {
    fn property(values: Vec<i32>) -> TestResult {
        if values.is_empty() {
            return TestResult::discard();
        }
        let source = RxStream::new();
        let highest = Recorder::attach(&max(&source));
        for value in &values {
            source.set(f64::from(*value)).unwrap();
        }
        let emitted = highest.values();
        let monotonic = emitted.windows(2).all(|pair| pair[0] <= pair[1]);
        let expected = values.iter().copied().max().map(f64::from);
        TestResult::from_bool(monotonic && emitted.last().copied() == expected)
    }
    quickcheck(property as fn(Vec<i32>) -> TestResult);
}
