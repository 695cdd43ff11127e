mod common;

use common::Recorder;
use rxflow::pipe::{self, Pipe, PipeExt};
use rxflow::{ops, wrap, RxStream};

#[test]
fn test_pipe_map() {
    let source = RxStream::new();
    let double = pipe::map(|x: i32| x * 2);

    let recorder = Recorder::attach(&double.apply(&source));
    for x in 1..=5 {
        source.set(x).unwrap();
    }
    assert_eq!(recorder.values(), vec![2, 4, 6, 8, 10]);
}

#[test]
fn test_pipe_filter() {
    let source = RxStream::new();
    let even_only = pipe::filter(|x: &i32| x % 2 == 0);

    let recorder = Recorder::attach(&even_only.apply(&source));
    for x in 1..=5 {
        source.set(x).unwrap();
    }
    assert_eq!(recorder.values(), vec![2, 4]);
}

#[test]
fn test_pipe_compose() {
    let source = RxStream::new();
    let double = pipe::map(|x: i32| x * 2);
    let over_five = pipe::filter(|x: &i32| *x > 5);
    let pipe = pipe::compose(double, over_five);

    let recorder = Recorder::attach(&pipe.apply(&source));
    for x in 1..=5 {
        source.set(x).unwrap();
    }
    assert_eq!(recorder.values(), vec![6, 8, 10]);
}

#[test]
fn test_pipe_identity_returns_input() {
    let source: RxStream<i32> = RxStream::new();
    let pipe = pipe::identity();
    assert!(pipe.apply(&source).ptr_eq(&source));
}

#[test]
fn test_pipe_ext_compose_changes_type() {
    let source = RxStream::new();
    let describe = pipe::map(|x: i32| x + 1).compose(pipe::map(|x: i32| format!("n={x}")));

    let recorder = Recorder::attach(&describe.apply(&source));
    source.set(1).unwrap();
    assert_eq!(recorder.values(), vec!["n=2".to_string()]);
}

#[test]
fn test_pipe_is_reusable_across_sources() {
    let non_negative: Pipe<i32, i32> =
        Pipe::new(|input: &RxStream<i32>| ops::drop(input, |x: &i32| *x < 0));
    let first = RxStream::new();
    let second = RxStream::new();
    let first_out = Recorder::attach(&non_negative.apply(&first));
    let second_out = Recorder::attach(&non_negative.apply(&second));

    first.set(-1).unwrap();
    first.set(1).unwrap();
    second.set(2).unwrap();

    assert_eq!(first_out.values(), vec![1]);
    assert_eq!(second_out.values(), vec![2]);
}

#[test]
fn test_wrapped_stream_goes_through_pipe() {
    let source = RxStream::new();
    let squares = pipe::map(|x: i32| x * x);
    let wrapped = wrap::<i32, _>(source.clone()).through(&squares);

    let recorder = Recorder::attach(wrapped.stream());
    source.set(3).unwrap();
    assert_eq!(recorder.values(), vec![9]);
}
