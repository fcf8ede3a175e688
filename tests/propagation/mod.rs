//! Failure propagation: skipping, interception and silent drops

use chainx::{failed, promise, ready, spawned, Failure, Ready, Settlement};
use std::sync::mpsc;
use test_case::test_case;

use crate::common::Recorder;

const STEPS: usize = 5;

/// Chain of `STEPS` applies where step `k` fails (`k == 0` means the root fails).
fn chain_failing_at(k: usize, visited: &Recorder<usize>) -> chainx::Chain<usize> {
    let root: Ready<usize> = if k == 0 {
        failed("step 0 failed")
    } else {
        ready(0)
    };

    let mut chain = chainx::from(root);
    for step in 1..=STEPS {
        let visited = visited.clone();
        chain = chain.and_apply(move |n| {
            visited.record(step);
            if step == k {
                failed(format!("step {step} failed"))
            } else {
                ready(n + 1)
            }
        });
    }
    chain
}

#[test_case(0 ; "root fails")]
#[test_case(1 ; "first apply fails")]
#[test_case(3 ; "middle apply fails")]
#[test_case(5 ; "last apply fails")]
fn test_failure_skips_remaining_steps(k: usize) {
    let visited = Recorder::new();
    let errors = Recorder::new();
    let values = Recorder::new();

    let (e, v) = (errors.clone(), values.clone());
    chain_failing_at(k, &visited)
        .and_error(move |err| e.record(err.message().to_string()))
        .and_accept(move |n| v.record(n));

    // Steps after k are never invoked
    assert_eq!(visited.snapshot(), (1..=k).collect::<Vec<_>>());
    assert_eq!(errors.snapshot(), vec![format!("step {k} failed")]);
    assert!(values.is_empty());
}

#[test_case(0 ; "root fails")]
#[test_case(2 ; "apply fails")]
fn test_failure_without_handler_settles_dropped(k: usize) {
    let visited = Recorder::new();
    let values = Recorder::new();
    let (tx, rx) = mpsc::channel();

    let v = values.clone();
    chain_failing_at(k, &visited)
        .on_settle(move |s| tx.send(s).unwrap())
        .and_accept(move |n| v.record(n));

    assert_eq!(rx.recv().unwrap(), Settlement::ErrorDropped);
    assert!(values.is_empty());
}

#[test]
fn test_values_pass_through_error_links() {
    let handled = Recorder::<String>::new();
    let (tx, rx) = mpsc::channel();

    let h = handled.clone();
    chainx::from(ready(1))
        .and_error(move |err| h.record(err.to_string()))
        .and_apply(|n| ready(n * 10))
        .and_error(|_| panic!("no failure to handle"))
        .and_accept(move |n| tx.send(n).unwrap());

    assert_eq!(rx.recv().unwrap(), 10);
    assert!(handled.is_empty());
}

#[test]
fn test_only_first_error_link_handles() {
    let first = Recorder::new();
    let second = Recorder::new();

    let (a, b) = (first.clone(), second.clone());
    chainx::from(failed::<i32>("refused"))
        .and_apply(|n| ready(n + 1))
        .and_error(move |err| a.record(err))
        .and_error(move |err| b.record(err))
        .and_accept(|_| {});

    assert_eq!(first.snapshot(), vec![Failure::transport("refused")]);
    assert!(second.is_empty());
}

#[test]
fn test_error_link_before_failure_does_not_catch_it() {
    let handled = Recorder::new();
    let (tx, rx) = mpsc::channel();

    let h = handled.clone();
    chainx::from(ready(1))
        .and_error(move |err| h.record(err))
        .and_apply(|_| failed::<i32>("later"))
        .on_settle(move |s| tx.send(s).unwrap())
        .and_accept(|_| {});

    assert_eq!(rx.recv().unwrap(), Settlement::ErrorDropped);
    assert!(handled.is_empty());
}

#[test]
fn test_panicking_apply_becomes_transform_failure() {
    let (tx, rx) = mpsc::channel();

    chainx::from(ready("payload"))
        .and_apply(|s| ready(s.len()))
        .and_apply(|n: usize| -> Ready<usize> { panic!("cannot transform {n}") })
        .and_error(move |err| tx.send(err).unwrap())
        .and_accept(|_| {});

    let err = rx.recv().unwrap();
    assert!(err.is_transform());
    assert_eq!(err.message(), "cannot transform 7");
    assert_eq!(
        err,
        Failure::Transform {
            node: 2,
            message: "cannot transform 7".to_string()
        }
    );
}

#[test]
fn test_panicking_accept_is_dropped_quietly() {
    let (tx, rx) = mpsc::channel();

    chainx::from(ready(1))
        .on_settle(move |s| tx.send(s).unwrap())
        .and_accept(|_| panic!("sink crashed"));

    // Nothing follows an accept link, so the transform failure has nowhere to go
    assert_eq!(rx.recv().unwrap(), Settlement::ErrorDropped);
}

#[test]
fn test_failure_resolved_later_from_another_thread() {
    let (producer, deferred) = promise::<String>();
    let visited = Recorder::new();
    let (tx, rx) = mpsc::channel();

    let v = visited.clone();
    chainx::from(deferred)
        .and_apply(move |s| {
            v.record(s.clone());
            ready(s)
        })
        .and_error(move |err| tx.send(err.to_string()).unwrap())
        .and_accept(|_| {});

    std::thread::spawn(move || {
        producer.reject("connection reset");
    })
    .join()
    .unwrap();

    assert_eq!(rx.recv().unwrap(), "connection reset");
    assert!(visited.is_empty());
}

#[test]
fn test_panicking_spawner_fails_the_step() {
    let (tx, rx) = mpsc::channel();

    chainx::from(ready("hello1".to_string()))
        .and_apply(|body| {
            spawned(async move { Ok::<_, Failure>(format!("{body}/service")) }, |_fut| {
                panic!("no reactor running")
            })
        })
        .and_error(move |err| tx.send(err).unwrap())
        .and_accept(|_| {});

    let err = rx.recv().unwrap();
    assert!(err.is_transform());
    assert_eq!(err.message(), "no reactor running");
}
