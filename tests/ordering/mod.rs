//! Execution order: links run in construction order, each exactly once

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chainx::{promise, ready, result_slot, spawned, Failure, Settlement};

use crate::common::{settled, Recorder};

#[tokio::test]
async fn test_links_run_in_order_despite_uneven_latency() {
    const STEPS: u64 = 12;
    let visited = Recorder::new();
    let (slot, waiter) = result_slot();

    let mut chain = chainx::from(ready(Vec::<u64>::new()));
    for step in 0..STEPS {
        let visited = visited.clone();
        chain = chain.and_apply(move |mut trail: Vec<u64>| {
            visited.record(step);
            trail.push(step);
            // Earlier steps are slower; order must still follow the chain
            let delay = Duration::from_millis(STEPS - step);
            spawned(
                async move {
                    tokio::time::sleep(delay).await;
                    Ok::<_, Failure>(trail)
                },
                |fut| {
                    tokio::spawn(fut);
                },
            )
        });
    }
    chain.deliver(slot);

    let expected: Vec<u64> = (0..STEPS).collect();
    assert_eq!(waiter.await.unwrap(), expected);
    assert_eq!(visited.snapshot(), expected);
}

const DEEP: usize = 100_000;

#[test]
fn test_deep_ready_chain_visits_each_link_once() {
    let visited = Recorder::new();
    let (tx, rx) = mpsc::channel();

    let mut chain = chainx::from(ready(0_usize));
    for step in 0..DEEP {
        let visited = visited.clone();
        chain = chain.and_apply(move |n| {
            visited.record(step);
            ready(n + 1)
        });
    }
    chain.and_accept(move |n| tx.send(n).unwrap());

    assert_eq!(rx.recv().unwrap(), DEEP);
    assert_eq!(visited.snapshot(), (0..DEEP).collect::<Vec<_>>());
}

#[test]
fn test_deep_chain_of_settled_promises() {
    let visited = Recorder::new();
    let (tx, rx) = mpsc::channel();

    let (root, root_value) = promise::<usize>();
    root.resolve(0);

    let mut chain = chainx::from(root_value);
    for step in 0..DEEP {
        let visited = visited.clone();
        chain = chain.and_apply(move |n| {
            visited.record(step);
            // Settled before the chain subscribes to it
            let (producer, value) = promise();
            producer.resolve(n + 1);
            value
        });
    }
    chain.and_accept(move |n| tx.send(n).unwrap());

    assert_eq!(rx.recv().unwrap(), DEEP);
    assert_eq!(visited.len(), DEEP);
}

#[test]
fn test_link_waits_for_its_predecessor() {
    let (first, first_value) = promise::<i32>();
    let (second, second_value) = promise::<i32>();
    let visited = Recorder::new();
    let (tx, rx) = mpsc::channel();

    let v = visited.clone();
    chainx::from(first_value)
        .and_apply(move |n| {
            v.record(n);
            second_value
        })
        .and_accept(move |n| tx.send(n).unwrap());

    // Settling the second step early changes nothing until the first resolves
    assert!(second.resolve(2));
    assert!(visited.is_empty());
    assert!(rx.try_recv().is_err());

    assert!(first.resolve(1));
    assert_eq!(visited.snapshot(), vec![1]);
    assert_eq!(rx.recv().unwrap(), 2);
}

#[test]
fn test_link_runs_on_the_resolving_thread() {
    let (producer, value) = promise::<&'static str>();
    let (tx, rx) = mpsc::channel();

    chainx::from(value)
        .and_apply(|s| ready(s.to_uppercase()))
        .and_accept(move |s| tx.send((s, thread::current().id())).unwrap());

    let resolver = thread::spawn(move || {
        producer.resolve("remote");
        thread::current().id()
    });
    let resolver_id = resolver.join().unwrap();

    let (value, accepted_on) = rx.recv().unwrap();
    assert_eq!(value, "REMOTE");
    assert_eq!(accepted_on, resolver_id);
}

#[test]
fn test_second_resolution_is_ignored() {
    let (producer, value) = promise::<i32>();
    let values = Recorder::new();
    let errors = Recorder::new();

    let (v, e) = (values.clone(), errors.clone());
    chainx::from(value)
        .and_error(move |err| e.record(err))
        .and_accept(move |n| v.record(n));

    assert!(producer.resolve(1));
    assert!(!producer.resolve(2));
    assert!(!producer.reject("too late"));

    assert_eq!(values.snapshot(), vec![1]);
    assert!(errors.is_empty());
}

#[test]
fn test_racing_resolvers_deliver_exactly_once() {
    let (producer, value) = promise::<usize>();
    let values = Recorder::new();
    let (tx, rx) = mpsc::channel();

    let v = values.clone();
    chainx::from(value)
        .on_settle(move |s| tx.send(s).unwrap())
        .and_accept(move |n| v.record(n));

    let winners: usize = (0..8)
        .map(|i| {
            let producer = producer.clone();
            thread::spawn(move || producer.resolve(i))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap() as usize)
        .sum();

    assert_eq!(winners, 1);
    assert_eq!(rx.recv().unwrap(), Settlement::Accepted);
    assert_eq!(values.len(), 1);
}

#[tokio::test]
async fn test_chain_does_not_start_until_finished() {
    let (producer, value) = promise::<i32>();
    let visited = Recorder::new();
    let (on_settle, done) = settled();

    // Already resolved before the chain exists
    producer.resolve(5);

    let v = visited.clone();
    let chain = chainx::from(value).and_apply(move |n| {
        v.record(n);
        ready(n)
    });
    assert!(visited.is_empty());

    chain.on_settle(on_settle).and_accept(|_| {});
    assert_eq!(done.await.unwrap(), Settlement::Accepted);
    assert_eq!(visited.snapshot(), vec![5]);
}
