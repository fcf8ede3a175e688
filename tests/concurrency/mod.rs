//! Many chains in flight at once
//!
//! Chains share nothing, so their links interleave freely while each chain stays ordered.

use std::time::{Duration, Instant};

use chainx::{result_slot, SinkError};
use futures::future::join_all;

use crate::common::RemoteStub;

fn request(remote: &RemoteStub, id: usize) -> chainx::SlotWaiter<String> {
    let next = remote.clone();
    let (slot, waiter) = result_slot();

    chainx::from(remote.call("service", format!("hello{id}")))
        .and_apply(move |body| next.call("service2", body))
        .deliver(slot);

    waiter
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_chains_get_their_own_results() {
    let remote = RemoteStub::new();

    let waiters: Vec<_> = (0..100).map(|id| request(&remote, id)).collect();
    let results = join_all(waiters).await;

    for (id, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap(), format!("hello{id}/service/service2"));
    }
    assert_eq!(remote.calls().len(), 200);
}

#[tokio::test(flavor = "current_thread")]
async fn test_single_thread_serves_many_chains() {
    // Twenty chains of two 50ms hops on one thread: a thread-per-request design would
    // need two seconds, callbacks overlap the waits.
    let remote = RemoteStub::with_delay(Duration::from_millis(50));
    let start = Instant::now();

    let waiters: Vec<_> = (0..20).map(|id| request(&remote, id)).collect();
    let results = join_all(waiters).await;

    assert!(results.iter().all(Result::is_ok));
    assert!(
        start.elapsed() < Duration::from_millis(1000),
        "chains did not overlap: {:?}",
        start.elapsed()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failures_stay_within_their_chain() {
    let healthy = RemoteStub::new();
    let broken = RemoteStub::new().failing_on("service2");

    let waiters: Vec<_> = (0..40)
        .map(|id| {
            if id % 2 == 0 {
                request(&healthy, id)
            } else {
                request(&broken, id)
            }
        })
        .collect();
    let results = join_all(waiters).await;

    for (id, result) in results.into_iter().enumerate() {
        if id % 2 == 0 {
            assert_eq!(result.unwrap(), format!("hello{id}/service/service2"));
        } else {
            assert!(matches!(result, Err(SinkError::Failed(ref e)) if e.message() == "boom"));
        }
    }
}
