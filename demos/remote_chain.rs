//! Serve ten concurrent requests, each making two sequential calls to a slow remote service
//! and one to a local worker pool, without parking a thread per request.
//!
//! Run with: `RUST_LOG=chainx=debug,remote_chain=info cargo run --example remote_chain --features tracing`

use std::time::{Duration, Instant};

use chainx::{result_slot, spawned, AsyncValue, Failure, SlotWaiter};
use futures::future::join_all;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const REMOTE_LATENCY: Duration = Duration::from_secs(2);
const REQUESTS: usize = 10;

/// Simulated remote endpoint answering `"{request}/{path}"` after [`REMOTE_LATENCY`].
fn remote(path: &'static str, request: String) -> impl AsyncValue<Output = String> {
    spawned(
        async move {
            info!(path, %request, "remote request");
            tokio::time::sleep(REMOTE_LATENCY).await;
            Ok::<_, Failure>(format!("{request}/{path}"))
        },
        |fut| {
            tokio::spawn(fut);
        },
    )
}

/// CPU-side work handed to the blocking pool.
fn work(request: String) -> impl AsyncValue<Output = String> {
    spawned(
        async move {
            tokio::task::spawn_blocking(move || {
                std::thread::sleep(Duration::from_millis(100));
                format!("{request}/asyncwork")
            })
            .await
            .map_err(|err| Failure::transport(err.to_string()))
        },
        |fut| {
            tokio::spawn(fut);
        },
    )
}

fn handle(idx: usize) -> SlotWaiter<String> {
    let (slot, waiter) = result_slot();

    chainx::from(remote("service", format!("hello{idx}")))
        .and_apply(|body| remote("service2", body))
        .and_apply(work)
        .deliver(slot);

    waiter
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chainx=debug,remote_chain=info")),
        )
        .init();

    let total = Instant::now();

    let requests = (1..=REQUESTS).map(|idx| async move {
        let started = Instant::now();
        match handle(idx).await {
            Ok(body) => info!(idx, elapsed = ?started.elapsed(), %body, "request served"),
            Err(err) => warn!(idx, elapsed = ?started.elapsed(), %err, "request failed"),
        }
    });
    join_all(requests).await;

    info!(elapsed = ?total.elapsed(), "all requests served");
}
