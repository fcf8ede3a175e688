//! Async Continuation Chains
//!
//! A minimal, type-safe, runtime-agnostic combinator for sequencing non-blocking async steps
//! without parking a thread per request.
//!
//! # Features
//!
//! - **Compile-time link typing**: every link accepts exactly what its predecessor produces.
//!   [`Chain<T>`] tracks the output type of its last link, so wiring mistakes are type errors.
//! - **Strictly linear**: each builder call consumes the chain and appends one link. Branches
//!   and cycles cannot be expressed. See the [`linearity`] module.
//! - **Callback driven**: no link ever blocks. A link "pauses" by subscribing to an async value
//!   and resumes on whatever thread resolves it.
//! - **Failure propagation**: a failure skips every apply and accept link until the first error
//!   link intercepts it.
//! - **Runtime-agnostic**: chains work with any producer implementing [`AsyncValue`]. Futures
//!   run on any executor through [`spawned`].
//!
//! # Quick Start
//!
//! ```no_run
//! use chainx::{result_slot, spawned, Failure};
//!
//! fn remote(path: &'static str, req: String) -> impl chainx::AsyncValue<Output = String> {
//!     spawned(
//!         async move { Ok::<_, Failure>(format!("{req}/{path}")) },
//!         |fut| { tokio::spawn(fut); },
//!     )
//! }
//!
//! # async {
//! let (slot, waiter) = result_slot();
//!
//! chainx::from(remote("service", "hello1".to_string()))
//!     .and_apply(|body| remote("service2", body))
//!     .deliver(slot);
//!
//! assert_eq!(waiter.await.unwrap(), "hello1/service/service2");
//! # };
//! ```
//!
//! # Core Concepts
//!
//! ## AsyncValue
//!
//! An [`AsyncValue`] is a result that is not available yet. It has one operation: subscribe a
//! callback that fires exactly once with a value or a [`Failure`]. Subscribing consumes the
//! value, so it can be subscribed only once. There is no blocking `get`.
//!
//! Producers shipped with the crate:
//!
//! - [`ready`] / [`failed`]: already resolved
//! - [`promise`]: a [`Promise`] / [`Deferred`] pair completed by hand from any thread
//! - [`spawned`]: a future driven by the spawner you pass in
//! - [`AsyncValueExt::boxed`]: type erasure for mixing producers
//!
//! ## Chain
//!
//! [`from`] creates the root link from an initial async value. Builder methods append links:
//!
//! | Method | Link | On value | On failure |
//! |---|---|---|---|
//! | [`Chain::and_apply`] | apply | call `f`, wait on its async value | forward |
//! | [`Chain::and_error`] | error | forward unchanged | call handler, stop |
//! | [`Chain::and_accept`] | accept | call sink, stop | forward |
//!
//! Construction is synchronous. The chain subscribes to its root value only when it is
//! terminated with [`Chain::and_accept`] (or [`Chain::deliver`]), started with
//! [`Chain::start`], or dropped. Every link is in place before any resolution can arrive.
//!
//! ## Execution Order
//!
//! Links run strictly in construction order, one at a time: a link is only ever entered from
//! its predecessor's resolution. Separate chains run fully concurrently; they share nothing.
//!
//! # Error Handling
//!
//! There is one failure type, [`Failure`]:
//!
//! - [`Failure::Transport`]: an async value resolved to an error
//! - [`Failure::Transform`]: a function given to `and_apply` or `and_accept` panicked, or an
//!   async value panicked while being subscribed to
//!
//! A failure at any link travels down the chain, skipping apply and accept links, until the
//! first [`Chain::and_error`] link. That link calls its handler and the chain ends.
//!
//! **A failure that meets no error link is silently discarded**, and so is a value reaching
//! the end of a chain with no accept link. Nothing is delivered anywhere. Use
//! [`Chain::on_settle`] to find out how a chain ended:
//!
//! ```
//! use chainx::{failed, Settlement};
//! use std::sync::mpsc;
//!
//! let (tx, rx) = mpsc::channel();
//!
//! chainx::from(failed::<i32>("remote down"))
//!     .and_apply(|n| chainx::ready(n + 1))
//!     .on_settle(move |s| tx.send(s).unwrap())
//!     .and_accept(|_| unreachable!("never called"));
//!
//! assert_eq!(rx.recv().unwrap(), Settlement::ErrorDropped);
//! ```
//!
//! On the serving side, a [`ResultSlot`] whose handles were all dropped without a result
//! resolves its waiter to [`SinkError::Abandoned`].
//!
//! # No Cancellation, No Timeouts
//!
//! Once subscribed, an async value runs to resolution; a chain cannot abandon a pending step.
//! Deadlines belong to the producer (for example wrap the future in `tokio::time::timeout`
//! before handing it to [`spawned`]).
//!
//! # Optional Tracing Support
//!
//! chainx provides optional observability through the `tracing` crate with **zero runtime
//! overhead when disabled**. The instrumentation is conditionally compiled using feature flags.
//!
//! ```toml
//! [dependencies]
//! chainx = { version = "0.1", features = ["tracing"] }
//! tracing-subscriber = "0.3"
//! ```
//!
//! ```no_run
//! use tracing_subscriber::{fmt, EnvFilter};
//!
//! fmt()
//!     .with_env_filter(
//!         EnvFilter::try_from_default_env()
//!             .unwrap_or_else(|_| EnvFilter::new("chainx=debug"))
//!     )
//!     .init();
//! ```
//!
//! ## Log Levels
//!
//! - **DEBUG**: links added, chain start, settlement, intercepted failures
//! - **TRACE**: every link entered, every async value waited on
//! - **WARN**: failures dropped for lack of an error link
//! - **ERROR**: panics in user functions and spawned futures
//!
//! Control the level with `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=chainx=debug cargo run
//! RUST_LOG=chainx=trace cargo run
//! ```

// Module declarations
mod builder;
mod error;
pub mod linearity;
mod node;
mod promise;
mod runner;
mod sink;
mod spawned;
mod types;
mod value;

// Public re-exports
pub use builder::{from, Chain};
pub use error::{ChainResult, Failure};
pub use promise::{promise, Deferred, Promise};
pub use sink::{result_slot, ResultSlot, SinkError, SlotWaiter};
pub use spawned::{spawned, Spawned};
pub use types::{NodeState, Settlement};
pub use value::{failed, ready, AsyncValue, AsyncValueExt, BoxValue, Callback, Ready};
