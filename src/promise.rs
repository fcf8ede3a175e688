//! Write-once async values completed by hand.
//!
//! [`promise`] returns a producer/consumer pair. The [`Promise`] side can be cloned and handed
//! to whatever eventually learns the result (a worker thread, an I/O callback, a test). The
//! [`Deferred`] side is the [`AsyncValue`] a chain subscribes to.
//!
//! The first call to [`Promise::resolve`] or [`Promise::reject`] wins; later calls return
//! `false` and are ignored, so a racing second resolution can never reach the subscriber.

use std::sync::Arc;

use parking_lot::Mutex;

#[cfg(feature = "tracing")]
use tracing::trace;

use crate::error::Failure;
use crate::value::{AsyncValue, Callback};

enum State<T> {
    /// Neither settled nor subscribed
    Empty,
    /// Subscribed, waiting for the producer
    Waiting(Callback<T>),
    /// Settled before anyone subscribed
    Settled(Result<T, Failure>),
    /// Result handed to the subscriber
    Delivered,
}

/// Producer half of a [`promise`] pair.
pub struct Promise<T> {
    state: Arc<Mutex<State<T>>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Promise {
            state: Arc::clone(&self.state),
        }
    }
}

/// Consumer half of a [`promise`] pair; resolves when the promise is settled.
#[must_use = "a deferred value does nothing until subscribed"]
pub struct Deferred<T> {
    state: Arc<Mutex<State<T>>>,
}

/// Create a connected producer/consumer pair.
///
/// # Examples
///
/// ```
/// use chainx::{promise, AsyncValue};
/// use std::sync::mpsc;
///
/// let (promise, deferred) = promise::<String>();
/// let (tx, rx) = mpsc::channel();
///
/// deferred.subscribe(move |s| tx.send(s).unwrap(), |_| {});
///
/// std::thread::spawn(move || {
///     assert!(promise.resolve("done".to_string()));
///     assert!(!promise.resolve("too late".to_string()));
/// });
///
/// assert_eq!(rx.recv().unwrap(), "done");
/// ```
pub fn promise<T: Send + 'static>() -> (Promise<T>, Deferred<T>) {
    let state = Arc::new(Mutex::new(State::Empty));
    (
        Promise {
            state: Arc::clone(&state),
        },
        Deferred { state },
    )
}

impl<T: Send + 'static> Promise<T> {
    /// Settle with a value. Returns `false` if the promise was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with a failure. Returns `false` if the promise was already settled.
    pub fn reject(&self, err: impl Into<Failure>) -> bool {
        self.settle(Err(err.into()))
    }

    pub fn is_settled(&self) -> bool {
        matches!(*self.state.lock(), State::Settled(_) | State::Delivered)
    }

    fn settle(&self, result: Result<T, Failure>) -> bool {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, State::Delivered) {
            State::Empty => {
                *state = State::Settled(result);
                true
            }
            State::Waiting(callback) => {
                // Run the subscriber outside the lock; it may drive a whole chain
                drop(state);
                callback(result);
                true
            }
            previous @ (State::Settled(_) | State::Delivered) => {
                *state = previous;

                #[cfg(feature = "tracing")]
                trace!("ignoring second settlement of a promise");

                false
            }
        }
    }
}

impl<T: Send + 'static> AsyncValue for Deferred<T> {
    type Output = T;

    fn subscribe_with(self, callback: Callback<T>) {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, State::Delivered) {
            State::Empty => *state = State::Waiting(callback),
            State::Settled(result) => {
                drop(state);
                callback(result);
            }
            // A Deferred is consumed by subscribing and cannot be cloned
            previous @ (State::Waiting(_) | State::Delivered) => *state = previous,
        }
    }
}
