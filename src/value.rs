//! The async value contract consumed by chains, plus the simplest producers.
//!
//! An [`AsyncValue`] is a result that is not available yet. It offers exactly one operation:
//! subscribe a callback. The callback fires exactly once, with either the value or a
//! [`Failure`], possibly on a different thread than the subscriber. There is no way to peek at
//! or block on the result; that would defeat the point of not tying up a thread per request.
//!
//! Subscription takes `self` by value, so subscribing twice to the same value does not compile.

use crate::error::Failure;

/// Callback receiving the single resolution of an [`AsyncValue`].
pub type Callback<T> = Box<dyn FnOnce(Result<T, Failure>) + Send + 'static>;

/// A value that resolves to success or failure exactly once.
///
/// Implementors must invoke the callback passed to [`subscribe_with`](AsyncValue::subscribe_with)
/// at most once. They may invoke it synchronously (for values that are already resolved) or
/// later from any thread. A chain catches a panic escaping `subscribe_with` and fails the
/// waiting link with [`Failure::Transform`].
///
/// # Examples
///
/// ```
/// use chainx::{ready, AsyncValue};
/// use std::sync::mpsc;
///
/// let (tx, rx) = mpsc::channel();
/// ready(21).subscribe(
///     move |value| tx.send(value * 2).unwrap(),
///     |err| panic!("unexpected failure: {err}"),
/// );
/// assert_eq!(rx.recv().unwrap(), 42);
/// ```
pub trait AsyncValue: Send {
    type Output: Send + 'static;

    /// Register the callback that receives this value's resolution.
    fn subscribe_with(self, callback: Callback<Self::Output>);

    /// Register a success arm and a failure arm. Exactly one of them fires, exactly once.
    fn subscribe<S, F>(self, on_success: S, on_failure: F)
    where
        Self: Sized,
        S: FnOnce(Self::Output) + Send + 'static,
        F: FnOnce(Failure) + Send + 'static,
    {
        self.subscribe_with(Box::new(move |result| match result {
            Ok(value) => on_success(value),
            Err(err) => on_failure(err),
        }));
    }
}

/// Extension methods available on every [`AsyncValue`].
pub trait AsyncValueExt: AsyncValue + Sized + 'static {
    /// Erase the concrete producer type.
    ///
    /// Handy when one `and_apply` closure returns different kinds of async values from
    /// different branches.
    ///
    /// ```
    /// use chainx::{failed, ready, AsyncValueExt, BoxValue};
    ///
    /// fn lookup(key: &str) -> BoxValue<u32> {
    ///     match key {
    ///         "answer" => ready(42).boxed(),
    ///         _ => failed("no such key").boxed(),
    ///     }
    /// }
    /// # let _ = lookup("answer");
    /// ```
    fn boxed(self) -> BoxValue<Self::Output> {
        BoxValue {
            subscribe: Box::new(move |callback| self.subscribe_with(callback)),
        }
    }
}

impl<A: AsyncValue + Sized + 'static> AsyncValueExt for A {}

/// A type-erased [`AsyncValue`], created with [`AsyncValueExt::boxed`].
pub struct BoxValue<T> {
    subscribe: Box<dyn FnOnce(Callback<T>) + Send>,
}

impl<T: Send + 'static> AsyncValue for BoxValue<T> {
    type Output = T;

    fn subscribe_with(self, callback: Callback<T>) {
        (self.subscribe)(callback)
    }
}

/// An async value that is already resolved.
///
/// Subscribing fires the callback synchronously on the subscribing thread.
#[derive(Debug, Clone)]
pub struct Ready<T> {
    result: Result<T, Failure>,
}

impl<T: Send + 'static> AsyncValue for Ready<T> {
    type Output = T;

    fn subscribe_with(self, callback: Callback<T>) {
        callback(self.result)
    }
}

/// An async value already resolved to `value`.
pub fn ready<T: Send + 'static>(value: T) -> Ready<T> {
    Ready { result: Ok(value) }
}

/// An async value already resolved to a failure.
pub fn failed<T: Send + 'static>(err: impl Into<Failure>) -> Ready<T> {
    Ready {
        result: Err(err.into()),
    }
}

impl<T: Send + 'static> From<Result<T, Failure>> for Ready<T> {
    fn from(result: Result<T, Failure>) -> Self {
        Ready { result }
    }
}
