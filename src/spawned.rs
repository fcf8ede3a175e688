//! Adapter turning a future into an [`AsyncValue`] resolved on a worker pool.
//!
//! chainx does not own threads. Whoever builds a spawned value decides where it runs by passing
//! a spawner, exactly like handing a future to an executor:
//!
//! - Tokio: `|fut| { tokio::spawn(fut); }`
//! - futures thread pool: `move |fut| pool.spawn_ok(fut)`
//! - Smol: `|fut| smol::spawn(fut).detach()`
//!
//! The future is not polled until the value is subscribed.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::future::BoxFuture;
use futures::FutureExt;

#[cfg(feature = "tracing")]
use tracing::error;

use crate::error::{panic_message, Failure};
use crate::value::{AsyncValue, Callback};

/// An [`AsyncValue`] backed by a future and the spawner that will drive it.
///
/// Created with [`spawned`].
#[must_use = "a spawned value does nothing until subscribed"]
pub struct Spawned<F, S> {
    future: F,
    spawner: S,
}

/// Wrap `future` so it runs on `spawner` once subscribed.
///
/// A future that panics resolves to a transport failure carrying the panic message.
///
/// # Examples
///
/// ```no_run
/// use chainx::{spawned, Failure};
///
/// # async {
/// let value = spawned(
///     async { Ok::<_, Failure>("hello1/service".to_string()) },
///     |fut| { tokio::spawn(fut); },
/// );
///
/// chainx::from(value).and_accept(|body| println!("{body}"));
/// # };
/// ```
pub fn spawned<F, S, T>(future: F, spawner: S) -> Spawned<F, S>
where
    F: Future<Output = Result<T, Failure>> + Send + 'static,
    S: FnOnce(BoxFuture<'static, ()>) + Send,
    T: Send + 'static,
{
    Spawned { future, spawner }
}

impl<F, S, T> AsyncValue for Spawned<F, S>
where
    F: Future<Output = Result<T, Failure>> + Send + 'static,
    S: FnOnce(BoxFuture<'static, ()>) + Send,
    T: Send + 'static,
{
    type Output = T;

    fn subscribe_with(self, callback: Callback<T>) {
        let future = self.future;
        let task = async move {
            let result = AssertUnwindSafe(future)
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    let message = panic_message(payload.as_ref());

                    #[cfg(feature = "tracing")]
                    error!(panic_message = %message, "spawned value panicked");

                    Err(Failure::transport(message))
                });
            callback(result);
        };

        (self.spawner)(task.boxed());
    }
}
