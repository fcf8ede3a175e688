//! Write-once result slot observed by a serving layer.
//!
//! A request handler creates a slot, hands the [`ResultSlot`] half to the chain (usually through
//! [`Chain::deliver`](crate::Chain::deliver)) and returns the [`SlotWaiter`] to whatever writes
//! the response. The first `set_result` or `set_error` wins.
//!
//! If every `ResultSlot` handle is dropped without a write, the waiter resolves to
//! [`SinkError::Abandoned`]. That is how a chain that silently dropped its failure shows up on
//! the serving side.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::FutureExt;
use parking_lot::Mutex;
use thiserror::Error;

use crate::error::Failure;

/// Why a [`SlotWaiter`] did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SinkError {
    /// The slot was completed with a failure
    #[error(transparent)]
    Failed(#[from] Failure),

    /// Every slot handle was dropped without a result
    #[error("result slot dropped without a result")]
    Abandoned,
}

/// Writer half of a [`result_slot`]. Cheap to clone; all clones share one slot.
pub struct ResultSlot<T> {
    sender: Arc<Mutex<Option<oneshot::Sender<Result<T, Failure>>>>>,
}

impl<T> Clone for ResultSlot<T> {
    fn clone(&self) -> Self {
        ResultSlot {
            sender: Arc::clone(&self.sender),
        }
    }
}

/// Reader half of a [`result_slot`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct SlotWaiter<T> {
    receiver: oneshot::Receiver<Result<T, Failure>>,
}

/// Create a connected slot/waiter pair.
///
/// # Examples
///
/// ```
/// use chainx::{ready, result_slot};
///
/// let (slot, waiter) = result_slot();
/// chainx::from(ready("hello1/service".to_string()))
///     .and_apply(|s| ready(format!("{s}/service2")))
///     .deliver(slot);
///
/// let body = futures::executor::block_on(waiter).unwrap();
/// assert_eq!(body, "hello1/service/service2");
/// ```
pub fn result_slot<T>() -> (ResultSlot<T>, SlotWaiter<T>) {
    let (sender, receiver) = oneshot::channel();
    (
        ResultSlot {
            sender: Arc::new(Mutex::new(Some(sender))),
        },
        SlotWaiter { receiver },
    )
}

impl<T> ResultSlot<T> {
    /// Complete the slot with a value. Returns `false` if it was already completed or the
    /// waiter is gone.
    pub fn set_result(&self, value: T) -> bool {
        self.set(Ok(value))
    }

    /// Complete the slot with a failure. Returns `false` if it was already completed or the
    /// waiter is gone.
    pub fn set_error(&self, err: impl Into<Failure>) -> bool {
        self.set(Err(err.into()))
    }

    /// Whether the slot was completed or its waiter dropped.
    pub fn is_set_or_expired(&self) -> bool {
        self.sender
            .lock()
            .as_ref()
            .map_or(true, oneshot::Sender::is_canceled)
    }

    fn set(&self, result: Result<T, Failure>) -> bool {
        match self.sender.lock().take() {
            Some(sender) => sender.send(result).is_ok(),
            None => false,
        }
    }
}

impl<T> Future for SlotWaiter<T> {
    type Output = Result<T, SinkError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.receiver.poll_unpin(cx).map(|received| match received {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(SinkError::Failed(err)),
            Err(oneshot::Canceled) => Err(SinkError::Abandoned),
        })
    }
}
