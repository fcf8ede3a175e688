//! Chain builder with the link output type tracked in the type system.
//!
//! [`from`] creates the root link; every `and_*` method consumes the [`Chain`], appends exactly
//! one link and returns the chain typed by the new link's output. A link can therefore only
//! accept what its predecessor produces, and a chain can only ever grow at its tail.

use std::marker::PhantomData;

use crate::error::Failure;
use crate::node::{downcast, erase, Erased, NodeKind};
use crate::runner::{Observer, Runner};
use crate::sink::ResultSlot;
use crate::types::{NodeId, Settlement};
use crate::value::AsyncValue;

/// Start a chain from an initial async value.
///
/// Nothing is subscribed yet: the chain starts once it is terminated with
/// [`Chain::and_accept`], started with [`Chain::start`], or dropped. By then every link is in
/// place, so no resolution can race with construction.
///
/// # Examples
///
/// ```
/// use chainx::{failed, ready};
/// use std::sync::mpsc;
///
/// let (tx, rx) = mpsc::channel();
/// let errors = tx.clone();
///
/// chainx::from(ready(1))
///     .and_apply(|n| ready(n + 1))
///     .and_apply(|n| failed::<i32>(format!("step three rejected {n}")))
///     .and_error(move |e| errors.send(Err(e.to_string())).unwrap())
///     .and_accept(move |n| tx.send(Ok(n)).unwrap());
///
/// assert_eq!(rx.recv().unwrap(), Err("step three rejected 2".to_string()));
/// ```
pub fn from<A>(initial: A) -> Chain<A::Output>
where
    A: AsyncValue + 'static,
{
    Chain {
        runner: Some(Runner::new(erase(initial))),
        tail: NodeId::ROOT,
        _phantom: PhantomData,
    }
}

/// A chain under construction whose last link completes with `T`.
///
/// A `Chain<T>` is returned from [`from`] and every non-terminal builder method. Dropping it
/// starts the chain as built; a value reaching the end of an unterminated chain is discarded.
#[must_use = "a chain starts when it is accepted, started or dropped; bind it or finish it with `and_accept`"]
pub struct Chain<T> {
    pub(crate) runner: Option<Runner>,
    pub(crate) tail: NodeId,
    pub(crate) _phantom: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> Chain<T> {
    /// Append a step mapping the current value to a new async value.
    ///
    /// When the link runs it calls `f` and subscribes to the async value it returns; the
    /// resolution of that value continues the chain. If `f` panics, the panic becomes a
    /// [`Failure::Transform`] travelling down the chain.
    ///
    /// # Examples
    ///
    /// ```
    /// use chainx::{ready, result_slot};
    ///
    /// let (slot, waiter) = result_slot();
    /// chainx::from(ready("hello1"))
    ///     .and_apply(|s| ready(format!("{s}/service")))
    ///     .and_apply(|s| ready(s.len()))
    ///     .deliver(slot);
    ///
    /// assert_eq!(futures::executor::block_on(waiter).unwrap(), 14);
    /// ```
    pub fn and_apply<A, F>(self, f: F) -> Chain<A::Output>
    where
        F: FnOnce(T) -> A + Send + 'static,
        A: AsyncValue + 'static,
    {
        self.append(move |id| {
            NodeKind::Apply(Box::new(move |input: Erased| {
                let value = downcast::<T>(id, input)?;
                Ok(erase(f(value)))
            }))
        })
    }

    /// Terminate the chain with a consumer of the final value and start it.
    ///
    /// `f` is called synchronously by the link that receives the value. Nothing follows an
    /// accept link.
    pub fn and_accept<F>(self, f: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        let chain: Chain<()> = self.append(move |id| {
            NodeKind::Accept(Box::new(move |input: Erased| {
                f(downcast::<T>(id, input)?);
                Ok(())
            }))
        });
        chain.start();
    }

    /// Append an interception point for failures.
    ///
    /// Values pass through unchanged. A failure from any earlier link skips every apply and
    /// accept link in between and lands in `handler`; the chain ends there. A failure that
    /// meets no error link is silently discarded.
    pub fn and_error<F>(self, handler: F) -> Chain<T>
    where
        F: FnOnce(Failure) + Send + 'static,
    {
        self.append(move |_| NodeKind::Error(Box::new(handler)))
    }

    /// Terminate the chain into a [`ResultSlot`]: the value becomes the slot's result, any
    /// upstream failure its error.
    pub fn deliver(self, slot: ResultSlot<T>) {
        let on_error = slot.clone();
        self.and_error(move |err| {
            on_error.set_error(err);
        })
        .and_accept(move |value| {
            slot.set_result(value);
        });
    }

    /// Register `f` to learn how the chain ended. Called once, after the last link ran or when
    /// a pending async value is released without resolving.
    pub fn on_settle<F>(self, f: F) -> Chain<T>
    where
        F: FnOnce(Settlement) + Send + 'static,
    {
        self.observe(Box::new(move |report| f(report.settlement)))
    }

    /// Start an unterminated chain now instead of when it is dropped.
    pub fn start(mut self) {
        if let Some(runner) = self.runner.take() {
            runner.start();
        }
    }

    pub(crate) fn observe(mut self, observer: Observer) -> Chain<T> {
        if let Some(runner) = self.runner.as_mut() {
            runner.observe(observer);
        }
        self
    }

    fn append<U>(mut self, make: impl FnOnce(NodeId) -> NodeKind) -> Chain<U> {
        let mut tail = self.tail;
        let runner = self.runner.take().map(|mut runner| {
            tail = runner.link(tail, make);
            runner
        });

        Chain {
            runner,
            tail,
            _phantom: PhantomData,
        }
    }
}

impl<T> Drop for Chain<T> {
    fn drop(&mut self) {
        if let Some(runner) = self.runner.take() {
            runner.start();
        }
    }
}
