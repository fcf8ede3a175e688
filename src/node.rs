//! Internal node types for chain execution.
//!
//! Provides type erasure to store links with different input and output types in a single
//! arena. The public API remains fully type-safe: [`Chain<T>`](crate::Chain) only lets a link
//! accept what its predecessor produces, so the downcasts here cannot fail through the public
//! API.
//!
//! - **NodeKind**: closed set of link kinds, each carrying its user function
//! - **ErasedValue**: object-safe form of [`AsyncValue`] producing a type-erased value

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::Failure;
use crate::types::{NodeId, NodeState};
use crate::value::{AsyncValue, Callback};

/// Type-erased value travelling between links
pub(crate) type Erased = Box<dyn Any + Send>;

/// Apply step: consume the predecessor's value, produce the next async value
pub(crate) type ApplyFn =
    Box<dyn FnOnce(Erased) -> Result<Box<dyn ErasedValue>, Failure> + Send>;

/// Accept step: consume the final value
pub(crate) type AcceptFn = Box<dyn FnOnce(Erased) -> Result<(), Failure> + Send>;

/// Error step: consume an intercepted failure
pub(crate) type ErrorFn = Box<dyn FnOnce(Failure) + Send>;

/// Object-safe [`AsyncValue`] whose output is erased.
///
/// This is the only place where an async value loses its static type; it is wrapped with full
/// type information by [`erase`] and only re-typed by the next link's own function.
pub(crate) trait ErasedValue: Send {
    fn subscribe_erased(self: Box<Self>, callback: Callback<Erased>);
}

struct TypedValue<A>(A);

impl<A> ErasedValue for TypedValue<A>
where
    A: AsyncValue,
{
    fn subscribe_erased(self: Box<Self>, callback: Callback<Erased>) {
        self.0.subscribe_with(Box::new(move |result| {
            callback(result.map(|v| Box::new(v) as Erased))
        }));
    }
}

pub(crate) fn erase<A: AsyncValue + 'static>(value: A) -> Box<dyn ErasedValue> {
    Box::new(TypedValue(value))
}

/// Recover the concrete input of link `id`.
pub(crate) fn downcast<T: 'static>(id: NodeId, value: Erased) -> Result<T, Failure> {
    value.downcast::<T>().map(|v| *v).map_err(|_| {
        Failure::transform(
            id,
            format!(
                "link #{} expected a value of type {}",
                id.0,
                std::any::type_name::<T>()
            ),
        )
    })
}

/// Run a user function, converting a panic into a transform failure of link `id`.
pub(crate) fn guarded<R>(
    id: NodeId,
    f: impl FnOnce() -> Result<R, Failure>,
) -> Result<R, Failure> {
    catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(Failure::from_panic(id, payload)))
}

/// The closed set of link kinds.
pub(crate) enum NodeKind {
    /// Head of the chain; holds the initial value until the chain starts
    Root(Box<dyn ErasedValue>),
    /// Maps a value to a new async value and waits on it
    Apply(ApplyFn),
    /// Terminal consumer of the final value
    Accept(AcceptFn),
    /// Passes values through; intercepts failures
    Error(ErrorFn),
}

#[cfg(feature = "tracing")]
impl NodeKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            NodeKind::Root(_) => "root",
            NodeKind::Apply(_) => "apply",
            NodeKind::Accept(_) => "accept",
            NodeKind::Error(_) => "error",
        }
    }
}

/// One link of the chain arena.
///
/// `kind` is taken when the node is entered; `next` is written once while the chain is built.
pub(crate) struct Node {
    pub(crate) kind: Option<NodeKind>,
    pub(crate) next: Option<NodeId>,
    pub(crate) state: NodeState,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind: Some(kind),
            next: None,
            state: NodeState::Pending,
        }
    }
}
