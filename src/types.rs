//! Core type definitions for chain links.
//!
//! Node identifiers index into a chain's private arena. The arena position doubles as the
//! construction order, so the root is always `NodeId(0)`.

/// Opaque node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);
}

/// Lifecycle of a single link.
///
/// Every node walks `Pending -> Running -> {Completed, Failed}` once. A node never re-enters
/// `Running` after reaching a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Linked into the chain, not reached yet
    Pending,
    /// Entered by its predecessor; an apply node stays here while its async value is pending
    Running,
    /// Produced (or passed on) a value, or handled a failure
    Completed,
    /// Produced or forwarded a failure
    Failed,
}

impl NodeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeState::Completed | NodeState::Failed)
    }
}

/// How a chain ended.
///
/// Reported once per chain to the observer registered with
/// [`Chain::on_settle`](crate::Chain::on_settle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Settlement {
    /// An accept node consumed the final value
    Accepted,
    /// An error node intercepted a failure
    Handled,
    /// The last link produced a value and nothing followed it
    ValueDropped,
    /// A failure reached the end of the chain without meeting an error node
    ErrorDropped,
    /// A pending async value was released without ever resolving
    Abandoned,
}
