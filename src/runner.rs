//! Chain runner: the arena of links and the loop that drives them.
//!
//! A runner is built synchronously by [`Chain`](crate::Chain) and started exactly once. From
//! then on it is *moved* from one resolution callback to the next: whoever holds the runner is
//! the only code touching the chain, so nothing inside needs a lock.
//!
//! Driving is a small loop over [`Step`]s. Each step either enters the next link, suspends the
//! runner inside an async value's callback, or finishes the chain.

use std::sync::Arc;

use parking_lot::Mutex;

#[cfg(feature = "tracing")]
use tracing::{debug, error, trace, warn};

use crate::error::Failure;
use crate::node::{guarded, Erased, ErasedValue, Node, NodeKind};
use crate::types::{NodeId, NodeState, Settlement};

/// Final snapshot handed to observers when the runner is released.
pub(crate) struct Report {
    pub(crate) settlement: Settlement,
    #[cfg(test)]
    pub(crate) states: Vec<NodeState>,
}

pub(crate) type Observer = Box<dyn FnOnce(&Report) + Send>;

/// What a link receives from its predecessor.
enum Signal {
    Run(Erased),
    Error(Failure),
}

enum Step {
    /// Enter link `NodeId` with the signal
    Continue(NodeId, Signal),
    /// Wait for the async value produced by link `NodeId`
    Suspend(NodeId, Box<dyn ErasedValue>),
    /// The chain is over
    Finish(Settlement),
}

/// Hand-off cell between a suspended runner and the callback of the value it waits on.
struct Parked {
    /// Set once `subscribe_erased` returned without a resolution
    runner: Option<Runner>,
    /// Set by a resolution that arrived while the runner was still subscribing
    result: Option<Result<Erased, Failure>>,
}

pub(crate) struct Runner {
    nodes: Vec<Node>,
    observers: Vec<Observer>,
    settlement: Option<Settlement>,
}

impl Runner {
    pub(crate) fn new(initial: Box<dyn ErasedValue>) -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Root(initial))],
            observers: Vec::new(),
            settlement: None,
        }
    }

    /// Append a link after `tail` and return its id.
    ///
    /// `make` receives the id the new link will have, so user functions can tag their failures.
    pub(crate) fn link(&mut self, tail: NodeId, make: impl FnOnce(NodeId) -> NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let kind = make(id);

        #[cfg(feature = "tracing")]
        debug!(
            node_id = id.0,
            predecessor = tail.0,
            kind = kind.name(),
            "linking node"
        );

        self.nodes.push(Node::new(kind));

        let predecessor = &mut self.nodes[tail.0];
        debug_assert!(
            predecessor.next.is_none(),
            "link #{} already has a successor",
            tail.0
        );
        predecessor.next = Some(id);
        id
    }

    pub(crate) fn observe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Subscribe to the root value. Every link is in place by now.
    pub(crate) fn start(mut self) {
        #[cfg(feature = "tracing")]
        debug!(node_count = self.nodes.len(), "starting chain");

        let root = &mut self.nodes[NodeId::ROOT.0];
        root.state = NodeState::Running;
        match root.kind.take() {
            Some(NodeKind::Root(initial)) => self.drive(Step::Suspend(NodeId::ROOT, initial)),
            _ => {
                #[cfg(feature = "tracing")]
                error!("chain root was already started");
            }
        }
    }

    fn drive(mut self, mut step: Step) {
        loop {
            step = match step {
                Step::Continue(id, signal) => self.dispatch(id, signal),
                Step::Suspend(id, value) => match self.suspend(id, value) {
                    Some((runner, step)) => {
                        self = runner;
                        step
                    }
                    None => return,
                },
                Step::Finish(settlement) => {
                    #[cfg(feature = "tracing")]
                    debug!(?settlement, "chain settled");

                    self.settlement = Some(settlement);
                    return;
                }
            };
        }
    }

    /// Subscribe to the async value of link `id`.
    ///
    /// A value resolving before `subscribe_erased` returns leaves its result in the shared
    /// [`Parked`] cell and the loop in [`drive`](Runner::drive) continues with it, so chains of
    /// already-resolved values run in constant stack depth. Otherwise the runner is parked in
    /// the cell and the late resolution resumes it. Returns `None` once the runner is parked.
    fn suspend(mut self, id: NodeId, value: Box<dyn ErasedValue>) -> Option<(Runner, Step)> {
        #[cfg(feature = "tracing")]
        trace!(node_id = id.0, "waiting on async value");

        let parked = Arc::new(Mutex::new(Parked {
            runner: None,
            result: None,
        }));
        let on_resolve = Arc::clone(&parked);

        let subscribed = guarded(id, move || {
            value.subscribe_erased(Box::new(move |result| {
                let mut cell = on_resolve.lock();
                match cell.runner.take() {
                    Some(runner) => {
                        drop(cell);
                        runner.resume(id, result);
                    }
                    None => cell.result = Some(result),
                }
            }));
            Ok(())
        });

        let mut cell = parked.lock();
        if let Some(result) = cell.result.take() {
            drop(cell);
            let step = self.resolved(id, result);
            return Some((self, step));
        }
        if let Err(err) = subscribed {
            drop(cell);

            #[cfg(feature = "tracing")]
            error!(node_id = id.0, failure = %err, "subscribing to async value panicked");

            let step = self.error(id, err);
            return Some((self, step));
        }
        cell.runner = Some(self);
        None
    }

    /// The async value of link `id` resolved after the runner was parked.
    fn resume(mut self, id: NodeId, result: Result<Erased, Failure>) {
        let step = self.resolved(id, result);
        self.drive(step);
    }

    fn resolved(&mut self, id: NodeId, result: Result<Erased, Failure>) -> Step {
        match result {
            Ok(value) => self.complete(id, value),
            Err(err) => self.error(id, err),
        }
    }

    /// Enter link `id`. The single place where link kinds are told apart.
    fn dispatch(&mut self, id: NodeId, signal: Signal) -> Step {
        let node = &mut self.nodes[id.0];
        debug_assert_eq!(node.state, NodeState::Pending, "link #{} entered twice", id.0);

        let Some(kind) = node.kind.take() else {
            #[cfg(feature = "tracing")]
            error!(node_id = id.0, state = ?node.state, "link entered twice");

            return Step::Finish(match signal {
                Signal::Run(_) => Settlement::ValueDropped,
                Signal::Error(_) => Settlement::ErrorDropped,
            });
        };

        node.state = NodeState::Running;

        #[cfg(feature = "tracing")]
        trace!(
            node_id = id.0,
            kind = kind.name(),
            failure = matches!(signal, Signal::Error(_)),
            "entering link"
        );

        match (kind, signal) {
            (NodeKind::Apply(f), Signal::Run(value)) => match guarded(id, || f(value)) {
                Ok(next_value) => Step::Suspend(id, next_value),
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    error!(node_id = id.0, failure = %err, "apply step failed");

                    self.error(id, err)
                }
            },
            (NodeKind::Accept(f), Signal::Run(value)) => match guarded(id, || f(value)) {
                Ok(()) => {
                    self.nodes[id.0].state = NodeState::Completed;
                    Step::Finish(Settlement::Accepted)
                }
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    error!(node_id = id.0, failure = %err, "accept step failed");

                    self.error(id, err)
                }
            },
            (NodeKind::Error(_), Signal::Run(value)) => self.complete(id, value),
            (NodeKind::Error(handler), Signal::Error(err)) => {
                #[cfg(feature = "tracing")]
                debug!(node_id = id.0, failure = %err, "error handler intercepted failure");

                if let Err(_panic) = guarded(id, || {
                    handler(err);
                    Ok(())
                }) {
                    #[cfg(feature = "tracing")]
                    error!(node_id = id.0, panic = %_panic, "error handler panicked");
                }
                self.nodes[id.0].state = NodeState::Completed;
                Step::Finish(Settlement::Handled)
            }
            (NodeKind::Apply(_) | NodeKind::Accept(_), Signal::Error(err)) => self.error(id, err),
            (NodeKind::Root(_), signal) => {
                #[cfg(feature = "tracing")]
                error!("root link entered from a predecessor");

                match signal {
                    Signal::Run(value) => self.complete(id, value),
                    Signal::Error(err) => self.error(id, err),
                }
            }
        }
    }

    /// Link `id` produced `value`: run the successor, or drop the value at the end.
    fn complete(&mut self, id: NodeId, value: Erased) -> Step {
        let node = &mut self.nodes[id.0];
        node.state = NodeState::Completed;
        match node.next {
            Some(next) => Step::Continue(next, Signal::Run(value)),
            None => {
                #[cfg(feature = "tracing")]
                debug!(node_id = id.0, "no successor; value dropped");

                Step::Finish(Settlement::ValueDropped)
            }
        }
    }

    /// Link `id` failed or is forwarding a failure: pass it on, or drop it at the end.
    fn error(&mut self, id: NodeId, err: Failure) -> Step {
        let node = &mut self.nodes[id.0];
        node.state = NodeState::Failed;
        match node.next {
            Some(next) => Step::Continue(next, Signal::Error(err)),
            None => {
                #[cfg(feature = "tracing")]
                warn!(node_id = id.0, failure = %err, "no error handler; failure dropped");

                Step::Finish(Settlement::ErrorDropped)
            }
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if self.settlement.is_none() {
            #[cfg(feature = "tracing")]
            debug!("chain abandoned before settling");
        }

        if self.observers.is_empty() {
            return;
        }

        let report = Report {
            settlement: self.settlement.unwrap_or(Settlement::Abandoned),
            #[cfg(test)]
            states: self.nodes.iter().map(|node| node.state).collect(),
        };
        for observer in self.observers.drain(..) {
            observer(&report);
        }
    }
}
