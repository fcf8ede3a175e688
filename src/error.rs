//! Error types for chain execution.
//!
//! A chain only ever carries one kind of error value, [`Failure`]. It covers both a step whose
//! async value resolved to an error and a user function that panicked while the chain was
//! driving it. Both surface the same way: as an opaque failure carrying a message.

use std::any::Any;

use thiserror::Error;

use crate::types::NodeId;

/// Failure travelling down a chain until an error node intercepts it.
///
/// `Display` prints the bare message for every variant, so a handler that only cares about the
/// text can use `failure.to_string()` or [`Failure::message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Failure {
    /// An async value resolved to an error (network failure, remote error, ...).
    #[error("{message}")]
    Transport { message: String },

    /// A function handed to `and_apply` or `and_accept` panicked while running, or an async
    /// value panicked while being subscribed to.
    #[error("{message}")]
    Transform { node: usize, message: String },
}

impl Failure {
    /// Create a transport failure with the given message.
    pub fn transport(message: impl Into<String>) -> Self {
        Failure::Transport {
            message: message.into(),
        }
    }

    pub(crate) fn transform(node: NodeId, message: impl Into<String>) -> Self {
        Failure::Transform {
            node: node.0,
            message: message.into(),
        }
    }

    pub(crate) fn from_panic(node: NodeId, payload: Box<dyn Any + Send>) -> Self {
        Failure::transform(node, panic_message(payload.as_ref()))
    }

    /// The message carried by this failure.
    pub fn message(&self) -> &str {
        match self {
            Failure::Transport { message } | Failure::Transform { message, .. } => message,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Failure::Transport { .. })
    }

    pub fn is_transform(&self) -> bool {
        matches!(self, Failure::Transform { .. })
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Failure::transport(message)
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Failure::transport(message)
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        Failure::transport(err.to_string())
    }
}

/// Extract a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Result type whose error arm is a chain [`Failure`]
#[cfg(not(tarpaulin_include))]
pub type ChainResult<T> = Result<T, Failure>;
