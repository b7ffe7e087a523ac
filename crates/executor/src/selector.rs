//! Collaborators that reach the server.
//!
//! The executor does not own connections. It asks a [`PrimarySelector`] for
//! an [`ExecutionContext`] bound to the current primary and runs every
//! command of one submission through that context.

use std::sync::Arc;

use writepath_core::Document;

/// The round trip to the server failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct TransportError {
    /// What went wrong
    pub reason: String,
}

impl TransportError {
    /// Transport error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A channel to one server for the duration of a submission.
pub trait ExecutionContext {
    /// Send `command` to `database` and return the raw reply.
    fn run_command(&mut self, database: &str, command: Document) -> Result<Document, TransportError>;
}

/// Finds the primary and hands out contexts bound to it.
pub trait PrimarySelector: Send + Sync {
    /// Context bound to the selected primary; one is acquired per call.
    type Context: ExecutionContext;

    /// Select the primary and open a context on it.
    fn acquire_context(&self) -> Result<Self::Context, TransportError>;
}

impl<S: PrimarySelector + ?Sized> PrimarySelector for Arc<S> {
    type Context = S::Context;

    fn acquire_context(&self) -> Result<Self::Context, TransportError> {
        (**self).acquire_context()
    }
}
