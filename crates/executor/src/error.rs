//! Error types for write execution.
//!
//! All errors from the write path are represented by the [`Error`] enum.
//! These errors are:
//! - **Structured**: Each variant has typed fields for error details
//! - **Serializable**: Can be converted to/from JSON
//! - **Honest about progress**: Every failure raised after the first command
//!   was sent carries the result merged so far

use serde::{Deserialize, Serialize};

use crate::merger::BulkWriteResult;

/// Write execution errors.
///
/// # Categories
///
/// | Category | Variants | Sent anything? |
/// |----------|----------|----------------|
/// | Planning | `DocumentTooLarge`, `InvalidInput`, `Serialization` | no |
/// | Server | `BulkWriteFailure`, `CommandFailed` | yes |
/// | Collaborator | `Transport`, `InvalidReply` | maybe |
/// | System | `Internal` | - |
///
/// # Example
///
/// ```ignore
/// match executor.bulk_write(&users, models, BulkWriteOptions::ordered()) {
///     Ok(result) => println!("inserted {}", result.inserted_count),
///     Err(Error::BulkWriteFailure { result }) => {
///         for e in &result.write_errors {
///             println!("operation {} failed: {}", e.index, e.errmsg);
///         }
///     }
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // ==================== Planning ====================
    /// One operation cannot fit in any command
    #[error("document too large: operation {index} encodes to {size} bytes, maximum is {max}")]
    DocumentTooLarge {
        /// Position of the operation in the submitted list
        index: usize,
        /// Encoded size of the smallest command that could carry it
        size: usize,
        /// Maximum message size in effect
        max: usize,
    },

    /// Invalid input
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with the input
        reason: String,
    },

    /// A document could not be sized or encoded
    #[error("serialization error: {reason}")]
    Serialization {
        /// Codec error message
        reason: String,
    },

    // ==================== Server ====================
    /// At least one operation failed; `result` shows what succeeded
    #[error(
        "bulk write failure: {} write error(s), {} write concern error(s)",
        .result.write_errors.len(),
        .result.write_concern_errors.len()
    )]
    BulkWriteFailure {
        /// Merged result, errors included
        result: Box<BulkWriteResult>,
    },

    /// The server rejected a whole command
    #[error("command failed ({code}): {message}")]
    CommandFailed {
        /// Server error code
        code: i32,
        /// Server error message
        message: String,
        /// Result merged from the commands before the rejected one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        partial: Option<Box<BulkWriteResult>>,
    },

    // ==================== Collaborator ====================
    /// The primary could not be reached or the round trip failed
    #[error("transport error: {reason}")]
    Transport {
        /// Transport failure message
        reason: String,
        /// Result merged from the commands that completed
        #[serde(default, skip_serializing_if = "Option::is_none")]
        partial: Option<Box<BulkWriteResult>>,
    },

    /// A reply did not have the shape of a write command reply
    #[error("invalid reply: {reason}")]
    InvalidReply {
        /// What was wrong with the reply
        reason: String,
        /// Result merged from the commands before the unreadable reply
        #[serde(default, skip_serializing_if = "Option::is_none")]
        partial: Option<Box<BulkWriteResult>>,
    },

    // ==================== System ====================
    /// Internal error (bug or invariant violation)
    #[error("internal error: {reason}")]
    Internal {
        /// Description of the violated invariant
        reason: String,
    },
}

impl Error {
    /// The result merged before the failure, if any command was sent.
    pub fn partial_result(&self) -> Option<&BulkWriteResult> {
        match self {
            Error::BulkWriteFailure { result } => Some(result),
            Error::CommandFailed { partial, .. }
            | Error::Transport { partial, .. }
            | Error::InvalidReply { partial, .. } => partial.as_deref(),
            _ => None,
        }
    }

    /// Whether the failure happened before any command was sent.
    pub fn is_planning_error(&self) -> bool {
        matches!(
            self,
            Error::DocumentTooLarge { .. } | Error::InvalidInput { .. } | Error::Serialization { .. }
        )
    }
}
