//! Output enum for command execution results.
//!
//! Every command produces exactly one output type. This mapping is deterministic:
//! the same command always produces the same output variant (though the values
//! depend on what the server holds).

use serde::{Deserialize, Serialize};
use writepath_core::Document;

use crate::merger::BulkWriteResult;

/// Successful command execution results.
///
/// | Command | Output |
/// |---------|--------|
/// | `BulkWrite`, `RemoveOne`, `RemoveMany`, `ReplaceOne`, `UpdateOne`, `UpdateMany` | `WriteResult` |
/// | `FindOneAndDelete`, `FindOneAndReplace`, `FindOneAndUpdate` | `Document` |
///
/// # Example
///
/// ```text
/// use writepath_executor::{Command, Output};
///
/// match executor.execute(&view, Command::FindOneAndDelete)? {
///     Output::Document(Some(d)) => println!("removed {:?}", d),
///     Output::Document(None) => println!("nothing matched"),
///     _ => unreachable!("FindOneAndDelete always returns Document"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// Document returned by a find-and-modify; `None` when nothing matched
    Document(Option<Document>),

    /// Aggregate counts of a write with no write errors
    WriteResult(BulkWriteResult),
}
