//! Typed convenience methods on the [`Executor`].
//!
//! Each method wraps [`Executor::execute`] with one [`Command`] and unpacks
//! the [`Output`] variant that command always produces.
//!
//! | Module | Methods |
//! |--------|---------|
//! | `bulk` | `bulk_write` |
//! | `write` | `remove_one`, `remove_many`, `replace_one`, `update_one`, `update_many` |
//! | `find_and_modify` | `find_one_and_delete`, `find_one_and_replace`, `find_one_and_update` |
//!
//! # Example
//!
//! ```text
//! use writepath_executor::{doc, Collection, Executor};
//!
//! let users = Collection::new("app", "users");
//! let idle = users.find(doc! { "status": "idle" });
//!
//! executor.update_many(&idle, doc! { "$set": doc! { "status": "active" } })?;
//! let oldest = executor.find_one_and_delete(&idle.with_sort(doc! { "age": -1i64 }))?;
//! ```

mod bulk;
mod find_and_modify;
mod write;

use crate::merger::BulkWriteResult;
use crate::{Error, Output, Result};
use writepath_core::Document;

fn expect_write_result(output: Output, command: &str) -> Result<BulkWriteResult> {
    match output {
        Output::WriteResult(result) => Ok(result),
        _ => Err(Error::Internal {
            reason: format!("Unexpected output for {}", command),
        }),
    }
}

fn expect_document(output: Output, command: &str) -> Result<Option<Document>> {
    match output {
        Output::Document(document) => Ok(document),
        _ => Err(Error::Internal {
            reason: format!("Unexpected output for {}", command),
        }),
    }
}
