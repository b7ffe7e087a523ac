//! Deciding whether a merged result is a success.
//!
//! A call fails when any operation reported a write error or any command
//! reported a write-concern error. Zero matches is never a failure.

use crate::merger::BulkWriteResult;
use crate::{Error, Result};

/// Return the result on success, or raise `BulkWriteFailure` carrying it.
pub fn classify(result: BulkWriteResult) -> Result<BulkWriteResult> {
    if result.has_errors() {
        Err(Error::BulkWriteFailure {
            result: Box::new(result),
        })
    } else {
        Ok(result)
    }
}
