//! Execution coordinator: sending planned batches one at a time.
//!
//! The coordinator owns the continuation rule:
//! - Ordered: stop after the first batch whose reply carries a write error
//!   or a write-concern error. Later batches are never sent.
//! - Unordered: send every batch regardless of earlier errors.
//!
//! A transport failure, an `ok: 0` reply or an unreadable reply stops the
//! sequence in both modes. The error carries the result merged from the
//! batches that completed before it.

use tracing::{debug, info, warn};

use crate::builder::{CommandBuilder, CommandOptions};
use crate::merger::{ExecutionOutcome, ResultMerger};
use crate::planner::Batch;
use crate::reply::BatchReply;
use crate::selector::ExecutionContext;
use crate::{Error, Result};

/// Sends the batches of one call through one execution context.
pub struct ExecutionCoordinator<'a, X: ExecutionContext> {
    context: &'a mut X,
    builder: &'a CommandBuilder,
    database: &'a str,
    options: &'a CommandOptions,
}

impl<'a, X: ExecutionContext> ExecutionCoordinator<'a, X> {
    /// Coordinator sending through `context` to `database`.
    pub fn new(
        context: &'a mut X,
        builder: &'a CommandBuilder,
        database: &'a str,
        options: &'a CommandOptions,
    ) -> Self {
        Self {
            context,
            builder,
            database,
            options,
        }
    }

    /// Send `batches` in order and merge their replies.
    ///
    /// Returns the merged outcome even if it holds write errors; deciding
    /// whether that is a failure is left to the caller.
    ///
    /// # Errors
    ///
    /// - `Transport` if a round trip fails
    /// - `CommandFailed` if the server rejects a whole command
    /// - `InvalidReply` if a reply cannot be parsed or merged
    pub fn run(mut self, batches: Vec<Batch>) -> Result<ExecutionOutcome> {
        let total = batches.len();
        let mut merger = ResultMerger::new();

        for (number, batch) in batches.into_iter().enumerate() {
            let encoded_size = batch.encoded_size();
            let (kind, segments, indexes) = batch.into_parts();
            let len = segments.len();
            let command = self.builder.command(kind, segments, self.options);

            debug!(
                target: "writepath::bulk",
                batch = number,
                kind = kind.command_name(),
                operations = len,
                size = encoded_size,
                "Sending batch"
            );

            let raw = match self.context.run_command(self.database, command) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(target: "writepath::bulk", batch = number, error = %e, "Transport failure, abandoning remaining batches");
                    return Err(Error::Transport {
                        reason: e.reason,
                        partial: Some(merger.snapshot()),
                    });
                }
            };

            let reply = match BatchReply::parse(kind, len, &raw) {
                Ok(reply) => reply,
                Err(Error::CommandFailed { code, message, .. }) => {
                    warn!(target: "writepath::bulk", batch = number, code, errmsg = %message, "Command failed");
                    return Err(Error::CommandFailed {
                        code,
                        message,
                        partial: Some(merger.snapshot()),
                    });
                }
                Err(Error::InvalidReply { reason, .. }) => {
                    warn!(target: "writepath::bulk", batch = number, %reason, "Unreadable reply");
                    return Err(Error::InvalidReply {
                        reason,
                        partial: Some(merger.snapshot()),
                    });
                }
                Err(e) => return Err(e),
            };

            let failed = reply.has_errors();
            if let Err(e) = merger.merge(kind, &indexes, reply) {
                return Err(Error::InvalidReply {
                    reason: e.to_string(),
                    partial: Some(merger.snapshot()),
                });
            }

            if failed && self.options.ordered {
                let skipped = total - number - 1;
                if skipped > 0 {
                    warn!(target: "writepath::bulk", batch = number, skipped, "Ordered bulk write halted");
                }
                break;
            }
        }

        let result = merger.result();
        info!(
            target: "writepath::bulk",
            batches = merger.batches(),
            planned = total,
            inserted = result.inserted_count,
            matched = result.matched_count,
            modified = result.modified_count,
            deleted = result.deleted_count,
            upserted = result.upserted_count,
            errors = result.write_errors.len(),
            "Bulk write completed"
        );
        Ok(merger.finish())
    }
}
