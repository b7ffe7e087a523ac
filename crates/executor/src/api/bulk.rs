//! Bulk write.

use writepath_core::DocumentCodec;

use super::expect_write_result;
use crate::command::{BulkWriteOptions, WriteModel};
use crate::merger::BulkWriteResult;
use crate::selector::PrimarySelector;
use crate::target::WriteTarget;
use crate::{Command, Executor, Result};

impl<S: PrimarySelector, C: DocumentCodec> Executor<S, C> {
    /// Execute a list of write models against the target's collection.
    ///
    /// Consecutive models of the same command kind share commands, split by
    /// the effective limits. With `ordered`, nothing after the first failing
    /// batch is sent.
    ///
    /// # Errors
    ///
    /// - `DocumentTooLarge` before anything is sent, if one model cannot fit
    /// - `BulkWriteFailure` carrying the merged result, if any write or
    ///   write-concern error was reported
    /// - `Transport` / `CommandFailed` carrying what completed before them
    ///
    /// # Example
    ///
    /// ```ignore
    /// let result = executor.bulk_write(
    ///     &users,
    ///     vec![
    ///         WriteModel::InsertOne { document: doc! { "_id": 1i64 } },
    ///         WriteModel::DeleteMany { filter: doc! { "stale": true } },
    ///     ],
    ///     BulkWriteOptions::unordered(),
    /// )?;
    /// ```
    pub fn bulk_write<T: WriteTarget + ?Sized>(
        &self,
        target: &T,
        models: Vec<WriteModel>,
        options: BulkWriteOptions,
    ) -> Result<BulkWriteResult> {
        let output = self.execute(target, Command::BulkWrite { models, options })?;
        expect_write_result(output, "BulkWrite")
    }
}
