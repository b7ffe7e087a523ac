//! Elemental deletes, updates and replacements.
//!
//! None of these upsert, and none fail because nothing matched.

use writepath_core::{Document, DocumentCodec};

use super::expect_write_result;
use crate::merger::BulkWriteResult;
use crate::selector::PrimarySelector;
use crate::target::WriteTarget;
use crate::{Command, Executor, Result};

impl<S: PrimarySelector, C: DocumentCodec> Executor<S, C> {
    /// Delete the first document the target selects (`limit: 1`).
    pub fn remove_one<T: WriteTarget + ?Sized>(&self, target: &T) -> Result<BulkWriteResult> {
        expect_write_result(self.execute(target, Command::RemoveOne)?, "RemoveOne")
    }

    /// Delete every document the target selects (`limit: 0`).
    pub fn remove_many<T: WriteTarget + ?Sized>(&self, target: &T) -> Result<BulkWriteResult> {
        expect_write_result(self.execute(target, Command::RemoveMany)?, "RemoveMany")
    }

    /// Replace the first selected document with `replacement`.
    pub fn replace_one<T: WriteTarget + ?Sized>(
        &self,
        target: &T,
        replacement: Document,
    ) -> Result<BulkWriteResult> {
        let output = self.execute(target, Command::ReplaceOne { replacement })?;
        expect_write_result(output, "ReplaceOne")
    }

    /// Apply `update` to the first selected document.
    pub fn update_one<T: WriteTarget + ?Sized>(
        &self,
        target: &T,
        update: Document,
    ) -> Result<BulkWriteResult> {
        let output = self.execute(target, Command::UpdateOne { update })?;
        expect_write_result(output, "UpdateOne")
    }

    /// Apply `update` to every selected document.
    pub fn update_many<T: WriteTarget + ?Sized>(
        &self,
        target: &T,
        update: Document,
    ) -> Result<BulkWriteResult> {
        let output = self.execute(target, Command::UpdateMany { update })?;
        expect_write_result(output, "UpdateMany")
    }
}
