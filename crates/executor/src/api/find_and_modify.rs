//! Atomic find-and-modify.
//!
//! The target's sort decides which matching document is modified and its
//! projection limits the returned fields.

use writepath_core::{Document, DocumentCodec};

use super::expect_document;
use crate::command::ReturnDocument;
use crate::selector::PrimarySelector;
use crate::target::WriteTarget;
use crate::{Command, Executor, Result};

impl<S: PrimarySelector, C: DocumentCodec> Executor<S, C> {
    /// Delete the first selected document and return it.
    ///
    /// Returns `None` if nothing matched.
    pub fn find_one_and_delete<T: WriteTarget + ?Sized>(&self, target: &T) -> Result<Option<Document>> {
        expect_document(self.execute(target, Command::FindOneAndDelete)?, "FindOneAndDelete")
    }

    /// Replace the first selected document and return it.
    ///
    /// `return_document` picks the pre- or post-image; `None` leaves the
    /// server default (pre-image).
    pub fn find_one_and_replace<T: WriteTarget + ?Sized>(
        &self,
        target: &T,
        replacement: Document,
        return_document: Option<ReturnDocument>,
        upsert: bool,
    ) -> Result<Option<Document>> {
        let output = self.execute(
            target,
            Command::FindOneAndReplace {
                replacement,
                return_document,
                upsert,
            },
        )?;
        expect_document(output, "FindOneAndReplace")
    }

    /// Apply `update` to the first selected document and return it.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let counter = executor.find_one_and_update(
    ///     &counters.find(doc! { "_id": "orders" }),
    ///     doc! { "$inc": doc! { "seq": 1i64 } },
    ///     Some(ReturnDocument::After),
    ///     true,
    /// )?;
    /// ```
    pub fn find_one_and_update<T: WriteTarget + ?Sized>(
        &self,
        target: &T,
        update: Document,
        return_document: Option<ReturnDocument>,
        upsert: bool,
    ) -> Result<Option<Document>> {
        let output = self.execute(
            target,
            Command::FindOneAndUpdate {
                update,
                return_document,
                upsert,
            },
        )?;
        expect_document(output, "FindOneAndUpdate")
    }
}
