//! Command and write model definitions.
//!
//! Two layers of "instruction set" live here:
//!
//! - [`WriteModel`]: one logical write operation as the caller describes it
//!   in a bulk submission. Each carries its own selector.
//! - [`Command`]: one request to the [`Executor`](crate::Executor). The
//!   elemental commands take their selector, sort and projection from the
//!   [`WriteTarget`](crate::WriteTarget) they run against; `BulkWrite`
//!   carries a list of write models.
//!
//! Both are:
//! - **Self-contained**: All parameters needed for execution are in the variant
//! - **Serializable**: Can be converted to/from JSON for cross-language use
//! - **Pure data**: No closures or executable code

use serde::{Deserialize, Serialize};
use writepath_core::{Document, WriteConcern};

use crate::planner::CommandKind;

/// Which image of the document a find-and-modify returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnDocument {
    /// The document as it was before the modification
    Before,
    /// The document as it is after the modification
    After,
}

/// Options shared by the find-and-modify family.
///
/// `sort` picks which document is modified when several match; `projection`
/// limits the fields of the returned document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindAndModifyOptions {
    /// Sent as `sort`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Document>,
    /// Sent as `fields`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Document>,
    /// Unset leaves the choice to the server (pre-image).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_document: Option<ReturnDocument>,
    /// Create the document when nothing matches
    #[serde(default)]
    pub upsert: bool,
}

/// One logical write operation in a bulk submission.
///
/// A write model's position in the submitted list is its *original index*,
/// the identity used to attribute write errors and upserted ids back to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum WriteModel {
    /// Insert a document.
    InsertOne { document: Document },

    /// Apply an update specification to the first matching document.
    UpdateOne {
        filter: Document,
        update: Document,
        #[serde(default)]
        upsert: bool,
    },

    /// Apply an update specification to every matching document.
    UpdateMany {
        filter: Document,
        update: Document,
        #[serde(default)]
        upsert: bool,
    },

    /// Replace the first matching document.
    ReplaceOne {
        filter: Document,
        replacement: Document,
        #[serde(default)]
        upsert: bool,
    },

    /// Delete the first matching document.
    DeleteOne { filter: Document },

    /// Delete every matching document.
    DeleteMany { filter: Document },

    /// Atomically update one document and return it.
    FindOneAndUpdate {
        filter: Document,
        update: Document,
        #[serde(default)]
        options: FindAndModifyOptions,
    },

    /// Atomically replace one document and return it.
    FindOneAndReplace {
        filter: Document,
        replacement: Document,
        #[serde(default)]
        options: FindAndModifyOptions,
    },

    /// Atomically delete one document and return it.
    ///
    /// `return_document` and `upsert` do not apply and are ignored.
    FindOneAndDelete {
        filter: Document,
        #[serde(default)]
        options: FindAndModifyOptions,
    },
}

impl WriteModel {
    /// Wire command this operation is sent with.
    pub fn kind(&self) -> CommandKind {
        match self {
            WriteModel::InsertOne { .. } => CommandKind::Insert,
            WriteModel::UpdateOne { .. }
            | WriteModel::UpdateMany { .. }
            | WriteModel::ReplaceOne { .. } => CommandKind::Update,
            WriteModel::DeleteOne { .. } | WriteModel::DeleteMany { .. } => CommandKind::Delete,
            WriteModel::FindOneAndUpdate { .. }
            | WriteModel::FindOneAndReplace { .. }
            | WriteModel::FindOneAndDelete { .. } => CommandKind::FindAndModify,
        }
    }

    /// Variant name, for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            WriteModel::InsertOne { .. } => "InsertOne",
            WriteModel::UpdateOne { .. } => "UpdateOne",
            WriteModel::UpdateMany { .. } => "UpdateMany",
            WriteModel::ReplaceOne { .. } => "ReplaceOne",
            WriteModel::DeleteOne { .. } => "DeleteOne",
            WriteModel::DeleteMany { .. } => "DeleteMany",
            WriteModel::FindOneAndUpdate { .. } => "FindOneAndUpdate",
            WriteModel::FindOneAndReplace { .. } => "FindOneAndReplace",
            WriteModel::FindOneAndDelete { .. } => "FindOneAndDelete",
        }
    }
}

/// Options for one bulk submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulkWriteOptions {
    /// Stop at the first failing batch (`true`) or attempt every batch.
    /// Unset falls back to the configured `ordered`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,
    /// Overrides the collection's write concern for every command sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_concern: Option<WriteConcern>,
    /// Forwarded as `bypassDocumentValidation` on insert and update commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_document_validation: Option<bool>,
}

impl BulkWriteOptions {
    /// Ordered execution with default settings.
    pub fn ordered() -> Self {
        Self {
            ordered: Some(true),
            ..Self::default()
        }
    }

    /// Unordered execution with default settings.
    pub fn unordered() -> Self {
        Self {
            ordered: Some(false),
            ..Self::default()
        }
    }

    /// Set the write concern for this submission.
    pub fn with_write_concern(mut self, write_concern: WriteConcern) -> Self {
        self.write_concern = Some(write_concern);
        self
    }
}

/// A request to the executor.
///
/// The elemental variants build exactly one write model from the target's
/// selector (plus sort and projection for the find-and-modify family) and
/// run it through the same path as `BulkWrite`.
///
/// # Example
///
/// ```ignore
/// use writepath_executor::{Command, Output};
///
/// let out = executor.execute(&view, Command::RemoveOne)?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Command {
    /// Plan, split and execute a list of write models.
    /// Returns: `Output::WriteResult`
    BulkWrite {
        models: Vec<WriteModel>,
        #[serde(default)]
        options: BulkWriteOptions,
    },

    /// Delete the first document matched by the target and return it.
    /// Returns: `Output::Document`
    FindOneAndDelete,

    /// Replace the first document matched by the target and return it.
    /// Returns: `Output::Document`
    FindOneAndReplace {
        replacement: Document,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        return_document: Option<ReturnDocument>,
        #[serde(default)]
        upsert: bool,
    },

    /// Update the first document matched by the target and return it.
    /// Returns: `Output::Document`
    FindOneAndUpdate {
        update: Document,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        return_document: Option<ReturnDocument>,
        #[serde(default)]
        upsert: bool,
    },

    /// Delete the first document matched by the target.
    /// Returns: `Output::WriteResult`
    RemoveOne,

    /// Delete every document matched by the target.
    /// Returns: `Output::WriteResult`
    RemoveMany,

    /// Replace the first document matched by the target. Never upserts.
    /// Returns: `Output::WriteResult`
    ReplaceOne { replacement: Document },

    /// Update the first document matched by the target. Never upserts.
    /// Returns: `Output::WriteResult`
    UpdateOne { update: Document },

    /// Update every document matched by the target. Never upserts.
    /// Returns: `Output::WriteResult`
    UpdateMany { update: Document },
}

impl Command {
    /// Variant name, for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::BulkWrite { .. } => "BulkWrite",
            Command::FindOneAndDelete => "FindOneAndDelete",
            Command::FindOneAndReplace { .. } => "FindOneAndReplace",
            Command::FindOneAndUpdate { .. } => "FindOneAndUpdate",
            Command::RemoveOne => "RemoveOne",
            Command::RemoveMany => "RemoveMany",
            Command::ReplaceOne { .. } => "ReplaceOne",
            Command::UpdateOne { .. } => "UpdateOne",
            Command::UpdateMany { .. } => "UpdateMany",
        }
    }
}
