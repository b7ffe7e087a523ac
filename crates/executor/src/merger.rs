//! Merging per-batch replies into one caller-facing result.
//!
//! Batches report counts and errors relative to their own segments. The
//! merger sums counts and rewrites every batch-local index to the index the
//! operation had in the caller's list, using the batch's index map.

use serde::{Deserialize, Serialize};
use writepath_core::{Bson, Document};

use crate::planner::CommandKind;
use crate::reply::BatchReply;
use crate::{Error, Result};

/// One failed operation, indexed in the caller's list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteError {
    /// Position of the operation in the submitted list
    pub index: usize,
    /// Server error code
    pub code: i32,
    /// Server error message
    pub errmsg: String,
}

/// The server could not satisfy the requested write concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteConcernError {
    /// Server error code
    pub code: i32,
    /// Server error message
    pub errmsg: String,
}

/// The id of a document created by an upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertedId {
    /// Position of the upserting operation in the submitted list
    pub index: usize,
    /// `_id` of the created document
    #[serde(rename = "_id")]
    pub id: Bson,
}

/// Aggregate outcome of a bulk or elemental write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkWriteResult {
    /// Documents inserted
    pub inserted_count: u64,
    /// Documents matched by updates and replacements, upserts excluded
    pub matched_count: u64,
    /// Documents actually changed
    pub modified_count: u64,
    /// Documents deleted
    pub deleted_count: u64,
    /// Documents created by upserts
    pub upserted_count: u64,
    /// Ids created by upserts, in original-index order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upserted_ids: Vec<UpsertedId>,
    /// Failed operations, in original-index order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub write_errors: Vec<WriteError>,
    /// One entry per command whose write concern was not satisfied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub write_concern_errors: Vec<WriteConcernError>,
}

impl BulkWriteResult {
    /// Whether any write or write-concern error was recorded.
    pub fn has_errors(&self) -> bool {
        !self.write_errors.is_empty() || !self.write_concern_errors.is_empty()
    }

    /// Operations the server applied, summed over every kind.
    pub fn applied_count(&self) -> u64 {
        self.inserted_count + self.matched_count + self.deleted_count + self.upserted_count
    }

    /// The write error for operation `index`, if it failed.
    pub fn error_for(&self, index: usize) -> Option<&WriteError> {
        self.write_errors.iter().find(|e| e.index == index)
    }
}

/// Everything a run produced: the merged result and any returned documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionOutcome {
    /// Counts and errors merged across batches
    pub result: BulkWriteResult,
    /// Find-and-modify documents, keyed by original index
    pub documents: Vec<(usize, Option<Document>)>,
}

/// Accumulates batch replies in send order.
#[derive(Debug, Default)]
pub struct ResultMerger {
    outcome: ExecutionOutcome,
    batches: usize,
}

impl ResultMerger {
    /// Empty merger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the reply to one batch of `kind`. `indexes` maps batch
    /// positions to original indexes.
    ///
    /// Nothing is applied when an error is returned.
    ///
    /// # Errors
    ///
    /// `Internal` if the reply names a position the batch does not have.
    pub fn merge(&mut self, kind: CommandKind, indexes: &[usize], reply: BatchReply) -> Result<()> {
        let original = |position: usize| {
            indexes.get(position).copied().ok_or_else(|| Error::Internal {
                reason: format!(
                    "reply position {} outside batch of {}",
                    position,
                    indexes.len()
                ),
            })
        };

        let upserted_ids = reply
            .upserted
            .into_iter()
            .map(|upsert| {
                Ok(UpsertedId {
                    index: original(upsert.index)?,
                    id: upsert.id,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let write_errors = reply
            .write_errors
            .into_iter()
            .map(|error| {
                Ok(WriteError {
                    index: original(error.index)?,
                    code: error.code,
                    errmsg: error.errmsg,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let document = match kind {
            CommandKind::FindAndModify => Some((original(0)?, reply.value)),
            _ => None,
        };

        let result = &mut self.outcome.result;
        result.inserted_count += reply.counts.inserted;
        result.matched_count += reply.counts.matched;
        result.modified_count += reply.counts.modified;
        result.deleted_count += reply.counts.deleted;
        result.upserted_count += reply.counts.upserted;
        result.upserted_ids.extend(upserted_ids);
        result.write_errors.extend(write_errors);
        result.write_concern_errors.extend(reply.write_concern_error);
        self.outcome.documents.extend(document);
        self.batches += 1;
        Ok(())
    }

    /// Result merged so far.
    pub fn result(&self) -> &BulkWriteResult {
        &self.outcome.result
    }

    /// Number of batches merged.
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// A copy of the result so far, for attaching to an error.
    pub fn snapshot(&self) -> Box<BulkWriteResult> {
        Box::new(self.outcome.result.clone())
    }

    /// The merged outcome.
    pub fn finish(self) -> ExecutionOutcome {
        self.outcome
    }
}
