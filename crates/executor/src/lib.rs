//! # writepath executor
//!
//! The write path of a document-database client: elemental writes and the
//! bulk-write engine that groups, splits, sends and merges them.
//!
//! This is the only crate users need to import. It provides:
//! - [`Executor`] - Entry point, with typed methods such as [`Executor::bulk_write`]
//! - [`Command`]/[`Output`] - Low-level command interface (for SDKs)
//! - [`PrimarySelector`]/[`ExecutionContext`] - What the executor needs from
//!   the connection layer
//!
//! ## Quick Start
//!
//! ```text
//! use writepath_executor::{doc, BulkWriteOptions, Collection, Executor, WriteModel};
//!
//! let executor = Executor::new(selector).with_limits(handshake_limits);
//! let users = Collection::new("app", "users");
//!
//! let result = executor.bulk_write(
//!     &users,
//!     vec![
//!         WriteModel::InsertOne { document: doc! { "_id": 1i64 } },
//!         WriteModel::DeleteOne { filter: doc! { "_id": 0i64 } },
//!     ],
//!     BulkWriteOptions::ordered(),
//! )?;
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Type |
//! |-------|------|
//! | Shape operations into wire segments | [`CommandBuilder`] |
//! | Group and split into batches | [`BatchPlanner`] |
//! | Send batches, apply the continuation rule | [`ExecutionCoordinator`] |
//! | Parse replies and map indexes back | [`BatchReply`], [`ResultMerger`] |
//! | Decide success or failure | [`classify`] |

#![warn(missing_docs)]

mod api;
mod builder;
mod classify;
mod command;
mod coordinator;
mod error;
mod executor;
mod merger;
mod output;
mod planner;
mod reply;
mod selector;
mod target;

pub mod testing;

// Test modules
#[cfg(test)]
mod tests;

// =============================================================================
// Public API - Everything users need is re-exported here
// =============================================================================

pub use builder::{CommandBuilder, CommandOptions, FindAndModifyAction};
pub use classify::classify;
pub use command::{BulkWriteOptions, Command, FindAndModifyOptions, ReturnDocument, WriteModel};
pub use coordinator::ExecutionCoordinator;
pub use error::Error;
pub use executor::Executor;
pub use merger::{
    BulkWriteResult, ExecutionOutcome, ResultMerger, UpsertedId, WriteConcernError, WriteError,
};
pub use output::Output;
pub use planner::{Batch, BatchPlanner, CommandKind};
pub use reply::{BatchReply, BatchUpsert, BatchWriteError, WriteCounts};
pub use selector::{ExecutionContext, PrimarySelector, TransportError};
pub use target::{Collection, CollectionView, WriteTarget};

// Re-export the document model and configuration so users don't need writepath-core directly
pub use writepath_core::{
    doc, Acknowledgment, BincodeCodec, Bson, BsonSizeCodec, Document, DocumentCodec, WireLimits,
    WriteConcern, WriteConfig,
};

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
