//! writepath - the write path of a document-database client
//!
//! writepath turns write operations into server commands: single deletes,
//! updates and find-and-modify calls, and bulk writes that are grouped by
//! command kind, split to fit the server's limits, sent in order and merged
//! back into one result indexed like the caller's list.
//!
//! # Quick Start
//!
//! ```ignore
//! use writepath::{doc, BulkWriteOptions, Collection, Executor, WriteModel};
//!
//! let executor = Executor::new(selector);
//! let users = Collection::new("app", "users");
//!
//! let result = executor.bulk_write(
//!     &users,
//!     vec![WriteModel::InsertOne { document: doc! { "_id": 1i64 } }],
//!     BulkWriteOptions::ordered(),
//! )?;
//! assert_eq!(result.inserted_count, 1);
//! ```
//!
//! # Architecture
//!
//! All operations go through the [`Executor`], which plans batches, sends
//! them through an [`ExecutionContext`] acquired from a [`PrimarySelector`]
//! and classifies the merged result. Connection handling stays outside this
//! crate.

// Re-export the public API from writepath-executor
pub use writepath_executor::*;

// Configuration and codec errors surface from writepath-core
pub use writepath_core::{CodecError, Error as CoreError, LimitError, CONFIG_FILE_NAME};
