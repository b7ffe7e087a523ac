//! Core types for writepath
//!
//! This crate defines the foundational types shared by the write path:
//! - Document / Bson: re-exported from the `bson` crate as the command payload model
//! - DocumentCodec: Encoded-size measurement used to frame batches
//! - WireLimits: Per-command operation-count and byte-size limits
//! - WriteConcern: Acknowledgement requirement attached to write commands
//! - WriteConfig: TOML configuration for client-side defaults
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod error;
pub mod limits;
pub mod write_concern;

pub use codec::{BincodeCodec, BsonSizeCodec, CodecError, DocumentCodec};
pub use config::{WriteConfig, CONFIG_FILE_NAME};
pub use error::{Error, Result};
pub use limits::{LimitError, WireLimits, DEFAULT_MAX_BATCH_COUNT, DEFAULT_MAX_MESSAGE_SIZE};
pub use bson::{doc, Bson, Document};
pub use write_concern::{Acknowledgment, WriteConcern};
