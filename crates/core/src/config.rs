//! Write path configuration via TOML
//!
//! Clients load a `WriteConfig` once and reuse it for every write. Limits in
//! the config can only tighten what the server advertised in its handshake;
//! they never loosen it.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::limits::WireLimits;
use crate::write_concern::WriteConcern;

/// Default file name for write path configuration.
pub const CONFIG_FILE_NAME: &str = "writepath.toml";

/// Write path configuration.
///
/// # Example
///
/// ```toml
/// ordered = true
/// max_batch_count = 500
///
/// [write_concern]
/// w = "majority"
/// wtimeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteConfig {
    /// Default continuation mode for bulk writes.
    #[serde(default = "default_ordered")]
    pub ordered: bool,
    /// Cap on operations per command, applied on top of the handshake value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_batch_count: Option<usize>,
    /// Cap on encoded bytes per command, applied on top of the handshake value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_message_size: Option<usize>,
    /// Default write concern when neither the call nor the collection sets one.
    #[serde(default)]
    pub write_concern: WriteConcern,
}

fn default_ordered() -> bool {
    true
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            ordered: default_ordered(),
            max_batch_count: None,
            max_message_size: None,
            write_concern: WriteConcern::default(),
        }
    }
}

impl WriteConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Write path configuration
#
# Continuation mode for bulk writes: true stops at the first failing batch,
# false attempts every batch.
ordered = true

# Optional caps on the server-advertised limits (can only tighten them).
# max_batch_count = 1000
# max_message_size = 16777216

# Default write concern.
# [write_concern]
# w = "majority"        # or a node count, or a tag name
# wtimeout_ms = 5000
# journal = true
"#
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: WriteConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::InvalidConfig(reason) => Error::InvalidConfig(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                reason
            )),
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject caps of zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_count == Some(0) {
            return Err(Error::InvalidConfig(
                "max_batch_count must be greater than zero".to_string(),
            ));
        }
        if self.max_message_size == Some(0) {
            return Err(Error::InvalidConfig(
                "max_message_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective limits given what the server advertised.
    pub fn limits(&self, handshake: WireLimits) -> WireLimits {
        handshake.tightened(self.max_batch_count, self.max_message_size)
    }
}
