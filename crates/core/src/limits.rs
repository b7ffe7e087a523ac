//! Wire limits for write commands
//!
//! The server advertises two limits during the connection handshake:
//! how many operations one write command may carry, and how many encoded
//! bytes one command message may take. Batch planning is bounded by both.
//!
//! The engine never hardcodes these: the surrounding client passes the
//! handshake values in. [`WireLimits::default`] mirrors the values common
//! servers advertise and exists for tests and standalone use.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum operations per write command.
pub const DEFAULT_MAX_BATCH_COUNT: usize = 1000;

/// Default maximum encoded bytes per write command (16 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Per-command limits used to frame batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireLimits {
    /// Maximum operations per command (default: 1000)
    pub max_batch_count: usize,

    /// Maximum cumulative encoded size per command in bytes (default: 16MB)
    pub max_message_size: usize,
}

impl Default for WireLimits {
    fn default() -> Self {
        WireLimits {
            max_batch_count: DEFAULT_MAX_BATCH_COUNT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl WireLimits {
    /// Create limits from handshake values.
    ///
    /// Both limits must be non-zero.
    pub fn new(max_batch_count: usize, max_message_size: usize) -> Result<Self, LimitError> {
        let limits = WireLimits {
            max_batch_count,
            max_message_size,
        };
        limits.validate()?;
        Ok(limits)
    }

    /// Create limits with small values for testing
    ///
    /// Lets unit tests force batch splits without building thousands of
    /// operations or megabyte-sized documents.
    pub fn with_small_limits() -> Self {
        WireLimits {
            max_batch_count: 4,
            max_message_size: 256,
        }
    }

    /// Check that both limits are usable.
    pub fn validate(&self) -> Result<(), LimitError> {
        if self.max_batch_count == 0 {
            return Err(LimitError::ZeroLimit {
                name: "max_batch_count",
            });
        }
        if self.max_message_size == 0 {
            return Err(LimitError::ZeroLimit {
                name: "max_message_size",
            });
        }
        Ok(())
    }

    /// Validate one segment's encoded size against the message limit.
    pub fn validate_segment_size(&self, size: usize) -> Result<(), LimitError> {
        if size > self.max_message_size {
            return Err(LimitError::DocumentTooLarge {
                actual: size,
                max: self.max_message_size,
            });
        }
        Ok(())
    }

    /// Return limits no looser than `self`, tightened by the given overrides.
    pub fn tightened(
        &self,
        max_batch_count: Option<usize>,
        max_message_size: Option<usize>,
    ) -> WireLimits {
        WireLimits {
            max_batch_count: max_batch_count
                .map_or(self.max_batch_count, |n| n.min(self.max_batch_count)),
            max_message_size: max_message_size
                .map_or(self.max_message_size, |n| n.min(self.max_message_size)),
        }
    }
}

/// Limit validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    /// A limit was configured as zero
    #[error("Invalid limit: {name} must be greater than zero")]
    ZeroLimit {
        /// Name of the offending limit
        name: &'static str,
    },

    /// A single segment does not fit in any message
    #[error("Document too large: {actual} bytes exceeds maximum {max}")]
    DocumentTooLarge {
        /// Actual encoded size
        actual: usize,
        /// Maximum allowed size
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = WireLimits::default();
        assert_eq!(limits.max_batch_count, 1000);
        assert_eq!(limits.max_message_size, 16 * 1024 * 1024);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_count_rejected() {
        let result = WireLimits::new(0, 100);
        assert!(matches!(
            result,
            Err(LimitError::ZeroLimit {
                name: "max_batch_count"
            })
        ));
    }

    #[test]
    fn test_zero_message_size_rejected() {
        let result = WireLimits::new(10, 0);
        assert!(matches!(
            result,
            Err(LimitError::ZeroLimit {
                name: "max_message_size"
            })
        ));
    }

    #[test]
    fn test_segment_at_max_size() {
        let limits = WireLimits::with_small_limits();
        assert!(limits.validate_segment_size(limits.max_message_size).is_ok());
    }

    #[test]
    fn test_segment_over_max_size() {
        let limits = WireLimits::with_small_limits();
        let result = limits.validate_segment_size(limits.max_message_size + 1);
        assert_eq!(
            result,
            Err(LimitError::DocumentTooLarge {
                actual: 257,
                max: 256
            })
        );
    }

    #[test]
    fn test_tightened_never_loosens() {
        let limits = WireLimits::new(1000, 1024).unwrap();
        let t = limits.tightened(Some(5000), Some(512));
        assert_eq!(t.max_batch_count, 1000);
        assert_eq!(t.max_message_size, 512);
        assert_eq!(limits.tightened(None, None), limits);
    }
}
