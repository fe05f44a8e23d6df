//! Error types for sampling and the prover.

use thiserror::Error;

/// Result type for sampling and prover operations.
pub type Result<T> = std::result::Result<T, SamplingError>;

/// Errors that can occur while sampling or serving proofs.
#[derive(Debug, Error)]
pub enum SamplingError {
    /// A leaf's block span does not follow the spans already covered.
    #[error("block span {first_block}+{block_count} does not follow covered blocks ending at {covered_until}")]
    CoverageOrder {
        /// First block of the rejected span.
        first_block: u64,
        /// Number of blocks in the rejected span.
        block_count: u64,
        /// Last block covered so far.
        covered_until: u64,
    },

    /// Configuration file could not be read or parsed.
    #[error("invalid configuration {path}: {reason}")]
    Config {
        /// Path of the configuration file.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Core error from flymmr-core.
    #[error("core error: {0}")]
    Core(#[from] flymmr_core::Error),
}

impl SamplingError {
    /// The core error code, if this wraps a core error.
    pub fn code(&self) -> Option<flymmr_core::ErrorCode> {
        match self {
            SamplingError::Core(e) => Some(e.code()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flymmr_core::{Error, ErrorCode};

    #[test]
    fn test_core_error_converts() {
        let err: SamplingError = Error::empty_tree().into();
        assert_eq!(err.code(), Some(ErrorCode::EmptyTree));
        assert!(err.to_string().contains("E2001"));
    }

    #[test]
    fn test_coverage_message() {
        let err = SamplingError::CoverageOrder {
            first_block: 5,
            block_count: 2,
            covered_until: 9,
        };
        assert_eq!(err.code(), None);
        assert!(err.to_string().contains("ending at 9"));
    }
}
