//! Error taxonomy shared by the tree, the sampler and the prover.
//!
//! Every error carries a stable [`ErrorCode`]. Codes below 5000 are caller
//! mistakes (bad index, bad parameters, unknown block); codes from 5000 up
//! come from storage or from a broken internal invariant.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type for difficulty MMR operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable numeric error codes, rendered as `E1001` and so on.
///
/// | range | meaning                              |
/// |-------|--------------------------------------|
/// | 1xxx  | input rejected                       |
/// | 2xxx  | tree or block range cannot answer    |
/// | 5xxx  | persisted state unreadable or broken |
/// | 6xxx  | encoding or internal failure         |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // 1xxx
    InvalidIndex = 1001,
    InvalidFraction = 1002,
    MalformedLeaf = 1003,
    InvalidParameters = 1004,
    InvalidHash = 1005,
    InvalidProof = 1006,

    // 2xxx
    EmptyTree = 2001,
    BlockNotCovered = 2002,
    LeafNotFound = 2003,

    // 5xxx
    StorageRead = 5001,
    StorageWrite = 5002,
    CorruptState = 5003,

    // 6xxx
    Serialization = 6001,
    Internal = 6002,
}

impl ErrorCode {
    /// Numeric value.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// The caller supplied something the tree cannot accept or answer.
    pub fn is_client_error(self) -> bool {
        (1000..5000).contains(&self.code())
    }

    /// Storage or internal failure.
    pub fn is_server_error(self) -> bool {
        self.code() >= 5000
    }

    /// Whether repeating the same call may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorCode::StorageRead | ErrorCode::StorageWrite)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Errors that can occur while building, querying or restoring a difficulty MMR.
#[derive(Debug, Error)]
pub enum Error {
    /// Leaf index or search fraction outside the valid domain.
    #[error("[{code}] invalid index: {message}")]
    InvalidIndex { code: ErrorCode, message: String },

    /// Leaf input rejected before insertion.
    #[error("[{code}] malformed leaf input: {message}")]
    MalformedLeaf { code: ErrorCode, message: String },

    /// Sampling or simulation parameters outside their domain.
    #[error("[{code}] invalid parameters: {message}")]
    InvalidParameters { code: ErrorCode, message: String },

    /// Invalid hash encoding.
    #[error("[{code}] invalid hash: {message}")]
    InvalidHash {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Proof does not replay to the expected root.
    #[error("[{code}] invalid proof: {message}")]
    InvalidProof { code: ErrorCode, message: String },

    /// The tree has no leaves yet.
    #[error("[{code}] tree is empty")]
    EmptyTree { code: ErrorCode },

    /// Requested item is not present.
    #[error("[{code}] not found: {message}")]
    NotFound { code: ErrorCode, message: String },

    /// Persisted state failed structural validation.
    #[error("[{code}] corrupt state: {message}")]
    CorruptState { code: ErrorCode, message: String },

    /// Reading or writing persisted state failed.
    #[error("[{code}] storage error: {message}")]
    Storage {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON encoding or decoding failed.
    #[error("[{code}] serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A structural invariant of the tree did not hold.
    #[error("[{code}] internal error: {message}")]
    Internal { code: ErrorCode, message: String },
}

impl Error {
    /// The stable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidIndex { code, .. } => *code,
            Error::MalformedLeaf { code, .. } => *code,
            Error::InvalidParameters { code, .. } => *code,
            Error::InvalidHash { code, .. } => *code,
            Error::InvalidProof { code, .. } => *code,
            Error::EmptyTree { code } => *code,
            Error::NotFound { code, .. } => *code,
            Error::CorruptState { code, .. } => *code,
            Error::Storage { code, .. } => *code,
            Error::Serialization { code, .. } => *code,
            Error::Internal { code, .. } => *code,
        }
    }

    /// See [`ErrorCode::is_client_error`].
    pub fn is_client_error(&self) -> bool {
        self.code().is_client_error()
    }

    /// See [`ErrorCode::is_server_error`].
    pub fn is_server_error(&self) -> bool {
        self.code().is_server_error()
    }

    /// A leaf index outside `0..leaf_count`.
    pub fn invalid_index(message: impl Into<String>) -> Self {
        Error::InvalidIndex {
            code: ErrorCode::InvalidIndex,
            message: message.into(),
        }
    }

    /// A relative weight outside `[0, 1]` or not a number.
    pub fn invalid_fraction(fraction: f64) -> Self {
        Error::InvalidIndex {
            code: ErrorCode::InvalidFraction,
            message: format!("relative weight {} is not within [0, 1]", fraction),
        }
    }

    /// A leaf or block batch rejected before insertion.
    pub fn malformed_leaf(message: impl Into<String>) -> Self {
        Error::MalformedLeaf {
            code: ErrorCode::MalformedLeaf,
            message: message.into(),
        }
    }

    /// Security or simulation parameters outside their domain.
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Error::InvalidParameters {
            code: ErrorCode::InvalidParameters,
            message: message.into(),
        }
    }

    /// A hash that is not 32 bytes of hex.
    pub fn invalid_hash(message: impl Into<String>) -> Self {
        Error::InvalidHash {
            code: ErrorCode::InvalidHash,
            message: message.into(),
            source: None,
        }
    }

    /// A proof whose shape does not match its claimed leaf count.
    pub fn invalid_proof(message: impl Into<String>) -> Self {
        Error::InvalidProof {
            code: ErrorCode::InvalidProof,
            message: message.into(),
        }
    }

    /// Root, proof or search requested on a tree without leaves.
    pub fn empty_tree() -> Self {
        Error::EmptyTree {
            code: ErrorCode::EmptyTree,
        }
    }

    /// A block number outside every recorded leaf span.
    pub fn not_covered(block: u64) -> Self {
        Error::NotFound {
            code: ErrorCode::BlockNotCovered,
            message: format!("block {} is not covered by the tree", block),
        }
    }

    /// No leaf matches a lookup key.
    pub fn leaf_not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            code: ErrorCode::LeafNotFound,
            message: message.into(),
        }
    }

    /// Persisted state that does not rebuild into the same tree.
    pub fn corrupt_state(message: impl Into<String>) -> Self {
        Error::CorruptState {
            code: ErrorCode::CorruptState,
            message: message.into(),
        }
    }

    /// Storage failure without an underlying I/O error.
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage {
            code: ErrorCode::StorageRead,
            message: message.into(),
            source: None,
        }
    }

    /// Writing `path` failed.
    pub fn storage_write(path: &Path, e: io::Error) -> Self {
        Error::Storage {
            code: ErrorCode::StorageWrite,
            message: format!("writing {}: {}", path.display(), e),
            source: Some(Box::new(e)),
        }
    }

    /// An internal invariant failed.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            code: ErrorCode::Internal,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization {
            code: ErrorCode::Serialization,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Storage {
            code: ErrorCode::StorageRead,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::InvalidHash {
            code: ErrorCode::InvalidHash,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}
