//! FlyMMR Core - Fundamental types for the difficulty-weighted MMR.
//!
//! This crate provides the data types shared by the tree and the light
//! client sampling protocol:
//!
//! - [`crypto`] - Keccak-256 hashing (the hash the on-chain verifier uses)
//! - [`node`] - Difficulty-annotated MMR nodes and their canonical encoding
//! - [`block`] - Block batches and leaf construction
//! - [`proof`] - Proof path types and the verifier-facing bundle
//! - [`storage`] - Atomic writes of persisted state
//!
//! # Example
//!
//! ```rust
//! use flymmr_core::{keccak256, BlockRecord, DifficultyPolicy, LeafBatch};
//!
//! let batch = LeafBatch::new(
//!     keccak256(b"block-2"),
//!     vec![
//!         BlockRecord::new(1, 1_000, 40),
//!         BlockRecord::new(2, 1_013, 42),
//!     ],
//! );
//! let leaf = batch.to_leaf(DifficultyPolicy::Strict).unwrap().node;
//!
//! assert_eq!(leaf.weight, 82);
//! assert_eq!(leaf.block_count, 2);
//! ```

pub mod block;
pub mod crypto;
pub mod error;
pub mod node;
pub mod proof;
pub mod storage;

#[cfg(test)]
mod proptest;

pub use block::{BlockRecord, DifficultyPolicy, LeafBatch, LeafBuild, WeightSource};
pub use crypto::{hash_all, hash_pair, keccak256, Hash};
pub use error::{Error, ErrorCode, Result};
pub use node::{Node, NodeTuple, IDENTITY_ENCODING_LEN, NODE_FIELD_BYTES};
pub use proof::{replay, Position, ProofBundle, ProofNode};
pub use storage::write_atomic;
