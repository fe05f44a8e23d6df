//! Difficulty-weighted Merkle Mountain Range.
//!
//! Every node carries the total difficulty (weight) and block count of its
//! subtree, so the root commits to the cumulative work of the chain. The
//! tree supports:
//! - O(log n) amortized append
//! - O(log n) inclusion proofs against the current bagged root
//! - O(log n) leaf lookup by relative cumulative weight
//!
//! # Example
//!
//! ```rust
//! use flymmr_core::{keccak256, Node};
//! use flymmr_mmr::DifficultyMmr;
//!
//! let mut mmr = DifficultyMmr::new();
//! for i in 0..5u64 {
//!     let leaf = Node::new(keccak256(&i.to_be_bytes()), i, i, 10, 10, 10, 1);
//!     mmr.append(leaf).unwrap();
//! }
//!
//! // Prove a leaf against the current root
//! let proof = mmr.proof(3).unwrap();
//! assert!(proof.verify(mmr.root().unwrap()).unwrap());
//!
//! // Half of the total weight lies in the first leaves
//! let index = mmr.leaf_index_for_relative_weight(0.5).unwrap();
//! assert!(index <= 2);
//! ```

mod mmr;
mod proof;
mod shape;
mod shared;
mod state;

#[cfg(test)]
mod proptest;

pub use mmr::{compute_root, DifficultyMmr};
pub use proof::LeafProof;
pub use shape::TreeShape;
pub use shared::{MmrReader, SharedMmr};
pub use state::{LoadOutcome, MmrState};
