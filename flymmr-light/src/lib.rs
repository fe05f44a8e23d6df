//! FlyClient-style light client sampling over a difficulty MMR.
//!
//! A light client that knows only the current root verifies a small number
//! of leaves, drawn at random with a bias towards recent (heavy) history.
//! The number of samples is chosen so that a chain forged by an adversary
//! with a bounded fraction of the total difficulty is accepted with
//! probability at most `2^-lambda`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                              PROVER                                  │
//! │                                                                      │
//! │  LeafBatch ──▶ ingest ──▶ SharedMmr ◀── CoverageIndex (block spans)  │
//! │                              │                                       │
//! │                          snapshot                                    │
//! │                              ▼                                       │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │ SAMPLING PROTOCOL                                              │  │
//! │  │  - SecurityParams ──▶ SamplePlan (w, k, m)                     │  │
//! │  │  - WeightSampler: seeded draws x = 1 - w^y                     │  │
//! │  │  - proofs for distinct leaves (parallel)                       │  │
//! │  │  - ProofSizeModel: bandwidth with and without duplicates       │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use flymmr_light::prelude::*;
//!
//! // 512 leaves of 8 blocks each
//! let tree = simulation_tree(8, 4096).unwrap();
//!
//! let protocol = SamplingProtocol::new(SecurityParams::default(), ProofSizeModel::default())
//!     .with_seed(42);
//! let report = protocol.run(&tree).unwrap();
//!
//! assert_eq!(report.sampled_leaf_indices.len() as u64, report.plan.sample_count);
//! assert!(report.total_proof_size_with_duplicates >= report.total_proof_size_no_duplicates);
//! assert!(report.verify(tree.root().unwrap()).unwrap());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod coverage;
pub mod errors;
pub mod experiment;
pub mod params;
pub mod protocol;
pub mod prover;
pub mod sampler;
pub mod size;

#[cfg(test)]
mod proptest;

pub use config::ProverConfig;
pub use coverage::{BlockSpan, CoverageIndex};
pub use errors::{Result, SamplingError};
pub use experiment::{run_experiments, simulation_tree, ExperimentSummary, Statistic};
pub use params::{SamplePlan, SecurityParams};
pub use protocol::{SamplingProtocol, SamplingReport};
pub use prover::Prover;
pub use sampler::WeightSampler;
pub use size::ProofSizeModel;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::ProverConfig;
    pub use crate::errors::{Result, SamplingError};
    pub use crate::experiment::{run_experiments, simulation_tree};
    pub use crate::params::SecurityParams;
    pub use crate::protocol::{SamplingProtocol, SamplingReport};
    pub use crate::prover::Prover;
    pub use crate::size::ProofSizeModel;
}
