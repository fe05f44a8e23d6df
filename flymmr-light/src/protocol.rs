//! Difficulty-weighted sampling protocol.
//!
//! A run works on a fixed tree snapshot and never mutates it:
//!
//! 1. derive the [`SamplePlan`] from the security parameters and the total
//!    weight of the tree;
//! 2. draw `m` relative-weight fractions from a seeded [`WeightSampler`] and
//!    map each to a leaf index;
//! 3. generate proofs for the distinct sampled leaves (in parallel for large
//!    runs);
//! 4. tally proof bandwidth in draw order, once counting every draw in full
//!    and once counting each leaf only the first time it is drawn, with only
//!    the proof nodes not already sent for earlier leaves.

use std::collections::{HashMap, HashSet};

use flymmr_core::{Error, Hash, Node};
use flymmr_mmr::{DifficultyMmr, LeafProof};
use serde::Serialize;
use tracing::info;

use crate::errors::Result;
use crate::params::{SamplePlan, SecurityParams};
use crate::sampler::WeightSampler;
use crate::size::ProofSizeModel;

/// Sampling protocol configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SamplingProtocol {
    params: SecurityParams,
    size_model: ProofSizeModel,
    seed: u64,
}

impl SamplingProtocol {
    /// Create a protocol with seed 0.
    pub fn new(params: SecurityParams, size_model: ProofSizeModel) -> Self {
        Self {
            params,
            size_model,
            seed: 0,
        }
    }

    /// Set the sampler seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Security parameters.
    pub fn params(&self) -> &SecurityParams {
        &self.params
    }

    /// Proof size model.
    pub fn size_model(&self) -> &ProofSizeModel {
        &self.size_model
    }

    /// Sampler seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw the sampled leaf indices, one per sample, in draw order.
    pub fn draw(&self, tree: &DifficultyMmr, plan: &SamplePlan) -> Result<Vec<u64>> {
        let mut sampler = WeightSampler::new(self.seed, plan.weight_fraction);
        let mut indices = Vec::with_capacity(plan.sample_count.min(1 << 16) as usize);
        for _ in 0..plan.sample_count {
            indices.push(tree.leaf_index_for_relative_weight(sampler.next_fraction())?);
        }
        Ok(indices)
    }

    /// Run the protocol against a tree snapshot.
    pub fn run(&self, tree: &DifficultyMmr) -> Result<SamplingReport> {
        let plan = self.params.sample_plan(tree.total_weight())?;
        let sampled_leaf_indices = self.draw(tree, &plan)?;

        let mut seen_leaves = HashSet::new();
        let distinct: Vec<u64> = sampled_leaf_indices
            .iter()
            .copied()
            .filter(|i| seen_leaves.insert(*i))
            .collect();
        let proofs = tree.proof_batch(&distinct)?;
        let (with_duplicates, no_duplicates) = self.tally(&sampled_leaf_indices, &proofs)?;

        let report = SamplingReport {
            plan,
            seed: self.seed,
            sampled_leaf_indices,
            distinct_leaves: distinct.len(),
            total_proof_size_no_duplicates: no_duplicates,
            total_proof_size_with_duplicates: with_duplicates,
            proofs,
        };

        info!(
            seed = self.seed,
            leaves = tree.leaf_count(),
            blocks = %tree.total_blocks(),
            m = plan.sample_count,
            k = plan.k,
            distinct = report.distinct_leaves,
            no_duplicates = %report.total_proof_size_no_duplicates,
            with_duplicates = %report.total_proof_size_with_duplicates,
            "sampling run complete"
        );

        Ok(report)
    }
}

impl SamplingProtocol {
    /// Proof bandwidth of a draw sequence as `(with_duplicates, no_duplicates)`.
    ///
    /// Both totals start from the root proof. Every draw adds its full leaf
    /// proof to the first; the second only grows on a leaf's first draw, and
    /// then only by the proof nodes not already sent for an earlier leaf.
    fn tally(&self, sampled: &[u64], proofs: &[LeafProof]) -> Result<(u128, u128)> {
        let proof_of: HashMap<u64, &LeafProof> =
            proofs.iter().map(|p| (p.leaf_index, p)).collect();

        let model = &self.size_model;
        let mut with_duplicates = model.root_proof_bytes();
        let mut no_duplicates = model.root_proof_bytes();
        let mut counted = HashSet::new();
        let mut sent_nodes: HashSet<Hash> = HashSet::new();

        for index in sampled {
            let proof = proof_of
                .get(index)
                .ok_or_else(|| Error::internal(format!("no proof generated for leaf {}", index)))?;
            let blocks = proof.leaf.block_count;

            with_duplicates =
                with_duplicates.saturating_add(model.leaf_proof_bytes(proof.len(), blocks));

            if counted.insert(*index) {
                let novel = proof
                    .nodes()
                    .map(Node::identity_hash)
                    .filter(|h| sent_nodes.insert(*h))
                    .count();
                no_duplicates = no_duplicates.saturating_add(model.leaf_proof_bytes(novel, blocks));
            }
        }

        Ok((with_duplicates, no_duplicates))
    }
}

/// Outcome of one sampling run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingReport {
    /// Derived sampling quantities.
    pub plan: SamplePlan,
    /// Sampler seed.
    pub seed: u64,
    /// Leaf index of every draw, in draw order.
    pub sampled_leaf_indices: Vec<u64>,
    /// Number of distinct sampled leaves.
    pub distinct_leaves: usize,
    /// Total bytes when repeated leaves and shared nodes are sent once.
    pub total_proof_size_no_duplicates: u128,
    /// Total bytes when every draw is answered in full.
    pub total_proof_size_with_duplicates: u128,
    /// One proof per distinct leaf, in first-sampled order.
    pub proofs: Vec<LeafProof>,
}

impl SamplingReport {
    /// Ratio of the with-duplicates total to the deduplicated total.
    pub fn duplicate_ratio(&self) -> f64 {
        if self.total_proof_size_no_duplicates == 0 {
            return 1.0;
        }
        self.total_proof_size_with_duplicates as f64 / self.total_proof_size_no_duplicates as f64
    }

    /// Verify every carried proof against `root`.
    pub fn verify(&self, root: &Node) -> Result<bool> {
        for proof in &self.proofs {
            if !proof.verify(root)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
