//! Prover façade.
//!
//! Owns the shared tree, the block coverage index and the configuration.
//! Block batches come in through [`Prover::ingest`]; proofs are served by
//! leaf index, relative weight, block number or leaf content hash.

use flymmr_core::{Error, Hash, LeafBatch, Node, NodeTuple};
use flymmr_mmr::{DifficultyMmr, LeafProof, LoadOutcome, MmrReader, SharedMmr};
use tracing::{debug, info, warn};

use crate::config::ProverConfig;
use crate::coverage::CoverageIndex;
use crate::errors::Result;
use crate::protocol::{SamplingProtocol, SamplingReport};

/// Builds the tree from block batches and answers proof requests.
#[derive(Debug)]
pub struct Prover {
    config: ProverConfig,
    tree: SharedMmr,
    coverage: CoverageIndex,
}

impl Prover {
    /// Create a prover with an empty tree.
    pub fn new(config: ProverConfig) -> Self {
        Self {
            config,
            tree: SharedMmr::default(),
            coverage: CoverageIndex::new(),
        }
    }

    /// Open a prover from the configured state path.
    ///
    /// Falls back to an empty tree when the state is missing or invalid (see
    /// [`DifficultyMmr::load_or_empty`]). A coverage index that does not match
    /// the restored tree is discarded; blocks of earlier leaves then report as
    /// not covered.
    pub fn open(config: ProverConfig) -> (Self, LoadOutcome) {
        let (tree, outcome) = DifficultyMmr::load_or_empty(&config.state_path);

        let coverage_path = config.coverage_path();
        let coverage = match CoverageIndex::load(&coverage_path) {
            Ok(index) if index.next_leaf() == tree.leaf_count() => index,
            Ok(index) => {
                warn!(
                    path = %coverage_path.display(),
                    recorded = index.next_leaf(),
                    leaves = tree.leaf_count(),
                    "coverage index does not match tree, discarding it"
                );
                CoverageIndex::starting_at(tree.leaf_count())
            }
            Err(e) => {
                if !tree.is_empty() {
                    warn!(
                        path = %coverage_path.display(),
                        error = %e,
                        "coverage index unavailable, earlier blocks are not addressable"
                    );
                }
                CoverageIndex::starting_at(tree.leaf_count())
            }
        };

        let prover = Self {
            config,
            tree: SharedMmr::new(tree),
            coverage,
        };
        (prover, outcome)
    }

    /// Configuration.
    pub fn config(&self) -> &ProverConfig {
        &self.config
    }

    /// Read-only handle to the tree. Only [`Prover::ingest`] appends, so the
    /// tree and the coverage index stay in step.
    pub fn tree(&self) -> MmrReader {
        self.tree.reader()
    }

    /// Block coverage of the leaves.
    pub fn coverage(&self) -> &CoverageIndex {
        &self.coverage
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> u64 {
        self.tree.leaf_count()
    }

    /// Build a leaf from a block batch, append it and record its block span.
    pub fn ingest(&mut self, batch: &LeafBatch) -> Result<u64> {
        let built = batch.to_leaf(self.config.difficulty_policy)?;
        let first_block = batch
            .first_block()
            .ok_or_else(|| Error::malformed_leaf("batch contains no blocks"))?;
        let block_count = batch.blocks.len() as u64;
        self.coverage.check(first_block, block_count)?;

        // nothing is mutated unless the tree is exactly where coverage expects it
        let leaf_index = self.tree.append_at(self.coverage.next_leaf(), built.node)?;
        self.coverage.push(first_block, block_count)?;

        debug!(
            leaf_index,
            first_block,
            block_count,
            weight_source = ?built.weight_source,
            "ingested block batch"
        );
        Ok(leaf_index)
    }

    /// Proof for a leaf index.
    pub fn proof(&self, leaf_index: u64) -> Result<LeafProof> {
        Ok(self.tree.proof(leaf_index)?)
    }

    /// Proof for the leaf at a relative cumulative weight.
    pub fn proof_for_relative_weight(&self, fraction: f64) -> Result<LeafProof> {
        let proof = self.tree.read(|tree| {
            let index = tree.leaf_index_for_relative_weight(fraction)?;
            tree.proof(index)
        })?;
        Ok(proof)
    }

    /// Proof for the leaf covering a block.
    pub fn proof_for_block(&self, block: u64) -> Result<LeafProof> {
        let leaf_index = self.coverage.leaf_for_block(block)?;
        self.proof(leaf_index)
    }

    /// Proof for the first leaf with the given content hash.
    pub fn proof_for_content_hash(&self, content_hash: &Hash) -> Result<LeafProof> {
        let proof = self.tree.read(|tree| {
            let index = tree.leaf_index_by_content_hash(content_hash).ok_or_else(|| {
                Error::leaf_not_found(format!("no leaf with content hash {}", content_hash))
            })?;
            tree.proof(index)
        })?;
        Ok(proof)
    }

    /// The current root.
    pub fn root(&self) -> Result<Node> {
        Ok(self.tree.root()?)
    }

    /// The current root as a canonical tuple.
    pub fn root_tuple(&self) -> Result<NodeTuple> {
        Ok(self.tree.root_tuple()?)
    }

    /// Run the sampling protocol on a snapshot of the tree.
    pub fn sample(&self, seed: u64) -> Result<SamplingReport> {
        let snapshot = self.tree.snapshot();
        SamplingProtocol::new(self.config.security, self.config.size_model)
            .with_seed(seed)
            .run(&snapshot)
    }

    /// Persist the tree and the coverage index.
    pub fn save(&self) -> Result<()> {
        let snapshot = self.tree.snapshot();
        snapshot.save(&self.config.state_path)?;
        self.coverage.save(&self.config.coverage_path())?;
        info!(
            leaves = snapshot.leaf_count(),
            spans = self.coverage.len(),
            "prover state saved"
        );
        Ok(())
    }
}
