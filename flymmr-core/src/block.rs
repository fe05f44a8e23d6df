//! Block batches and leaf construction.
//!
//! Block retrieval happens elsewhere; this module only turns an already
//! fetched, ordered batch of block metadata into an MMR leaf.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::crypto::Hash;
use crate::error::{Error, Result};
use crate::node::Node;

/// Metadata of one confirmed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Block number.
    pub number: u64,
    /// Block timestamp.
    pub timestamp: u64,
    /// Block difficulty. Zero when the chain does not report one.
    pub difficulty: u64,
}

impl BlockRecord {
    /// Create a block record.
    pub fn new(number: u64, timestamp: u64, difficulty: u64) -> Self {
        Self {
            number,
            timestamp,
            difficulty,
        }
    }
}

/// What to do when a batch reports no difficulty at all.
///
/// Development chains commonly report zero difficulty for every block. Using
/// the block count as weight keeps the tree usable but removes the
/// proof-of-work weighting from sampling, so it has to be opted into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DifficultyPolicy {
    /// Substitute the block count for a zero total difficulty.
    #[default]
    FallbackToBlockCount,
    /// Reject batches whose total difficulty is zero.
    Strict,
}

/// Where a leaf's weight came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightSource {
    /// Sum of the reported block difficulties.
    Difficulty,
    /// Block count substituted for a zero total difficulty.
    BlockCountFallback,
}

/// A built leaf together with the provenance of its weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafBuild {
    /// The leaf node.
    pub node: Node,
    /// Where the weight came from.
    pub weight_source: WeightSource,
}

/// An ordered batch of blocks that becomes one MMR leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafBatch {
    /// Content hash for the leaf, computed by the caller
    /// (typically the hash of the last block in the batch).
    pub content_hash: Hash,
    /// Blocks in chain order.
    pub blocks: Vec<BlockRecord>,
}

impl LeafBatch {
    /// Create a batch.
    pub fn new(content_hash: Hash, blocks: Vec<BlockRecord>) -> Self {
        Self {
            content_hash,
            blocks,
        }
    }

    /// Number of the first block, if any.
    pub fn first_block(&self) -> Option<u64> {
        self.blocks.first().map(|b| b.number)
    }

    /// Validate the batch and build its leaf.
    pub fn to_leaf(&self, policy: DifficultyPolicy) -> Result<LeafBuild> {
        let (first, last) = match (self.blocks.first(), self.blocks.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(Error::malformed_leaf("batch contains no blocks")),
        };

        for pair in self.blocks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.number.checked_add(1) != Some(next.number) {
                return Err(Error::malformed_leaf(format!(
                    "block {} is followed by block {}",
                    prev.number, next.number
                )));
            }
            if next.timestamp < prev.timestamp {
                return Err(Error::malformed_leaf(format!(
                    "timestamp decreases from {} to {} at block {}",
                    prev.timestamp, next.timestamp, next.number
                )));
            }
        }

        let block_count = self.blocks.len() as u128;
        let difficulty: u128 = self.blocks.iter().map(|b| b.difficulty as u128).sum();

        let (weight, weight_source) = if difficulty > 0 {
            (difficulty, WeightSource::Difficulty)
        } else {
            match policy {
                DifficultyPolicy::Strict => {
                    return Err(Error::malformed_leaf(format!(
                        "blocks {}..={} report no difficulty",
                        first.number, last.number
                    )))
                }
                DifficultyPolicy::FallbackToBlockCount => {
                    warn!(
                        first_block = first.number,
                        last_block = last.number,
                        block_count = self.blocks.len(),
                        "batch reports no difficulty, using block count as leaf weight"
                    );
                    (block_count, WeightSource::BlockCountFallback)
                }
            }
        };

        Ok(LeafBuild {
            node: Node::new(
                self.content_hash,
                first.timestamp,
                last.timestamp,
                first.difficulty,
                last.difficulty,
                weight,
                block_count,
            ),
            weight_source,
        })
    }
}
