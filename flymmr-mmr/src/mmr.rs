//! Difficulty-weighted MMR with provisional bagging.
//!
//! The tree is stored level by level. `levels[0]` holds the leaves in
//! insertion order and `levels[i + 1]` holds the merges of adjacent pairs on
//! `levels[i]`. After every append the peaks (the last node of every level
//! with an odd node count) are bagged into a single provisional root:
//!
//! ```text
//! n = 5 (odd levels 0, 2)
//!
//! level 3:        R = merge(P2, P0)         scaffold level
//! level 2:        P2
//! level 1:    a       b
//! level 0:  0   1   2   3   P0
//! ```
//!
//! Provisional nodes are removed again at the start of the next append, so
//! every read observes either the bagged state after an append or the empty
//! tree.

use flymmr_core::{Error, Hash, Node, NodeTuple, Position, ProofNode, Result};
use tracing::debug;

use crate::proof::LeafProof;
use crate::shape::TreeShape;

/// Below this many indices proofs are generated sequentially.
const PARALLEL_PROOF_THRESHOLD: usize = 16;

/// Difficulty-weighted Merkle Mountain Range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyMmr {
    levels: Vec<Vec<Node>>,
    cumulative_weight: Vec<u128>,
    odd_levels: Vec<usize>,
}

impl Default for DifficultyMmr {
    fn default() -> Self {
        Self::new()
    }
}

impl DifficultyMmr {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            levels: vec![Vec::new()],
            cumulative_weight: Vec::new(),
            odd_levels: Vec::new(),
        }
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> u64 {
        self.leaves().len() as u64
    }

    /// Whether the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.leaves().is_empty()
    }

    /// Get a leaf by index.
    pub fn leaf(&self, index: u64) -> Option<&Node> {
        usize::try_from(index).ok().and_then(|i| self.leaves().get(i))
    }

    /// All leaves in insertion order.
    pub fn leaves(&self) -> &[Node] {
        self.levels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// All levels, including provisional nodes and the scaffold root level.
    pub fn levels(&self) -> &[Vec<Node>] {
        &self.levels
    }

    /// Levels left with an odd node count by the last append, ascending.
    pub fn odd_levels(&self) -> &[usize] {
        &self.odd_levels
    }

    /// Running weight totals, aligned with the leaves.
    pub fn cumulative_weights(&self) -> &[u128] {
        &self.cumulative_weight
    }

    /// Total weight of all leaves.
    pub fn total_weight(&self) -> u128 {
        self.cumulative_weight.last().copied().unwrap_or(0)
    }

    /// Total number of blocks covered by all leaves.
    pub fn total_blocks(&self) -> u128 {
        self.root().map(|r| r.block_count).unwrap_or(0)
    }

    /// Shape of the tree, derived from the leaf count.
    pub fn shape(&self) -> TreeShape {
        TreeShape::new(self.leaf_count())
    }

    /// The current root.
    pub fn root(&self) -> Result<&Node> {
        if self.is_empty() {
            return Err(Error::empty_tree());
        }
        self.levels
            .last()
            .and_then(|top| top.first())
            .ok_or_else(|| Error::internal("top level is empty"))
    }

    /// The current root as a canonical tuple.
    pub fn root_tuple(&self) -> Result<NodeTuple> {
        self.root().map(Node::to_canonical_tuple)
    }

    /// Index of the first leaf with the given content hash.
    pub fn leaf_index_by_content_hash(&self, content_hash: &Hash) -> Option<u64> {
        self.leaves()
            .iter()
            .position(|leaf| leaf.content_hash == *content_hash)
            .map(|i| i as u64)
    }

    /// Append a leaf and return its index.
    ///
    /// The leaf is validated against the current tree first; a rejected
    /// leaf leaves the tree untouched.
    pub fn append(&mut self, leaf: Node) -> Result<u64> {
        let previous = self.leaves().last();
        check_leaf(&leaf, previous, self.total_weight(), self.total_blocks())?;

        self.clean();

        let weight = self.total_weight() + leaf.weight;
        let leaf_weight = leaf.weight;
        self.levels[0].push(leaf);
        self.cumulative_weight.push(weight);

        self.pair();
        self.bag();

        let index = self.leaf_count() - 1;
        debug!(
            leaf_index = index,
            leaf_weight = %leaf_weight,
            total_weight = %weight,
            odd_levels = self.odd_levels.len(),
            "appended leaf"
        );
        Ok(index)
    }

    /// Append several leaves.
    ///
    /// Every leaf is validated against the running state before any of them
    /// is appended, so either all leaves are added or none is.
    pub fn append_batch(&mut self, leaves: Vec<Node>) -> Result<Vec<u64>> {
        if leaves.is_empty() {
            return Ok(vec![]);
        }

        let mut previous = self.leaves().last();
        let mut total_weight = self.total_weight();
        let mut total_blocks = self.total_blocks();
        for (offset, leaf) in leaves.iter().enumerate() {
            check_leaf(leaf, previous, total_weight, total_blocks).map_err(|e| {
                Error::malformed_leaf(format!("batch entry {}: {}", offset, e))
            })?;
            total_weight += leaf.weight;
            total_blocks += leaf.block_count;
            previous = Some(leaf);
        }

        let mut indices = Vec::with_capacity(leaves.len());
        for leaf in leaves {
            indices.push(self.append(leaf)?);
        }
        Ok(indices)
    }

    /// Generate an inclusion proof for a leaf against the current root.
    pub fn proof(&self, leaf_index: u64) -> Result<LeafProof> {
        if self.is_empty() {
            return Err(Error::empty_tree());
        }
        let leaf = self.leaf(leaf_index).ok_or_else(|| {
            Error::invalid_index(format!(
                "leaf {} >= leaf count {}",
                leaf_index,
                self.leaf_count()
            ))
        })?;

        let mut path = Vec::new();
        let mut index = leaf_index as usize;
        for level in 0..self.levels.len() - 1 {
            let nodes = &self.levels[level];
            if index >= nodes.len() {
                index /= 2;
                continue;
            }

            let step = if index % 2 == 1 {
                ProofNode {
                    node: nodes[index - 1].clone(),
                    position: Position::Left,
                }
            } else if index + 1 < nodes.len() {
                ProofNode {
                    node: nodes[index + 1].clone(),
                    position: Position::Right,
                }
            } else {
                self.bagging_partner(level)?
            };
            path.push(step);
            index /= 2;
        }

        Ok(LeafProof {
            leaf_index,
            leaf_count: self.leaf_count(),
            leaf: leaf.clone(),
            path,
        })
    }

    /// Generate proofs for several leaves.
    ///
    /// Large batches are generated in parallel with Rayon.
    pub fn proof_batch(&self, leaf_indices: &[u64]) -> Result<Vec<LeafProof>> {
        use rayon::prelude::*;

        debug!(count = leaf_indices.len(), "generating proof batch");

        if leaf_indices.len() < PARALLEL_PROOF_THRESHOLD {
            return leaf_indices.iter().map(|&i| self.proof(i)).collect();
        }

        leaf_indices.par_iter().map(|&i| self.proof(i)).collect()
    }

    /// Index of the leaf whose running weight total is closest to
    /// `fraction` of the total weight.
    ///
    /// Returns the exact match if the search lands on one, otherwise the last midpoint
    /// of the binary search, which is one of the two entries adjacent to the
    /// insertion point of the target.
    pub fn leaf_index_for_relative_weight(&self, fraction: f64) -> Result<u64> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(Error::invalid_fraction(fraction));
        }
        if self.is_empty() {
            return Err(Error::empty_tree());
        }

        let total = self.total_weight();
        let target = ((total as f64 * fraction).floor() as u128).min(total);

        let weights = &self.cumulative_weight;
        let mut start = 0usize;
        let mut end = weights.len() - 1;
        let mut mid = 0usize;
        while start <= end {
            mid = start + (end - start) / 2;
            match weights[mid].cmp(&target) {
                std::cmp::Ordering::Equal => return Ok(mid as u64),
                std::cmp::Ordering::Less => start = mid + 1,
                std::cmp::Ordering::Greater => {
                    if mid == 0 {
                        break;
                    }
                    end = mid - 1;
                }
            }
        }
        Ok(mid as u64)
    }

    /// Remove the provisional nodes left by the previous append.
    fn clean(&mut self) {
        if let Some(&top) = self.odd_levels.last() {
            if top + 2 == self.levels.len() {
                self.levels.pop();
            }
        }
        for &level in self.odd_levels.iter().skip(2) {
            self.levels[level].pop();
        }
        self.odd_levels.clear();

        let n = self.levels[0].len();
        for (i, level) in self.levels.iter().enumerate() {
            assert_eq!(
                level.len(),
                n >> i,
                "level {} holds {} nodes after cleaning {} leaves",
                i,
                level.len(),
                n
            );
        }
    }

    /// Carry pairs upwards and record the levels left with an odd count.
    fn pair(&mut self) {
        let mut pairing = true;
        let mut level = 0;
        while level < self.levels.len() {
            let len = self.levels[level].len();
            if len % 2 == 1 {
                self.odd_levels.push(level);
                pairing = false;
            } else if pairing {
                let parent = self.levels[level][len - 2].merge(&self.levels[level][len - 1]);
                if level + 1 == self.levels.len() {
                    self.levels.push(Vec::new());
                }
                self.levels[level + 1].push(parent);
            }
            level += 1;
        }
    }

    /// Bag the peaks into a provisional root, higher peaks on the left.
    fn bag(&mut self) {
        if self.odd_levels.len() < 2 {
            return;
        }

        let first = self.odd_levels[0];
        let second = self.odd_levels[1];
        let mut running = match (self.levels[second].last(), self.levels[first].last()) {
            (Some(higher), Some(lower)) => higher.merge(lower),
            _ => return,
        };

        for j in 2..self.odd_levels.len() {
            let level = self.odd_levels[j];
            self.levels[level].push(running);
            let nodes = &self.levels[level];
            running = nodes[nodes.len() - 2].merge(&nodes[nodes.len() - 1]);
        }

        self.levels.push(vec![running]);
    }

    /// The node bagged with the peak on `level`.
    fn bagging_partner(&self, level: usize) -> Result<ProofNode> {
        let rank = self
            .odd_levels
            .iter()
            .position(|&l| l == level)
            .ok_or_else(|| {
                Error::internal(format!("level {} has no right sibling and is not odd", level))
            })?;

        let (partner, position) = if rank == 0 {
            (self.odd_levels.get(1), Position::Left)
        } else {
            (self.odd_levels.get(rank - 1), Position::Right)
        };

        partner
            .and_then(|&l| self.levels[l].last())
            .map(|node| ProofNode {
                node: node.clone(),
                position,
            })
            .ok_or_else(|| Error::internal(format!("level {} has no bagging partner", level)))
    }
}

/// Check a leaf against the state it is appended to.
fn check_leaf(
    leaf: &Node,
    previous: Option<&Node>,
    total_weight: u128,
    total_blocks: u128,
) -> Result<()> {
    if leaf.block_count == 0 {
        return Err(Error::malformed_leaf("leaf covers no blocks"));
    }
    if leaf.last_timestamp < leaf.first_timestamp {
        return Err(Error::malformed_leaf(format!(
            "last timestamp {} precedes first timestamp {}",
            leaf.last_timestamp, leaf.first_timestamp
        )));
    }
    if let Some(previous) = previous {
        if leaf.first_timestamp < previous.last_timestamp {
            return Err(Error::malformed_leaf(format!(
                "first timestamp {} precedes previous leaf's last timestamp {}",
                leaf.first_timestamp, previous.last_timestamp
            )));
        }
    }
    if total_weight.checked_add(leaf.weight).is_none() {
        return Err(Error::malformed_leaf("total weight overflows u128"));
    }
    if total_blocks.checked_add(leaf.block_count).is_none() {
        return Err(Error::malformed_leaf("total block count overflows u128"));
    }
    Ok(())
}

/// Recompute the bagged root of a leaf sequence from scratch.
///
/// The leaves are split into perfect subtrees following the binary
/// decomposition of their count, and the subtree roots are bagged right to
/// left with the higher peak always on the left.
pub fn compute_root(leaves: &[Node]) -> Result<Node> {
    if leaves.is_empty() {
        return Err(Error::empty_tree());
    }

    let mut peaks = Vec::new();
    let mut offset = 0usize;
    let mut remaining = leaves.len();
    while remaining > 0 {
        let size = 1usize << (usize::BITS - 1 - remaining.leading_zeros());
        peaks.push(subtree_root(&leaves[offset..offset + size])?);
        offset += size;
        remaining -= size;
    }

    bag_peaks(peaks)
}

fn merge_checked(left: &Node, right: &Node) -> Result<Node> {
    left.checked_merge(right)
        .ok_or_else(|| Error::malformed_leaf("summed leaf weight or block count overflows u128"))
}

/// Bag peaks (highest first) right to left.
fn bag_peaks(peaks: Vec<Node>) -> Result<Node> {
    let mut iter = peaks.into_iter().rev();
    let last = iter.next().ok_or_else(Error::empty_tree)?;
    iter.try_fold(last, |root, peak| merge_checked(&peak, &root))
}

/// Root of a perfect subtree.
fn subtree_root(leaves: &[Node]) -> Result<Node> {
    let mut level: Vec<Node> = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| merge_checked(&pair[0], &pair[1]))
            .collect::<Result<_>>()?;
    }
    level.pop().ok_or_else(Error::empty_tree)
}
