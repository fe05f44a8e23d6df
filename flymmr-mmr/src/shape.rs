//! Tree shape derived from the leaf count alone.
//!
//! The level layout of a difficulty MMR is fully determined by its number of
//! leaves `n`:
//!
//! - level `i` holds `n >> i` finalized nodes for `i <= top`;
//! - the odd levels are exactly the set bits of `n`;
//! - when there are two or more odd levels, bagging appends one provisional
//!   node to every odd level from the third on, and a scaffold level holding
//!   the provisional root is placed on top.
//!
//! ```text
//! n = 7 (odd levels 0, 1, 2)
//!
//! level 3:                  R            scaffold root = merge(P2, h0)
//! level 2:          P2            h0     h0 = merge(P1, P0), provisional
//! level 1:      a       P1
//! level 0:    0   1   2   3   P0
//! ```
//!
//! Verifiers use this to derive proof orientation from `(leaf_index, n)`
//! without trusting the prover.

use flymmr_core::{Error, Position, Result};

/// Level layout of a difficulty MMR with a given number of leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeShape {
    leaf_count: u64,
    odd_levels: Vec<usize>,
    level_lens: Vec<u64>,
}

impl TreeShape {
    /// Derive the shape for `leaf_count` leaves.
    pub fn new(leaf_count: u64) -> Self {
        if leaf_count == 0 {
            return Self {
                leaf_count,
                odd_levels: Vec::new(),
                level_lens: vec![0],
            };
        }

        let top = (u64::BITS - 1 - leaf_count.leading_zeros()) as usize;
        let odd_levels: Vec<usize> = (0..=top).filter(|i| (leaf_count >> i) & 1 == 1).collect();

        let mut level_lens: Vec<u64> = (0..=top).map(|i| leaf_count >> i).collect();
        if odd_levels.len() >= 2 {
            for &level in &odd_levels[2..] {
                level_lens[level] += 1;
            }
            level_lens.push(1);
        }

        Self {
            leaf_count,
            odd_levels,
            level_lens,
        }
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    /// Levels with an odd number of finalized nodes, ascending.
    pub fn odd_levels(&self) -> &[usize] {
        &self.odd_levels
    }

    /// Whether the root is a provisional bagging result on a scaffold level.
    pub fn has_scaffold_root(&self) -> bool {
        self.odd_levels.len() >= 2
    }

    /// Number of levels, including the scaffold level.
    pub fn level_count(&self) -> usize {
        self.level_lens.len()
    }

    /// Node count of a level, including provisional nodes.
    pub fn level_len(&self, level: usize) -> u64 {
        self.level_lens.get(level).copied().unwrap_or(0)
    }

    /// Node counts of all levels, including provisional nodes.
    pub fn level_lens(&self) -> &[u64] {
        &self.level_lens
    }

    /// Number of finalized (non-provisional) nodes on a level.
    pub fn finalized_len(&self, level: usize) -> u64 {
        if level >= u64::BITS as usize {
            return 0;
        }
        self.leaf_count >> level
    }

    /// The odd level whose last node is bagged together with `level`'s last node.
    ///
    /// The first odd level pairs with the next one; every other odd level
    /// pairs with the previous one.
    pub fn bagging_partner(&self, level: usize) -> Option<usize> {
        let rank = self.odd_levels.iter().position(|&l| l == level)?;
        if rank == 0 {
            self.odd_levels.get(1).copied()
        } else {
            self.odd_levels.get(rank - 1).copied()
        }
    }

    /// Sibling positions along the proof path of a leaf, bottom to top.
    pub fn path(&self, leaf_index: u64) -> Result<Vec<Position>> {
        if self.leaf_count == 0 {
            return Err(Error::empty_tree());
        }
        if leaf_index >= self.leaf_count {
            return Err(Error::invalid_index(format!(
                "leaf {} >= leaf count {}",
                leaf_index, self.leaf_count
            )));
        }

        let mut positions = Vec::new();
        let mut index = leaf_index;
        for level in 0..self.level_count() - 1 {
            let len = self.level_len(level);
            if index >= len {
                index /= 2;
                continue;
            }
            let position = if index % 2 == 1 {
                Position::Left
            } else if index + 1 < len {
                Position::Right
            } else if self.odd_levels.first() == Some(&level) {
                Position::Left
            } else {
                Position::Right
            };
            positions.push(position);
            index /= 2;
        }
        Ok(positions)
    }
}
