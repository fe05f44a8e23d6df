//! Proof path types shared by the prover and verifiers.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::{Node, NodeTuple};

/// Position of a sibling in a proof path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Sibling is on the left.
    Left,
    /// Sibling is on the right.
    Right,
}

/// A node in a proof path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    /// The sibling node.
    pub node: Node,
    /// Position of the sibling relative to the path.
    pub position: Position,
}

impl ProofNode {
    /// Merge the running path node with this sibling.
    ///
    /// Proof nodes come from outside the tree, so an overflowing weight or
    /// block count is an invalid proof rather than a panic.
    pub fn apply(&self, current: &Node) -> Result<Node> {
        let merged = match self.position {
            Position::Left => self.node.checked_merge(current),
            Position::Right => current.checked_merge(&self.node),
        };
        merged.ok_or_else(|| Error::invalid_proof("merged weight or block count overflows u128"))
    }
}

/// Fold a leaf through a proof path, bottom to top.
pub fn replay<'a>(leaf: &Node, path: impl IntoIterator<Item = &'a ProofNode>) -> Result<Node> {
    path.into_iter()
        .try_fold(leaf.clone(), |current, step| step.apply(&current))
}

/// Proof in the tuple form handed to an external verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    /// Index of the proven leaf.
    pub leaf_index: u64,
    /// Number of leaves in the tree the proof was taken from.
    pub leaf_count: u64,
    /// The proven leaf.
    pub leaf: NodeTuple,
    /// Proof nodes, bottom to top.
    pub proof: Vec<NodeTuple>,
}
