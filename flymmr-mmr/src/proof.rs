//! Leaf inclusion proofs.

use flymmr_core::{replay, Error, Node, ProofBundle, ProofNode, Result};
use serde::{Deserialize, Serialize};

use crate::shape::TreeShape;

/// Inclusion proof of one leaf against the root of a tree with
/// `leaf_count` leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafProof {
    /// Index of the proven leaf.
    pub leaf_index: u64,
    /// Number of leaves in the tree when the proof was generated.
    pub leaf_count: u64,
    /// The proven leaf.
    pub leaf: Node,
    /// Siblings on the path to the root, bottom to top.
    pub path: Vec<ProofNode>,
}

impl LeafProof {
    /// Proof nodes in path order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.path.iter().map(|step| &step.node)
    }

    /// Number of proof nodes.
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// Whether the proof has no nodes (single-leaf tree).
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Replay the merge chain and return the root it produces.
    ///
    /// Orientations are re-derived from `(leaf_index, leaf_count)`; a path
    /// whose length or carried orientations disagree is rejected.
    pub fn compute_root(&self) -> Result<Node> {
        let expected = TreeShape::new(self.leaf_count).path(self.leaf_index)?;
        if expected.len() != self.path.len() {
            return Err(Error::invalid_proof(format!(
                "expected {} proof nodes for leaf {} of {}, got {}",
                expected.len(),
                self.leaf_index,
                self.leaf_count,
                self.path.len()
            )));
        }
        if let Some(level) = expected
            .iter()
            .zip(&self.path)
            .position(|(position, step)| *position != step.position)
        {
            return Err(Error::invalid_proof(format!(
                "proof node {} has the wrong orientation",
                level
            )));
        }

        replay(&self.leaf, &self.path)
    }

    /// Check the proof against a root.
    pub fn verify(&self, root: &Node) -> Result<bool> {
        Ok(self.compute_root()? == *root)
    }

    /// Canonical tuple form for an external verifier.
    pub fn to_bundle(&self) -> ProofBundle {
        ProofBundle {
            leaf_index: self.leaf_index,
            leaf_count: self.leaf_count,
            leaf: self.leaf.to_canonical_tuple(),
            proof: self.nodes().map(Node::to_canonical_tuple).collect(),
        }
    }

    /// Rebuild a proof from its tuple form, deriving orientations from the
    /// tree shape.
    pub fn from_bundle(bundle: &ProofBundle) -> Result<Self> {
        let positions = TreeShape::new(bundle.leaf_count).path(bundle.leaf_index)?;
        if positions.len() != bundle.proof.len() {
            return Err(Error::invalid_proof(format!(
                "expected {} proof nodes, bundle carries {}",
                positions.len(),
                bundle.proof.len()
            )));
        }

        let path = positions
            .into_iter()
            .zip(&bundle.proof)
            .map(|(position, tuple)| ProofNode {
                node: Node::from_canonical_tuple(*tuple),
                position,
            })
            .collect();

        Ok(Self {
            leaf_index: bundle.leaf_index,
            leaf_count: bundle.leaf_count,
            leaf: Node::from_canonical_tuple(bundle.leaf),
            path,
        })
    }
}
