//! Difficulty-annotated MMR nodes.
//!
//! A [`Node`] is either a leaf built from a batch of blocks or the result of
//! merging two siblings. Besides its content hash it carries the range
//! metadata a light client needs to check difficulty transitions: the
//! timestamps and difficulties of the first and last covered block, the total
//! difficulty (weight) and the number of covered blocks.
//!
//! ```text
//!                 merge(L, R)
//!   content_hash = H(L.identity_hash() ‖ R.identity_hash())
//!   first_*      = L.first_*
//!   last_*       = R.last_*
//!   weight       = L.weight + R.weight
//!   block_count  = L.block_count + R.block_count
//! ```

use serde::{Deserialize, Serialize};

use crate::crypto::{hash_pair, keccak256, Hash};

/// Canonical 7-field form of a node, in verifier argument order:
/// `(content_hash, first_timestamp, last_timestamp, first_difficulty,
/// last_difficulty, weight, block_count)`.
pub type NodeTuple = (Hash, u64, u64, u64, u64, u128, u128);

/// Size of the identity encoding: seven 32-byte ABI words.
pub const IDENTITY_ENCODING_LEN: usize = 7 * 32;

/// Size of a node's fields at their natural widths, as counted by the proof
/// bandwidth model.
pub const NODE_FIELD_BYTES: usize = 32 + 4 * 8 + 2 * 16;

/// Immutable MMR node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Content hash ("peak") of the node.
    pub content_hash: Hash,
    /// Timestamp of the first covered block.
    pub first_timestamp: u64,
    /// Timestamp of the last covered block.
    pub last_timestamp: u64,
    /// Difficulty of the first covered block.
    pub first_difficulty: u64,
    /// Difficulty of the last covered block.
    pub last_difficulty: u64,
    /// Total difficulty covered by the subtree.
    pub weight: u128,
    /// Number of raw blocks covered by the subtree.
    pub block_count: u128,
}

impl Node {
    /// Create a node from its seven fields.
    pub fn new(
        content_hash: Hash,
        first_timestamp: u64,
        last_timestamp: u64,
        first_difficulty: u64,
        last_difficulty: u64,
        weight: u128,
        block_count: u128,
    ) -> Self {
        Self {
            content_hash,
            first_timestamp,
            last_timestamp,
            first_difficulty,
            last_difficulty,
            weight,
            block_count,
        }
    }

    /// Merge `self` (left) with its right sibling.
    ///
    /// The summed weight and block count must fit in `u128`. Inside a tree
    /// this holds because `append` bounds the totals; nodes from outside the
    /// tree go through [`Node::checked_merge`].
    pub fn merge(&self, right: &Node) -> Node {
        Node {
            content_hash: hash_pair(self.identity_hash(), right.identity_hash()),
            first_timestamp: self.first_timestamp,
            last_timestamp: right.last_timestamp,
            first_difficulty: self.first_difficulty,
            last_difficulty: right.last_difficulty,
            weight: self.weight + right.weight,
            block_count: self.block_count + right.block_count,
        }
    }

    /// Merge with its right sibling, or `None` if the summed weight or block
    /// count overflows.
    pub fn checked_merge(&self, right: &Node) -> Option<Node> {
        let weight = self.weight.checked_add(right.weight)?;
        let block_count = self.block_count.checked_add(right.block_count)?;
        Some(Node {
            content_hash: hash_pair(self.identity_hash(), right.identity_hash()),
            first_timestamp: self.first_timestamp,
            last_timestamp: right.last_timestamp,
            first_difficulty: self.first_difficulty,
            last_difficulty: right.last_difficulty,
            weight,
            block_count,
        })
    }

    /// ABI encoding of all seven fields, as `abi.encode(bytes32, uint64,
    /// uint64, uint64, uint64, uint128, uint128)`: one 32-byte word per
    /// field, integers big-endian and left-padded with zeros.
    pub fn identity_bytes(&self) -> [u8; IDENTITY_ENCODING_LEN] {
        let mut out = [0u8; IDENTITY_ENCODING_LEN];
        let mut word = |index: usize, value: &[u8]| {
            let end = 32 * (index + 1);
            out[end - value.len()..end].copy_from_slice(value);
        };
        word(0, self.content_hash.as_bytes());
        word(1, &self.first_timestamp.to_be_bytes());
        word(2, &self.last_timestamp.to_be_bytes());
        word(3, &self.first_difficulty.to_be_bytes());
        word(4, &self.last_difficulty.to_be_bytes());
        word(5, &self.weight.to_be_bytes());
        word(6, &self.block_count.to_be_bytes());
        out
    }

    /// Keccak-256 of [`Node::identity_bytes`]; the node's external fingerprint.
    pub fn identity_hash(&self) -> Hash {
        keccak256(&self.identity_bytes())
    }

    /// The node as a canonical tuple.
    pub fn to_canonical_tuple(&self) -> NodeTuple {
        (
            self.content_hash,
            self.first_timestamp,
            self.last_timestamp,
            self.first_difficulty,
            self.last_difficulty,
            self.weight,
            self.block_count,
        )
    }

    /// Restore a node from its canonical tuple.
    pub fn from_canonical_tuple(tuple: NodeTuple) -> Self {
        let (content_hash, t_first, t_last, d_first, d_last, weight, block_count) = tuple;
        Self::new(content_hash, t_first, t_last, d_first, d_last, weight, block_count)
    }
}

impl From<NodeTuple> for Node {
    fn from(tuple: NodeTuple) -> Self {
        Node::from_canonical_tuple(tuple)
    }
}

impl From<&Node> for NodeTuple {
    fn from(node: &Node) -> Self {
        node.to_canonical_tuple()
    }
}
