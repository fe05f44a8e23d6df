//! Proof bandwidth model.
//!
//! A sampled leaf is proven with its MMR path, the headers of every block it
//! covers, and a receipt proof for the transaction that committed the root
//! (plus the hash of the block holding that receipt and its position).

use serde::{Deserialize, Serialize};

/// Byte sizes of the parts of a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProofSizeModel {
    /// Size of one MMR node (hash, four u64 fields, two u128 fields).
    pub node_bytes: u64,
    /// Size of one block header.
    pub block_header_bytes: u64,
    /// Size of a transaction receipt proof.
    pub receipt_proof_bytes: u64,
    /// Size of the hash of the block holding the receipt.
    pub block_hash_bytes: u64,
    /// Size of the transaction position.
    pub position_bytes: u64,
}

impl Default for ProofSizeModel {
    fn default() -> Self {
        Self {
            node_bytes: flymmr_core::NODE_FIELD_BYTES as u64,
            block_header_bytes: 508,
            receipt_proof_bytes: 600,
            block_hash_bytes: 32,
            position_bytes: 8,
        }
    }
}

impl ProofSizeModel {
    /// Set the node size.
    pub fn with_node_bytes(mut self, bytes: u64) -> Self {
        self.node_bytes = bytes;
        self
    }

    /// Set the block header size.
    pub fn with_block_header_bytes(mut self, bytes: u64) -> Self {
        self.block_header_bytes = bytes;
        self
    }

    /// Set the receipt proof size.
    pub fn with_receipt_proof_bytes(mut self, bytes: u64) -> Self {
        self.receipt_proof_bytes = bytes;
        self
    }

    /// Bytes to prove a leaf with `nodes` MMR nodes covering `blocks` blocks.
    pub fn leaf_proof_bytes(&self, nodes: usize, blocks: u128) -> u128 {
        (self.node_bytes as u128)
            .saturating_mul(nodes as u128)
            .saturating_add((self.block_header_bytes as u128).saturating_mul(blocks))
            .saturating_add(self.receipt_proof_bytes as u128)
            .saturating_add(self.block_hash_bytes as u128)
            .saturating_add(self.position_bytes as u128)
    }

    /// Bytes for the header committing the root and its receipt proof.
    pub fn root_proof_bytes(&self) -> u128 {
        self.block_header_bytes as u128 + self.receipt_proof_bytes as u128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sizes() {
        let model = ProofSizeModel::default();
        assert_eq!(model.node_bytes, 96);
        assert_eq!(model.root_proof_bytes(), 1108);
        // 3 nodes, 2 blocks: 288 + 1016 + 600 + 32 + 8
        assert_eq!(model.leaf_proof_bytes(3, 2), 1944);
        assert_eq!(model.leaf_proof_bytes(0, 1), 1148);
    }

    #[test]
    fn test_builder() {
        let model = ProofSizeModel::default()
            .with_node_bytes(64)
            .with_block_header_bytes(500)
            .with_receipt_proof_bytes(285);
        assert_eq!(model.leaf_proof_bytes(1, 1), 64 + 500 + 285 + 40);
    }

    #[test]
    fn test_json_partial() {
        let model: ProofSizeModel = serde_json::from_str(r#"{"receiptProofBytes": 285}"#).unwrap();
        assert_eq!(model.receipt_proof_bytes, 285);
        assert_eq!(model.block_header_bytes, 508);
    }
}
