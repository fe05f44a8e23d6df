//! Property-based tests for core types.
//!
//! Uses proptest to verify invariants hold for arbitrary inputs.

use proptest::prelude::*;

use crate::block::{BlockRecord, DifficultyPolicy, LeafBatch, WeightSource};
use crate::crypto::{hash_pair, Hash};
use crate::node::{Node, NodeTuple};

// ============================================================================
// Arbitrary Implementations
// ============================================================================

/// Generate arbitrary Hash values.
fn arb_hash() -> impl Strategy<Value = Hash> {
    prop::array::uniform32(any::<u8>()).prop_map(Hash::from_bytes)
}

/// Generate arbitrary nodes with weights small enough to merge without overflow.
fn arb_node() -> impl Strategy<Value = Node> {
    (
        arb_hash(),
        any::<u64>(),
        any::<u64>(),
        any::<u64>(),
        any::<u64>(),
        0..u64::MAX as u128,
        0..u64::MAX as u128,
    )
        .prop_map(|(h, tf, tl, df, dl, w, n)| Node::new(h, tf, tl, df, dl, w, n))
}

/// Generate a well-formed batch: consecutive numbers, non-decreasing timestamps.
fn arb_batch() -> impl Strategy<Value = LeafBatch> {
    (
        arb_hash(),
        any::<u32>(),
        prop::collection::vec((0u64..1_000, 0u64..1_000_000), 1..64),
    )
        .prop_map(|(hash, start, steps)| {
            let mut timestamp = 0u64;
            let blocks = steps
                .into_iter()
                .enumerate()
                .map(|(i, (dt, difficulty))| {
                    timestamp += dt;
                    BlockRecord::new(start as u64 + i as u64, timestamp, difficulty)
                })
                .collect();
            LeafBatch::new(hash, blocks)
        })
}

// ============================================================================
// Property Tests: Node
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Merge aggregates every field per the node invariants
    #[test]
    fn prop_merge_invariants(l in arb_node(), r in arb_node()) {
        let m = l.merge(&r);
        prop_assert_eq!(m.weight, l.weight + r.weight);
        prop_assert_eq!(m.block_count, l.block_count + r.block_count);
        prop_assert_eq!(m.first_timestamp, l.first_timestamp);
        prop_assert_eq!(m.last_timestamp, r.last_timestamp);
        prop_assert_eq!(m.first_difficulty, l.first_difficulty);
        prop_assert_eq!(m.last_difficulty, r.last_difficulty);
        prop_assert_eq!(m.content_hash, hash_pair(l.identity_hash(), r.identity_hash()));
    }

    /// Merge is deterministic
    #[test]
    fn prop_merge_deterministic(l in arb_node(), r in arb_node()) {
        prop_assert_eq!(l.merge(&r), l.clone().merge(&r.clone()));
    }

    /// Canonical tuple restores the same node
    #[test]
    fn prop_tuple_roundtrip(n in arb_node()) {
        let tuple: NodeTuple = n.to_canonical_tuple();
        prop_assert_eq!(Node::from_canonical_tuple(tuple), n);
    }

    /// Distinct nodes have distinct identity hashes
    #[test]
    fn prop_identity_distinguishes(a in arb_node(), b in arb_node()) {
        prop_assume!(a != b);
        prop_assert_ne!(a.identity_hash(), b.identity_hash());
    }
}

// ============================================================================
// Property Tests: Leaf Construction
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Well-formed batches always build a leaf covering every block
    #[test]
    fn prop_batch_builds_leaf(batch in arb_batch()) {
        let built = batch.to_leaf(DifficultyPolicy::FallbackToBlockCount).unwrap();
        let first = batch.blocks.first().unwrap();
        let last = batch.blocks.last().unwrap();

        prop_assert_eq!(built.node.block_count, batch.blocks.len() as u128);
        prop_assert_eq!(built.node.first_timestamp, first.timestamp);
        prop_assert_eq!(built.node.last_timestamp, last.timestamp);

        let difficulty: u128 = batch.blocks.iter().map(|b| b.difficulty as u128).sum();
        if difficulty == 0 {
            prop_assert_eq!(built.weight_source, WeightSource::BlockCountFallback);
            prop_assert_eq!(built.node.weight, built.node.block_count);
        } else {
            prop_assert_eq!(built.weight_source, WeightSource::Difficulty);
            prop_assert_eq!(built.node.weight, difficulty);
        }
    }

    /// Swapping two blocks with different timestamps is rejected
    #[test]
    fn prop_reordered_batch_rejected(batch in arb_batch()) {
        prop_assume!(batch.blocks.len() >= 2);
        let mut shuffled = batch.clone();
        shuffled.blocks.swap(0, 1);
        prop_assert!(shuffled.to_leaf(DifficultyPolicy::FallbackToBlockCount).is_err());
    }
}
