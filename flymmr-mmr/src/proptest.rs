//! Property-based tests for difficulty MMR operations.
//!
//! Tests invariants of the tree under arbitrary append sequences.

use proptest::prelude::*;

use crate::{compute_root, DifficultyMmr, LeafProof, TreeShape};
use flymmr_core::{Hash, Node};

// ============================================================================
// Arbitrary Implementations
// ============================================================================

/// Generate arbitrary hash values (simulating block hashes).
fn arb_hash() -> impl Strategy<Value = Hash> {
    prop::array::uniform32(any::<u8>()).prop_map(Hash::from_bytes)
}

/// Generate a valid leaf sequence: positive block counts and
/// non-decreasing timestamps across leaves.
fn arb_leaves(max_count: usize) -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec(
        (arb_hash(), 0u64..100, 0u64..100, 0u64..1_000_000, 1u128..64),
        0..max_count,
    )
    .prop_map(|specs| {
        let mut timestamp = 0u64;
        specs
            .into_iter()
            .map(|(hash, gap, span, difficulty, blocks)| {
                let first = timestamp + gap;
                timestamp = first + span;
                Node::new(
                    hash,
                    first,
                    timestamp,
                    difficulty,
                    difficulty,
                    difficulty as u128 * blocks,
                    blocks,
                )
            })
            .collect()
    })
}

fn build(leaves: &[Node]) -> DifficultyMmr {
    let mut mmr = DifficultyMmr::new();
    for leaf in leaves {
        mmr.append(leaf.clone()).expect("append should succeed");
    }
    mmr
}

// ============================================================================
// Property Tests: Structure
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Appending n leaves produces n leaves and n cumulative weights
    #[test]
    fn prop_leaf_count(leaves in arb_leaves(100)) {
        let mmr = build(&leaves);
        prop_assert_eq!(mmr.leaf_count(), leaves.len() as u64);
        prop_assert_eq!(mmr.cumulative_weights().len(), leaves.len());
    }

    /// Cumulative weights are prefix sums of leaf weights
    #[test]
    fn prop_cumulative_weight(leaves in arb_leaves(100)) {
        let mmr = build(&leaves);
        let mut running = 0u128;
        for (leaf, total) in leaves.iter().zip(mmr.cumulative_weights()) {
            running += leaf.weight;
            prop_assert_eq!(*total, running);
        }
    }

    /// Root equals the reference recomputation from the leaves
    #[test]
    fn prop_root_matches_reference(leaves in arb_leaves(80)) {
        prop_assume!(!leaves.is_empty());
        let mmr = build(&leaves);
        let root = mmr.root().expect("non-empty tree has a root");
        prop_assert_eq!(root, &compute_root(&leaves).expect("non-empty"));
        prop_assert_eq!(root.weight, mmr.total_weight());
    }

    /// Level lengths and odd levels agree with the shape table
    #[test]
    fn prop_shape_matches_levels(leaves in arb_leaves(100)) {
        let mmr = build(&leaves);
        let shape = mmr.shape();
        let lens: Vec<u64> = mmr.levels().iter().map(|l| l.len() as u64).collect();
        prop_assert_eq!(lens.as_slice(), shape.level_lens());
        prop_assert_eq!(mmr.odd_levels(), shape.odd_levels());
    }

    /// Restoring from persisted state reproduces the tree
    #[test]
    fn prop_state_roundtrip(leaves in arb_leaves(40)) {
        let mmr = build(&leaves);
        let restored = DifficultyMmr::from_state(mmr.to_state()).expect("valid state");
        prop_assert_eq!(restored, mmr);
    }
}

// ============================================================================
// Property Tests: Proofs
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Every leaf's proof replays to the root
    #[test]
    fn prop_all_proofs_verify(leaves in arb_leaves(64)) {
        let mmr = build(&leaves);
        for i in 0..mmr.leaf_count() {
            let proof = mmr.proof(i).expect("proof should succeed");
            let root = mmr.root().expect("non-empty tree has a root");
            prop_assert!(proof.verify(root).expect("well-formed proof"));
        }
    }

    /// Proof orientation agrees with the path derived from the leaf count
    #[test]
    fn prop_proof_positions_match_shape(leaves in arb_leaves(64), pick in any::<prop::sample::Index>()) {
        prop_assume!(!leaves.is_empty());
        let mmr = build(&leaves);
        let index = pick.index(leaves.len()) as u64;
        let proof = mmr.proof(index).expect("proof should succeed");
        let positions: Vec<_> = proof.path.iter().map(|p| p.position).collect();
        prop_assert_eq!(positions, TreeShape::new(mmr.leaf_count()).path(index).expect("in range"));
    }

    /// Bundles rebuild into the same proof
    #[test]
    fn prop_bundle_roundtrip(leaves in arb_leaves(64), pick in any::<prop::sample::Index>()) {
        prop_assume!(!leaves.is_empty());
        let mmr = build(&leaves);
        let proof = mmr.proof(pick.index(leaves.len()) as u64).expect("proof should succeed");
        let rebuilt = LeafProof::from_bundle(&proof.to_bundle()).expect("valid bundle");
        prop_assert_eq!(rebuilt, proof);
    }

    /// An old proof does not verify against a root after further appends
    #[test]
    fn prop_stale_proof_rejected(leaves in arb_leaves(32), extra in arb_leaves(4)) {
        prop_assume!(!leaves.is_empty() && !extra.is_empty());
        let mut mmr = build(&leaves);
        let proof = mmr.proof(0).expect("proof should succeed");

        let last = leaves.last().expect("non-empty").last_timestamp;
        for leaf in extra {
            let mut leaf = leaf;
            leaf.first_timestamp += last;
            leaf.last_timestamp += last;
            mmr.append(leaf).expect("append should succeed");
        }
        prop_assert!(!proof.verify(mmr.root().expect("non-empty")).expect("well-formed proof"));
    }
}

// ============================================================================
// Property Tests: Weight Search
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Search returns an exact match or a neighbour of the insertion point
    #[test]
    fn prop_relative_weight_search(leaves in arb_leaves(100), fraction in 0.0f64..=1.0) {
        prop_assume!(!leaves.is_empty());
        let mmr = build(&leaves);
        let weights = mmr.cumulative_weights();
        let total = mmr.total_weight();
        let target = ((total as f64 * fraction).floor() as u128).min(total);

        let index = mmr.leaf_index_for_relative_weight(fraction).expect("valid fraction") as usize;
        prop_assert!(index < weights.len());

        if weights.binary_search(&target).is_ok() {
            prop_assert_eq!(weights[index], target);
        } else {
            let insertion = weights.partition_point(|w| *w < target);
            prop_assert!(index + 1 == insertion || index == insertion);
        }
    }

    /// Fractions outside [0, 1] are rejected
    #[test]
    fn prop_out_of_range_fraction(leaves in arb_leaves(10), fraction in 1.0f64..1e9) {
        prop_assume!(!leaves.is_empty() && fraction > 1.0);
        let mmr = build(&leaves);
        prop_assert!(mmr.leaf_index_for_relative_weight(fraction).is_err());
        prop_assert!(mmr.leaf_index_for_relative_weight(-fraction).is_err());
    }
}
