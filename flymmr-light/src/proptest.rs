//! Property-based tests for the sampling protocol.

use proptest::prelude::*;

use crate::coverage::CoverageIndex;
use crate::experiment::simulation_tree;
use crate::params::SecurityParams;
use crate::protocol::SamplingProtocol;
use crate::sampler::WeightSampler;
use crate::size::ProofSizeModel;

// ============================================================================
// Arbitrary Implementations
// ============================================================================

/// Generate parameters that yield a valid plan for trees of weight >= 4096.
fn arb_params() -> impl Strategy<Value = SecurityParams> {
    (0.05f64..0.6, 1u128..64, 1u32..40).prop_map(|(c, tail, lambda)| {
        SecurityParams::default()
            .with_adversary_fraction(c)
            .with_tail_weight(tail)
            .with_lambda(lambda)
    })
}

// ============================================================================
// Property Tests: Plan and Sampler
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A valid plan always has k > 1 and at least one sample
    #[test]
    fn prop_plan_is_positive(params in arb_params(), total in 4096u128..1_000_000) {
        let plan = params.sample_plan(total).unwrap();
        prop_assert!(plan.k > 1.0);
        prop_assert!(plan.sample_count >= 1);
        prop_assert!(plan.weight_fraction > 0.0 && plan.weight_fraction < 1.0);
    }

    /// More security never needs fewer samples
    #[test]
    fn prop_sample_count_monotone_in_lambda(params in arb_params(), total in 4096u128..1_000_000) {
        let base = params.sample_plan(total).unwrap();
        let stronger = params.with_lambda(params.lambda + 10).sample_plan(total).unwrap();
        prop_assert!(stronger.sample_count >= base.sample_count);
    }

    /// Draws are valid relative-weight fractions below the tail
    #[test]
    fn prop_draws_in_range(seed in any::<u64>(), w in 0.0001f64..0.5) {
        for x in WeightSampler::new(seed, w).take(64) {
            prop_assert!(x >= 0.0);
            prop_assert!(x <= 1.0 - w + 1e-12);
        }
    }

    /// Coverage lookups find exactly the recorded spans
    #[test]
    fn prop_coverage_lookup(spans in prop::collection::vec((0u64..5, 1u64..10), 1..40)) {
        let mut index = CoverageIndex::new();
        let mut next = 0u64;
        let mut recorded = Vec::new();
        for (gap, count) in spans {
            let first = next + gap;
            recorded.push((first, count));
            index.push(first, count).unwrap();
            next = first + count;
        }

        for (leaf, (first, count)) in recorded.iter().enumerate() {
            prop_assert_eq!(index.leaf_for_block(*first).unwrap(), leaf as u64);
            prop_assert_eq!(index.leaf_for_block(first + count - 1).unwrap(), leaf as u64);
        }
        prop_assert!(index.leaf_for_block(next).is_err());
    }
}

// ============================================================================
// Property Tests: Protocol Runs
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Same seed, same report; deduplicated total never exceeds the full one
    #[test]
    fn prop_run_reproducible_and_ordered(
        params in arb_params(),
        seed in any::<u64>(),
        blocks_per_leaf in prop::sample::select(vec![1u64, 4, 16]),
    ) {
        let tree = simulation_tree(blocks_per_leaf, 4096).unwrap();
        let protocol = SamplingProtocol::new(params, ProofSizeModel::default()).with_seed(seed);

        let a = protocol.run(&tree).unwrap();
        let b = protocol.run(&tree).unwrap();
        prop_assert_eq!(&a, &b);

        prop_assert!(a.total_proof_size_with_duplicates >= a.total_proof_size_no_duplicates);
        prop_assert_eq!(a.sampled_leaf_indices.len() as u64, a.plan.sample_count);
        prop_assert!(a.distinct_leaves <= a.sampled_leaf_indices.len());
        prop_assert!(a.sampled_leaf_indices.iter().all(|i| *i < tree.leaf_count()));
        prop_assert!(a.verify(tree.root().unwrap()).unwrap());
    }
}
