//! Proof-size experiments over simulated chains.

use flymmr_core::{keccak256, Error, Node};
use flymmr_mmr::DifficultyMmr;
use serde::Serialize;
use tracing::info;

use crate::errors::Result;
use crate::params::SamplePlan;
use crate::protocol::SamplingProtocol;

/// z-score of a two-sided 95% normal confidence interval.
const Z_95: f64 = 1.96;

/// Build a tree for a simulated chain of `chain_length` blocks with
/// `blocks_per_leaf` blocks per leaf.
///
/// Every block has difficulty 1, so each of the
/// `ceil(chain_length / blocks_per_leaf)` leaves has weight and block count
/// `blocks_per_leaf`. Leaves get distinct content hashes.
pub fn simulation_tree(blocks_per_leaf: u64, chain_length: u64) -> Result<DifficultyMmr> {
    if blocks_per_leaf == 0 || chain_length == 0 {
        return Err(Error::invalid_parameters(format!(
            "cannot simulate {} blocks with {} blocks per leaf",
            chain_length, blocks_per_leaf
        ))
        .into());
    }

    let leaf_count = chain_length.div_ceil(blocks_per_leaf);
    let leaves = (0..leaf_count)
        .map(|i| {
            let first_block = i * blocks_per_leaf;
            Node::new(
                keccak256(&first_block.to_be_bytes()),
                first_block,
                first_block + blocks_per_leaf - 1,
                1,
                1,
                blocks_per_leaf as u128,
                blocks_per_leaf as u128,
            )
        })
        .collect();

    let mut tree = DifficultyMmr::new();
    tree.append_batch(leaves)?;
    Ok(tree)
}

/// Mean, sample standard deviation and 95% confidence half-width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistic {
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (zero for a single sample).
    pub std_dev: f64,
    /// Half-width of the 95% normal confidence interval.
    pub ci95: f64,
}

impl Statistic {
    /// Summarize samples. Returns `None` for an empty slice.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let std_dev = if samples.len() > 1 {
            let sum_sq: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
            (sum_sq / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        Some(Self {
            mean,
            std_dev,
            ci95: Z_95 * std_dev / n.sqrt(),
        })
    }

    /// Lower and upper bound of the confidence interval.
    pub fn interval(&self) -> (f64, f64) {
        (self.mean - self.ci95, self.mean + self.ci95)
    }
}

/// Aggregate of repeated sampling runs over one tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSummary {
    /// Number of runs (seeds `0..runs`).
    pub runs: u64,
    /// Leaves in the tree.
    pub leaf_count: u64,
    /// Sample plan shared by every run.
    pub plan: SamplePlan,
    /// Deduplicated proof size in bytes.
    pub no_duplicates: Statistic,
    /// Proof size in bytes with every draw answered in full.
    pub with_duplicates: Statistic,
    /// Number of distinct sampled leaves.
    pub distinct_leaves: Statistic,
}

/// Upper bound on per-run buffers reserved up front; longer series grow as they go.
const MAX_PREALLOCATED_RUNS: u64 = 1 << 16;

fn preallocated_runs(runs: u64) -> usize {
    runs.min(MAX_PREALLOCATED_RUNS) as usize
}

/// Run the protocol for seeds `0..runs` and summarize the proof sizes.
pub fn run_experiments(
    tree: &DifficultyMmr,
    protocol: &SamplingProtocol,
    runs: u64,
) -> Result<ExperimentSummary> {
    if runs == 0 {
        return Err(Error::invalid_parameters("at least one run is required").into());
    }

    let capacity = preallocated_runs(runs);
    let mut no_duplicates = Vec::with_capacity(capacity);
    let mut with_duplicates = Vec::with_capacity(capacity);
    let mut distinct = Vec::with_capacity(capacity);
    let mut plan = None;

    for seed in 0..runs {
        let report = protocol.with_seed(seed).run(tree)?;
        no_duplicates.push(report.total_proof_size_no_duplicates as f64);
        with_duplicates.push(report.total_proof_size_with_duplicates as f64);
        distinct.push(report.distinct_leaves as f64);
        plan.get_or_insert(report.plan);
    }

    let missing = || Error::internal("no runs were summarized");
    let summary = ExperimentSummary {
        runs,
        leaf_count: tree.leaf_count(),
        plan: plan.ok_or_else(missing)?,
        no_duplicates: Statistic::from_samples(&no_duplicates).ok_or_else(missing)?,
        with_duplicates: Statistic::from_samples(&with_duplicates).ok_or_else(missing)?,
        distinct_leaves: Statistic::from_samples(&distinct).ok_or_else(missing)?,
    };

    info!(
        runs,
        leaves = summary.leaf_count,
        m = summary.plan.sample_count,
        mean_no_duplicates = summary.no_duplicates.mean,
        ci95_no_duplicates = summary.no_duplicates.ci95,
        mean_with_duplicates = summary.with_duplicates.mean,
        "experiments complete"
    );

    Ok(summary)
}
