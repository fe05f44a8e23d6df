//! Security parameters and the sample count they imply.
//!
//! With an adversary controlling a fraction `c` of the total weight `n` and a
//! tail of weight `L` that is always checked, the sampling distribution is
//! parameterised by `w = L / n`. Each weighted sample lands in forged history
//! with probability at least `1 / k` where `k = log_c(w)`, so
//!
//! ```text
//! m = ceil(lambda / log_{1/2}(1 - 1/k))
//! ```
//!
//! samples push the probability of accepting a forged chain below
//! `2^-lambda`.

use flymmr_core::Error;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Security parameters of the sampling protocol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityParams {
    /// Fraction `c` of the total weight the adversary controls, in `(0, 1)`.
    pub adversary_fraction: f64,
    /// Weight `L` at the end of the chain that is always checked.
    pub tail_weight: u128,
    /// Security level: forged chains pass with probability at most `2^-lambda`.
    pub lambda: u32,
}

impl Default for SecurityParams {
    fn default() -> Self {
        Self {
            adversary_fraction: 0.5,
            tail_weight: 50,
            lambda: 10,
        }
    }
}

impl SecurityParams {
    /// Set the adversary fraction.
    pub fn with_adversary_fraction(mut self, c: f64) -> Self {
        self.adversary_fraction = c;
        self
    }

    /// Set the tail weight.
    pub fn with_tail_weight(mut self, tail_weight: u128) -> Self {
        self.tail_weight = tail_weight;
        self
    }

    /// Set the security level.
    pub fn with_lambda(mut self, lambda: u32) -> Self {
        self.lambda = lambda;
        self
    }

    /// Check the parameters that do not depend on the tree.
    pub fn validate(&self) -> Result<()> {
        let c = self.adversary_fraction;
        if !(c > 0.0 && c < 1.0) {
            return Err(Error::invalid_parameters(format!(
                "adversary fraction {} is not within (0, 1)",
                c
            ))
            .into());
        }
        if self.lambda == 0 {
            return Err(Error::invalid_parameters("lambda must be positive").into());
        }
        if self.tail_weight == 0 {
            return Err(Error::invalid_parameters("tail weight must be positive").into());
        }
        Ok(())
    }

    /// Derive the sample plan for a tree of the given total weight.
    pub fn sample_plan(&self, total_weight: u128) -> Result<SamplePlan> {
        self.validate()?;
        if total_weight == 0 {
            return Err(Error::invalid_parameters("total weight is zero").into());
        }
        if self.tail_weight >= total_weight {
            return Err(Error::invalid_parameters(format!(
                "tail weight {} is not below total weight {}",
                self.tail_weight, total_weight
            ))
            .into());
        }

        let weight_fraction = self.tail_weight as f64 / total_weight as f64;
        let k = weight_fraction.ln() / self.adversary_fraction.ln();
        if !(k > 1.0) {
            return Err(Error::invalid_parameters(format!(
                "k = {} must exceed 1; raise the total weight or lower the tail weight",
                k
            ))
            .into());
        }

        let per_sample = (1.0 - 1.0 / k).ln() / 0.5f64.ln();
        let m = (self.lambda as f64 / per_sample).ceil();
        if !m.is_finite() || m < 1.0 || m > u64::MAX as f64 {
            return Err(Error::invalid_parameters(format!(
                "sample count {} is not representable for k = {}",
                m, k
            ))
            .into());
        }

        Ok(SamplePlan {
            weight_fraction,
            k,
            sample_count: m as u64,
        })
    }
}

/// Sampling quantities derived from [`SecurityParams`] and a total weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplePlan {
    /// `w = L / n`.
    pub weight_fraction: f64,
    /// `k = log_c(w)`.
    pub k: f64,
    /// Number of weighted samples `m`.
    pub sample_count: u64,
}
