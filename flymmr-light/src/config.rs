//! Prover configuration.

use std::fs;
use std::path::{Path, PathBuf};

use flymmr_core::DifficultyPolicy;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SamplingError};
use crate::params::SecurityParams;
use crate::size::ProofSizeModel;

/// Prover configuration, loadable from a camelCase JSON file.
///
/// ```json
/// {
///   "statePath": "data/mmr.json",
///   "difficultyPolicy": "strict",
///   "security": { "adversaryFraction": 0.3, "tailWeight": 30, "lambda": 50 }
/// }
/// ```
///
/// Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProverConfig {
    /// Where the tree state is persisted.
    pub state_path: PathBuf,
    /// How leaves without reported difficulty are weighted.
    pub difficulty_policy: DifficultyPolicy,
    /// Proof bandwidth model.
    pub size_model: ProofSizeModel,
    /// Sampling security parameters.
    pub security: SecurityParams,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("flymmr-state.json"),
            difficulty_policy: DifficultyPolicy::default(),
            size_model: ProofSizeModel::default(),
            security: SecurityParams::default(),
        }
    }
}

impl ProverConfig {
    /// Set the state path.
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }

    /// Set the difficulty policy.
    pub fn with_difficulty_policy(mut self, policy: DifficultyPolicy) -> Self {
        self.difficulty_policy = policy;
        self
    }

    /// Set the proof size model.
    pub fn with_size_model(mut self, model: ProofSizeModel) -> Self {
        self.size_model = model;
        self
    }

    /// Set the security parameters.
    pub fn with_security(mut self, security: SecurityParams) -> Self {
        self.security = security;
        self
    }

    /// Path of the coverage index saved next to the tree state.
    pub fn coverage_path(&self) -> PathBuf {
        self.state_path.with_extension("coverage.json")
    }

    /// Load and validate a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_error = |reason: String| SamplingError::Config {
            path: path.display().to_string(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| config_error(e.to_string()))?;
        let config: ProverConfig =
            serde_json::from_slice(&bytes).map_err(|e| config_error(e.to_string()))?;
        config.security.validate()?;
        Ok(config)
    }
}
