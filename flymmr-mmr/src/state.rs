//! Persisted tree state.
//!
//! The state file is the JSON form of [`MmrState`]: every level as a list of
//! canonical node tuples, the cumulative weights and the pending (odd)
//! levels. A restored state is only accepted if replaying its leaves into a
//! fresh tree reproduces it exactly.

use std::fs;
use std::path::Path;

use flymmr_core::{write_atomic, Error, Node, NodeTuple, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::mmr::DifficultyMmr;

/// Serializable snapshot of a [`DifficultyMmr`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MmrState {
    /// All levels, leaves first.
    pub levels: Vec<Vec<NodeTuple>>,
    /// Running weight totals aligned with the leaves.
    pub cumulative_weight: Vec<u128>,
    /// Levels with an odd node count after the last append.
    pub pending_levels: Vec<usize>,
}

/// How [`DifficultyMmr::load_or_empty`] obtained its tree.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The state file was read and validated.
    Restored,
    /// No state file exists; the tree starts empty.
    Fresh,
    /// The state file could not be used and an empty tree was substituted.
    Recovered {
        /// Why the state file was rejected.
        error: Error,
    },
}

impl LoadOutcome {
    /// Whether persisted history was discarded.
    pub fn is_recovered(&self) -> bool {
        matches!(self, LoadOutcome::Recovered { .. })
    }
}

impl DifficultyMmr {
    /// Snapshot the tree in its serializable form.
    pub fn to_state(&self) -> MmrState {
        MmrState {
            levels: self
                .levels()
                .iter()
                .map(|level| level.iter().map(Node::to_canonical_tuple).collect())
                .collect(),
            cumulative_weight: self.cumulative_weights().to_vec(),
            pending_levels: self.odd_levels().to_vec(),
        }
    }

    /// Restore a tree from persisted state.
    ///
    /// The leaves are replayed into a fresh tree; any difference between the
    /// replayed tree and the stored levels, weights or pending table is
    /// reported as corrupt state.
    pub fn from_state(state: MmrState) -> Result<Self> {
        let leaves = state
            .levels
            .first()
            .ok_or_else(|| Error::corrupt_state("state has no leaf level"))?;

        let mut mmr = DifficultyMmr::new();
        mmr.append_batch(leaves.iter().copied().map(Node::from).collect())
            .map_err(|e| Error::corrupt_state(format!("stored leaves do not replay: {}", e)))?;

        let replayed = mmr.to_state();
        if replayed.levels != state.levels {
            return Err(Error::corrupt_state(format!(
                "stored levels differ from the replay of {} leaves",
                mmr.leaf_count()
            )));
        }
        if replayed.cumulative_weight != state.cumulative_weight {
            return Err(Error::corrupt_state("cumulative weights do not match leaves"));
        }
        if replayed.pending_levels != state.pending_levels {
            return Err(Error::corrupt_state(format!(
                "pending levels {:?} do not match {:?}",
                state.pending_levels, replayed.pending_levels
            )));
        }

        Ok(mmr)
    }

    /// Write the tree to `path` atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = serde_json::to_vec(&self.to_state())?;

        write_atomic(path, &bytes)?;

        info!(
            path = %path.display(),
            leaves = self.leaf_count(),
            bytes = bytes.len(),
            "saved tree state"
        );
        Ok(())
    }

    /// Read and validate a tree from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let state: MmrState = serde_json::from_slice(&bytes)?;
        Self::from_state(state)
    }

    /// Load the tree from `path`, falling back to an empty tree.
    ///
    /// A missing file yields [`LoadOutcome::Fresh`]. An unreadable or invalid
    /// file yields [`LoadOutcome::Recovered`] and a warning, since the stored
    /// history is lost.
    pub fn load_or_empty(path: impl AsRef<Path>) -> (Self, LoadOutcome) {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no tree state found, starting empty");
            return (DifficultyMmr::new(), LoadOutcome::Fresh);
        }

        match Self::load(path) {
            Ok(mmr) => {
                info!(
                    path = %path.display(),
                    leaves = mmr.leaf_count(),
                    "restored tree state"
                );
                (mmr, LoadOutcome::Restored)
            }
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "tree state rejected, starting from an empty tree"
                );
                (DifficultyMmr::new(), LoadOutcome::Recovered { error })
            }
        }
    }
}
