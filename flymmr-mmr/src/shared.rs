//! Shared, lock-protected access to a tree.
//!
//! Appends remove provisional nodes that a concurrent proof walk could be
//! reading, so every mutation takes the write lock and every read takes the
//! read lock. Long read sequences (a sampling run) should work on a
//! [`SharedMmr::snapshot`] instead of holding the lock.
//!
//! The owner of a [`SharedMmr`] hands out [`MmrReader`]s to components that
//! may look at the tree but must not grow it.

use std::sync::Arc;

use flymmr_core::{Error, Node, NodeTuple, Result};
use parking_lot::RwLock;

use crate::mmr::DifficultyMmr;
use crate::proof::LeafProof;

/// A difficulty MMR behind a reader-writer lock.
#[derive(Debug, Clone, Default)]
pub struct SharedMmr {
    inner: Arc<RwLock<DifficultyMmr>>,
}

impl SharedMmr {
    /// Wrap a tree.
    pub fn new(mmr: DifficultyMmr) -> Self {
        Self {
            inner: Arc::new(RwLock::new(mmr)),
        }
    }

    /// Append a leaf under the write lock.
    pub fn append(&self, leaf: Node) -> Result<u64> {
        self.inner.write().append(leaf)
    }

    /// Append a leaf only if the tree currently holds `expected_index`
    /// leaves; the check and the append happen under one write lock.
    pub fn append_at(&self, expected_index: u64, leaf: Node) -> Result<u64> {
        let mut tree = self.inner.write();
        if tree.leaf_count() != expected_index {
            return Err(Error::internal(format!(
                "expected to append leaf {} but the tree holds {} leaves",
                expected_index,
                tree.leaf_count()
            )));
        }
        tree.append(leaf)
    }

    /// Append several leaves under one write lock.
    pub fn append_batch(&self, leaves: Vec<Node>) -> Result<Vec<u64>> {
        self.inner.write().append_batch(leaves)
    }

    /// Clone a consistent copy of the tree.
    pub fn snapshot(&self) -> DifficultyMmr {
        self.inner.read().clone()
    }

    /// Run `f` with shared access to the tree.
    pub fn read<R>(&self, f: impl FnOnce(&DifficultyMmr) -> R) -> R {
        f(&self.inner.read())
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> u64 {
        self.inner.read().leaf_count()
    }

    /// The current root.
    pub fn root(&self) -> Result<Node> {
        self.inner.read().root().cloned()
    }

    /// The current root as a canonical tuple.
    pub fn root_tuple(&self) -> Result<NodeTuple> {
        self.inner.read().root_tuple()
    }

    /// Generate a proof under the read lock.
    pub fn proof(&self, leaf_index: u64) -> Result<LeafProof> {
        self.inner.read().proof(leaf_index)
    }

    /// A read-only handle to the same tree.
    pub fn reader(&self) -> MmrReader {
        MmrReader {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Read-only handle to a [`SharedMmr`]; observes appends but cannot make them.
#[derive(Debug, Clone)]
pub struct MmrReader {
    inner: Arc<RwLock<DifficultyMmr>>,
}

impl MmrReader {
    /// Clone a consistent copy of the tree.
    pub fn snapshot(&self) -> DifficultyMmr {
        self.inner.read().clone()
    }

    /// Run `f` with shared access to the tree.
    pub fn read<R>(&self, f: impl FnOnce(&DifficultyMmr) -> R) -> R {
        f(&self.inner.read())
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> u64 {
        self.inner.read().leaf_count()
    }

    /// The current root.
    pub fn root(&self) -> Result<Node> {
        self.inner.read().root().cloned()
    }

    /// The current root as a canonical tuple.
    pub fn root_tuple(&self) -> Result<NodeTuple> {
        self.inner.read().root_tuple()
    }

    /// Generate a proof under the read lock.
    pub fn proof(&self, leaf_index: u64) -> Result<LeafProof> {
        self.inner.read().proof(leaf_index)
    }
}

impl From<DifficultyMmr> for SharedMmr {
    fn from(mmr: DifficultyMmr) -> Self {
        Self::new(mmr)
    }
}
