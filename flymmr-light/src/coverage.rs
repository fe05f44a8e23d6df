//! Block coverage of the tree's leaves.
//!
//! Leaves do not carry block numbers, so the prover records the span of
//! blocks each leaf covers to answer "which leaf proves block N".

use std::fs;
use std::path::Path;

use flymmr_core::{write_atomic, Error, Result as CoreResult};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SamplingError};

/// Consecutive blocks covered by one leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSpan {
    /// First covered block.
    pub first_block: u64,
    /// Number of covered blocks.
    pub block_count: u64,
}

impl BlockSpan {
    /// Last covered block.
    pub fn last_block(&self) -> u64 {
        self.first_block + (self.block_count - 1)
    }

    /// Whether the span covers `block`.
    pub fn contains(&self, block: u64) -> bool {
        block >= self.first_block && block <= self.last_block()
    }
}

/// Block spans of consecutive leaves, strictly ascending and non-overlapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageIndex {
    first_leaf: u64,
    spans: Vec<BlockSpan>,
}

impl CoverageIndex {
    /// Create an empty index starting at leaf 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index whose first recorded span belongs to `first_leaf`.
    ///
    /// Leaves before `first_leaf` are treated as covering no known blocks.
    pub fn starting_at(first_leaf: u64) -> Self {
        Self {
            first_leaf,
            spans: Vec::new(),
        }
    }

    /// Index of the first leaf with a recorded span.
    pub fn first_leaf(&self) -> u64 {
        self.first_leaf
    }

    /// Index the next recorded span will be assigned to.
    pub fn next_leaf(&self) -> u64 {
        self.first_leaf + self.spans.len() as u64
    }

    /// Number of recorded spans.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether no span is recorded.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Last covered block, if any.
    pub fn covered_until(&self) -> Option<u64> {
        self.spans.last().map(BlockSpan::last_block)
    }

    /// Span of a leaf.
    pub fn span(&self, leaf_index: u64) -> Option<&BlockSpan> {
        let offset = leaf_index.checked_sub(self.first_leaf)?;
        self.spans.get(usize::try_from(offset).ok()?)
    }

    /// Check that a span can be recorded next.
    pub fn check(&self, first_block: u64, block_count: u64) -> Result<()> {
        if block_count == 0 {
            return Err(Error::malformed_leaf("span covers no blocks").into());
        }
        if first_block.checked_add(block_count - 1).is_none() {
            return Err(Error::malformed_leaf(format!(
                "span {}+{} overflows the block number range",
                first_block, block_count
            ))
            .into());
        }
        if let Some(covered_until) = self.covered_until() {
            if first_block <= covered_until {
                return Err(SamplingError::CoverageOrder {
                    first_block,
                    block_count,
                    covered_until,
                });
            }
        }
        Ok(())
    }

    /// Record the span of the next leaf and return that leaf's index.
    pub fn push(&mut self, first_block: u64, block_count: u64) -> Result<u64> {
        self.check(first_block, block_count)?;
        let leaf_index = self.next_leaf();
        self.spans.push(BlockSpan {
            first_block,
            block_count,
        });
        Ok(leaf_index)
    }

    /// Index of the leaf covering `block`.
    pub fn leaf_for_block(&self, block: u64) -> CoreResult<u64> {
        let candidate = self.spans.partition_point(|s| s.first_block <= block);
        match candidate.checked_sub(1) {
            Some(i) if self.spans[i].contains(block) => Ok(self.first_leaf + i as u64),
            _ => Err(Error::not_covered(block)),
        }
    }

    /// Write the index to `path` atomically.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let bytes = serde_json::to_vec(self)?;
        write_atomic(path, &bytes)
    }

    /// Read an index from `path`.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let bytes = fs::read(path)?;
        let index: CoverageIndex = serde_json::from_slice(&bytes)?;
        if index
            .spans
            .iter()
            .any(|s| s.block_count == 0 || s.first_block.checked_add(s.block_count - 1).is_none())
        {
            return Err(Error::corrupt_state("coverage span is empty or out of range"));
        }
        if index
            .spans
            .windows(2)
            .any(|pair| pair[1].first_block <= pair[0].last_block())
        {
            return Err(Error::corrupt_state("coverage spans are not ascending"));
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flymmr_core::ErrorCode;

    fn index() -> CoverageIndex {
        let mut index = CoverageIndex::new();
        index.push(0, 4).unwrap();
        index.push(4, 4).unwrap();
        index.push(10, 2).unwrap();
        index
    }

    #[test]
    fn test_leaf_for_block() {
        let index = index();
        assert_eq!(index.leaf_for_block(0).unwrap(), 0);
        assert_eq!(index.leaf_for_block(3).unwrap(), 0);
        assert_eq!(index.leaf_for_block(4).unwrap(), 1);
        assert_eq!(index.leaf_for_block(11).unwrap(), 2);
    }

    #[test]
    fn test_uncovered_blocks() {
        let index = index();
        for block in [8, 9, 12, u64::MAX] {
            let err = index.leaf_for_block(block).unwrap_err();
            assert_eq!(err.code(), ErrorCode::BlockNotCovered);
        }
        assert!(CoverageIndex::new().leaf_for_block(0).is_err());
    }

    #[test]
    fn test_rejects_overlap() {
        let mut index = index();
        assert!(matches!(
            index.push(11, 3),
            Err(SamplingError::CoverageOrder { covered_until: 11, .. })
        ));
        assert!(index.push(12, 0).is_err());
        assert_eq!(index.push(12, 1).unwrap(), 3);
    }

    #[test]
    fn test_starting_at_offsets_leaves() {
        let mut index = CoverageIndex::starting_at(5);
        assert_eq!(index.push(100, 10).unwrap(), 5);
        assert_eq!(index.leaf_for_block(105).unwrap(), 5);
        assert_eq!(index.span(5).unwrap().last_block(), 109);
        assert!(index.span(4).is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverage.json");
        let index = index();
        index.save(&path).unwrap();
        assert_eq!(CoverageIndex::load(&path).unwrap(), index);
    }

    #[test]
    fn test_save_failure_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone").join("coverage.json");

        let err = index().save(&path).unwrap_err();
        assert_eq!(err.code(), ErrorCode::StorageWrite);

        let err = CoverageIndex::load(&path).unwrap_err();
        assert_eq!(err.code(), ErrorCode::StorageRead);
    }

    #[test]
    fn test_load_rejects_overlapping_spans() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverage.json");
        fs::write(
            &path,
            r#"{"firstLeaf":0,"spans":[{"firstBlock":0,"blockCount":4},{"firstBlock":2,"blockCount":1}]}"#,
        )
        .unwrap();
        let err = CoverageIndex::load(&path).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CorruptState);
    }
}
