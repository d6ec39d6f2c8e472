use std::ops::Deref;

use crate::error::BlockError;

/// A run of row indices resampled as one unit.
///
/// Generated blocks are contiguous, possibly wrapping past the last row back
/// to row 0. Blocks built from caller-supplied index lists are validated by
/// [`BlockPartition::from_indices`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    indices: Vec<usize>,
}

impl Block {
    /// Contiguous block `[start, start + len)` with no wrap-around.
    pub(crate) fn contiguous(start: usize, len: usize) -> Self {
        Self {
            indices: (start..start + len).collect(),
        }
    }

    /// Block of `len` consecutive indices modulo `n`, starting at `start`.
    pub(crate) fn circular(start: usize, len: usize, n: usize) -> Self {
        debug_assert!(len <= n);
        Self {
            indices: (0..len).map(|k| (start + k) % n).collect(),
        }
    }

    /// Extend a block by `extra` indices, modulo `n`.
    pub(crate) fn extend(&mut self, extra: usize, n: usize) {
        let next = self.indices.last().map_or(0, |&i| i + 1);
        self.indices.extend((0..extra).map(|k| (next + k) % n));
    }

    /// Indices of the block, in order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the block is empty. Generated blocks never are.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// First index.
    pub fn start(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    /// Whether the block crosses from the last row back to row 0.
    pub fn wraps(&self) -> bool {
        self.indices.windows(2).any(|w| w[1] < w[0])
    }
}

impl From<Block> for Vec<usize> {
    fn from(block: Block) -> Self {
        block.indices
    }
}

/// Ordered list of blocks produced for a series of `input_length` rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockPartition {
    blocks: Vec<Block>,
    input_length: usize,
}

impl BlockPartition {
    pub(crate) fn new(blocks: Vec<Block>, input_length: usize) -> Self {
        Self {
            blocks,
            input_length,
        }
    }

    /// Build a partition from caller-supplied index arrays.
    ///
    /// # Errors
    /// [`BlockError::EmptyPartition`] for an empty list,
    /// [`BlockError::EmptyBlock`] for a block with no indices and
    /// [`BlockError::IndexOutOfRange`] for an index `>= input_length`.
    pub fn from_indices(blocks: Vec<Vec<usize>>, input_length: usize) -> Result<Self, BlockError> {
        let partition = Self::new(
            blocks.into_iter().map(|indices| Block { indices }).collect(),
            input_length,
        );
        partition.validate()?;
        Ok(partition)
    }

    /// Check that the partition is non-empty and every block is non-empty
    /// and in range.
    pub fn validate(&self) -> Result<(), BlockError> {
        if self.blocks.is_empty() {
            return Err(BlockError::EmptyPartition);
        }
        for (b, block) in self.blocks.iter().enumerate() {
            if block.is_empty() {
                return Err(BlockError::EmptyBlock { block: b });
            }
            if let Some(&index) = block.indices.iter().find(|&&i| i >= self.input_length) {
                return Err(BlockError::IndexOutOfRange {
                    block: b,
                    index,
                    len: self.input_length,
                });
            }
        }
        Ok(())
    }

    /// Number of rows the partition was built for.
    pub fn input_length(&self) -> usize {
        self.input_length
    }

    /// The blocks, in generation order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// How many blocks cover each row.
    pub fn coverage(&self) -> Vec<usize> {
        let mut counts = vec![0; self.input_length];
        for &i in self.blocks.iter().flat_map(Block::indices) {
            if let Some(c) = counts.get_mut(i) {
                *c += 1;
            }
        }
        counts
    }

    /// Whether every row is covered exactly once.
    pub fn is_exact_cover(&self) -> bool {
        self.coverage().iter().all(|&c| c == 1)
    }

    /// Whether every row is covered at least once.
    pub fn covers_all(&self) -> bool {
        self.coverage().iter().all(|&c| c >= 1)
    }

    /// Consume the partition and return the raw index arrays.
    pub fn into_indices(self) -> Vec<Vec<usize>> {
        self.blocks.into_iter().map(Vec::from).collect()
    }
}

impl Deref for BlockPartition {
    type Target = [Block];

    fn deref(&self) -> &Self::Target {
        &self.blocks
    }
}
