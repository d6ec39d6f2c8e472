use rand::Rng;
use tracing::debug;

use super::block::{Block, BlockPartition};
use super::length::BlockLengthSampler;
use crate::error::BlockError;

/// Layout options for [`BlockGenerator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Let blocks continue past the last row back to row 0.
    pub wrap_around: bool,
    /// Distance between consecutive block starts when blocks overlap.
    pub overlap_length: usize,
    /// Shortest block the generator may emit.
    pub min_block_length: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            wrap_around: false,
            overlap_length: 1,
            min_block_length: 1,
        }
    }
}

/// Carves `[0, N)` into blocks whose lengths come from a
/// [`BlockLengthSampler`].
///
/// Trailing segments shorter than the smallest length the sampler can draw
/// are folded into the preceding block, so no generated block is shorter
/// than `min_block_length` and a fixed-length sampler never yields a stub.
#[derive(Clone, Debug)]
pub struct BlockGenerator {
    sampler: BlockLengthSampler,
    input_length: usize,
    options: GeneratorOptions,
}

impl BlockGenerator {
    /// Build a generator for a series of `input_length` rows.
    ///
    /// # Errors
    /// Configuration errors if `input_length` is zero, `overlap_length` or
    /// `min_block_length` is zero, or the average or minimum block length
    /// exceeds `input_length`.
    pub fn new(
        sampler: BlockLengthSampler,
        input_length: usize,
        options: GeneratorOptions,
    ) -> Result<Self, BlockError> {
        if input_length == 0 {
            return Err(BlockError::config("input_length must be >= 1"));
        }
        if options.overlap_length == 0 {
            return Err(BlockError::config("overlap_length must be >= 1"));
        }
        if options.min_block_length > input_length {
            return Err(BlockError::InvalidLength {
                field: "min_block_length",
                value: options.min_block_length,
                limit: input_length,
            });
        }
        if sampler.avg_block_length() > input_length {
            return Err(BlockError::InvalidLength {
                field: "avg_block_length",
                value: sampler.avg_block_length(),
                limit: input_length,
            });
        }
        let sampler = sampler.with_min_block_length(options.min_block_length)?;
        Ok(Self {
            sampler,
            input_length,
            options,
        })
    }

    /// Number of rows being partitioned.
    pub fn input_length(&self) -> usize {
        self.input_length
    }

    /// The layout options.
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// The length sampler, with the generator's floor applied.
    pub fn sampler(&self) -> &BlockLengthSampler {
        &self.sampler
    }

    /// Generate one partition.
    ///
    /// Without overlap the blocks tile the index range exactly once. With
    /// overlap, consecutive blocks start `min(overlap_length, len)` apart and
    /// every index is covered at least once.
    #[tracing::instrument(
        skip_all,
        fields(n = self.input_length, overlap = overlap, wrap = self.options.wrap_around)
    )]
    pub fn generate_blocks<R: Rng + ?Sized>(&self, overlap: bool, rng: &mut R) -> BlockPartition {
        let blocks = match (overlap, self.options.wrap_around) {
            (false, wrap) => self.tile(wrap, rng),
            (true, false) => self.overlapping(rng),
            (true, true) => self.circular(rng),
        };
        debug!(n_blocks = blocks.len(), "generated block partition");
        BlockPartition::new(blocks, self.input_length)
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.sampler.sample_block_length(rng).min(self.input_length)
    }

    fn tile<R: Rng + ?Sized>(&self, wrap: bool, rng: &mut R) -> Vec<Block> {
        let n = self.input_length;
        let tail = self.sampler.smallest_length();
        let offset = if wrap { rng.gen_range(0..n) } else { 0 };

        let mut blocks = Vec::new();
        let mut covered = 0;
        while covered < n {
            let remaining = n - covered;
            let mut len = self.draw(rng).min(remaining);
            let left = remaining - len;
            if left > 0 && left < tail {
                len += left;
            }
            blocks.push(if wrap {
                Block::circular((offset + covered) % n, len, n)
            } else {
                Block::contiguous(covered, len)
            });
            covered += len;
        }
        blocks
    }

    fn overlapping<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Block> {
        let n = self.input_length;
        let tail = self.sampler.smallest_length();

        let mut blocks: Vec<Block> = Vec::new();
        let mut start = 0;
        loop {
            let len = self.draw(rng);
            if start + len < n {
                blocks.push(Block::contiguous(start, len));
                start += self.options.overlap_length.min(len);
                continue;
            }
            let last = n - start;
            match blocks.last_mut() {
                Some(prev) if last < tail => {
                    let prev_end = prev.indices().last().map_or(0, |&i| i + 1);
                    prev.extend(n - prev_end, n);
                }
                _ => blocks.push(Block::contiguous(start, last)),
            }
            return blocks;
        }
    }

    fn circular<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Block> {
        let n = self.input_length;
        let mut blocks = Vec::new();
        let mut start = 0;
        while start < n {
            let len = self.draw(rng);
            blocks.push(Block::circular(start, len, n));
            start += self.options.overlap_length.min(len);
        }
        blocks
    }
}
