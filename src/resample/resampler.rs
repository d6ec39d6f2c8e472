use num_traits::Float;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use tracing::{debug, trace};

use super::block::BlockPartition;
use super::weights::{TaperSource, WeightSource};
use crate::error::BlockError;
use crate::series::Series;

/// One bootstrap draw: the selected index runs and their tapered rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Resample<F> {
    indices: Vec<Vec<usize>>,
    data: Vec<Series<F>>,
}

impl<F: Float> Resample<F> {
    /// Index arrays of the drawn blocks, the last one possibly truncated.
    pub fn indices(&self) -> &[Vec<usize>] {
        &self.indices
    }

    /// Tapered rows of the drawn blocks, aligned with [`indices`](Self::indices).
    pub fn blocks(&self) -> &[Series<F>] {
        &self.data
    }

    /// All drawn indices, in order.
    pub fn concat_indices(&self) -> Vec<usize> {
        self.indices.concat()
    }

    /// All drawn rows stacked into one series.
    pub fn to_series(&self) -> Result<Series<F>, BlockError> {
        Series::concat(&self.data)
    }

    /// Split into index arrays and data blocks.
    pub fn into_parts(self) -> (Vec<Vec<usize>>, Vec<Series<F>>) {
        (self.indices, self.data)
    }
}

/// Draws blocks with replacement from a fixed partition and stitches them
/// into a sequence of the original length.
///
/// Weights and tapers are evaluated and validated once in [`new`](Self::new);
/// every draw afterwards only consumes the random stream.
#[derive(Clone, Debug)]
pub struct BlockResampler<F> {
    partition: BlockPartition,
    probabilities: Vec<f64>,
    selector: WeightedIndex<f64>,
    tapers: Vec<Vec<f64>>,
    tapered: Vec<Series<F>>,
}

impl<F: Float> BlockResampler<F> {
    /// Prepare a resampler for `series` over `partition`.
    ///
    /// # Errors
    /// Validation errors for an empty series or partition, blocks out of
    /// range, a row count that differs from the partition's input length,
    /// or invalid block-selection or tapering weights.
    #[tracing::instrument(skip_all, fields(n = series.len(), n_blocks = partition.len()))]
    pub fn new(
        partition: BlockPartition,
        series: &Series<F>,
        block_weights: &WeightSource,
        tapered_weights: Option<&TaperSource>,
    ) -> Result<Self, BlockError> {
        if series.is_empty() {
            return Err(BlockError::EmptySeries);
        }
        partition.validate()?;
        let n = partition.input_length();
        if series.len() != n {
            return Err(BlockError::LengthMismatch {
                field: "series rows",
                expected: n,
                got: series.len(),
            });
        }

        let block_scores: Vec<f64> = match block_weights.evaluate(n)? {
            None => vec![1.0; partition.len()],
            Some(positions) => partition
                .iter()
                .map(|b| {
                    b.indices().iter().map(|&i| positions[i]).sum::<f64>() / b.len() as f64
                })
                .collect(),
        };
        let total: f64 = block_scores.iter().sum();
        if total <= 0.0 {
            return Err(BlockError::AllZeroWeights {
                field: "block_weights",
            });
        }
        let probabilities: Vec<f64> = block_scores.iter().map(|w| w / total).collect();
        let selector = WeightedIndex::new(&probabilities).map_err(|_| BlockError::AllZeroWeights {
            field: "block_weights",
        })?;

        if let Some(TaperSource::PerBlock(all)) = tapered_weights {
            if all.len() != partition.len() {
                return Err(BlockError::LengthMismatch {
                    field: "tapered_weights blocks",
                    expected: partition.len(),
                    got: all.len(),
                });
            }
        }
        let tapers = partition
            .iter()
            .enumerate()
            .map(|(b, block)| match tapered_weights {
                Some(source) => source.evaluate(b, block.len()),
                None => Ok(vec![1.0; block.len()]),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let tapered = partition
            .iter()
            .zip(&tapers)
            .map(|(block, w)| series.gather_scaled(block.indices(), w))
            .collect();

        debug!(tapered = tapered_weights.is_some(), "block resampler ready");
        Ok(Self {
            partition,
            probabilities,
            selector,
            tapers,
            tapered,
        })
    }

    /// The partition blocks are drawn from.
    pub fn partition(&self) -> &BlockPartition {
        &self.partition
    }

    /// Selection probability of each block; sums to one.
    pub fn block_probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Tapering multipliers for each block, already floored.
    pub fn taper_weights(&self) -> &[Vec<f64>] {
        &self.tapers
    }

    /// Draw blocks with replacement until `N` rows are collected, truncating
    /// the last block so the result has exactly `N` rows.
    pub fn resample_block_indices_and_data<R: Rng + ?Sized>(&self, rng: &mut R) -> Resample<F> {
        let n = self.partition.input_length();
        let mut indices = Vec::new();
        let mut data = Vec::new();
        let mut total = 0;
        while total < n {
            let b = self.selector.sample(rng);
            let block = &self.partition[b];
            let take = block.len().min(n - total);
            let mut rows = self.tapered[b].clone();
            if take < block.len() {
                rows.truncate(take);
            }
            indices.push(block.indices()[..take].to_vec());
            data.push(rows);
            total += take;
        }
        trace!(n_drawn = indices.len(), "resampled blocks");
        Resample { indices, data }
    }
}
