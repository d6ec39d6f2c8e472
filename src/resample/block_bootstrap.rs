use num_traits::Float;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Re;
use super::block::BlockPartition;
use super::generator::{BlockGenerator, GeneratorOptions};
use super::length::{BlockLengthDistribution, BlockLengthSampler};
use super::resampler::{BlockResampler, Resample};
use super::weights::{TaperSource, TaperWindow, WeightSource};
use crate::error::BlockError;
use crate::series::Series;

/// Named block layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockScheme {
    /// Fixed-length blocks tiling the series once (Carlstein).
    #[default]
    NonOverlapping,
    /// Fixed-length blocks starting at every row (Künsch).
    Moving,
    /// Geometric block lengths over overlapping starts (Politis & Romano).
    Stationary,
    /// Fixed-length blocks wrapping past the end (Politis & Romano).
    Circular,
}

impl BlockScheme {
    fn apply(self, config: &mut BlockBootstrapConfig) {
        let (overlap, wrap_around, distribution) = match self {
            Self::NonOverlapping => (false, false, BlockLengthDistribution::None),
            Self::Moving => (true, false, BlockLengthDistribution::None),
            Self::Stationary => (true, false, BlockLengthDistribution::Geometric),
            Self::Circular => (true, true, BlockLengthDistribution::None),
        };
        config.overlap = overlap;
        config.wrap_around = wrap_around;
        config.distribution = distribution;
    }
}

/// Serializable settings of a [`BlockBootstrap`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockBootstrapConfig {
    /// Number of draws yielded by [`BlockBootstrap::re`].
    pub n_bootstraps: usize,
    /// Average block length; `round(sqrt(N))` when unset.
    pub block_length: Option<usize>,
    /// Family block lengths are drawn from.
    pub distribution: BlockLengthDistribution,
    /// Let blocks run past the last row back to row 0.
    pub wrap_around: bool,
    /// Let consecutive blocks share rows.
    pub overlap: bool,
    /// Distance between overlapping block starts.
    pub overlap_length: usize,
    /// Shortest generated block.
    pub min_block_length: usize,
    /// Regenerate the partition before every draw instead of reusing it.
    pub combine_generation_and_sampling: bool,
    /// Window tapering the rows inside each block.
    pub taper_window: Option<TaperWindow>,
}

impl Default for BlockBootstrapConfig {
    fn default() -> Self {
        Self {
            n_bootstraps: 10,
            block_length: None,
            distribution: BlockLengthDistribution::None,
            wrap_around: false,
            overlap: false,
            overlap_length: 1,
            min_block_length: 1,
            combine_generation_and_sampling: false,
            taper_window: None,
        }
    }
}

impl BlockBootstrapConfig {
    /// Checks that do not depend on the series length.
    pub fn validate(&self) -> Result<(), BlockError> {
        if self.n_bootstraps == 0 {
            return Err(BlockError::config("n_bootstraps must be >= 1"));
        }
        if self.block_length == Some(0) {
            return Err(BlockError::config("block_length must be >= 1"));
        }
        if self.overlap_length == 0 {
            return Err(BlockError::config("overlap_length must be >= 1"));
        }
        if self.min_block_length == 0 {
            return Err(BlockError::config("min_block_length must be >= 1"));
        }
        if let Some(window) = &self.taper_window {
            window.validate()?;
        }
        Ok(())
    }

    /// Average block length used for a series of `n` rows.
    pub fn block_length_for(&self, n: usize) -> usize {
        self.block_length
            .unwrap_or_else(|| ((n as f64).sqrt().round() as usize).max(1))
    }

    /// Block generator for a series of `n` rows.
    pub fn generator(&self, n: usize) -> Result<BlockGenerator, BlockError> {
        let sampler = BlockLengthSampler::new(self.distribution, self.block_length_for(n))?;
        BlockGenerator::new(
            sampler,
            n,
            GeneratorOptions {
                wrap_around: self.wrap_around,
                overlap_length: self.overlap_length,
                min_block_length: self.min_block_length,
            },
        )
    }
}

/// Builder for [`BlockBootstrap`].
#[derive(Clone, Debug)]
pub struct BlockBootstrapBuilder<R: Rng> {
    rng: R,
    config: BlockBootstrapConfig,
    block_weights: WeightSource,
    tapered_weights: Option<TaperSource>,
}

impl<R: Rng> BlockBootstrapBuilder<R> {
    /// Builder with default settings around `rng`.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            config: BlockBootstrapConfig::default(),
            block_weights: WeightSource::Uniform,
            tapered_weights: None,
        }
    }

    /// Replace every serializable setting at once.
    pub fn with_config(mut self, config: BlockBootstrapConfig) -> Self {
        self.config = config;
        self
    }

    /// Set overlap, wrap-around and the length family from a preset.
    pub fn with_scheme(mut self, scheme: BlockScheme) -> Self {
        scheme.apply(&mut self.config);
        self
    }

    /// Number of draws per [`BlockBootstrap::re`] call.
    pub fn with_n_bootstraps(mut self, n_bootstraps: usize) -> Self {
        self.config.n_bootstraps = n_bootstraps;
        self
    }

    /// Average block length.
    pub fn with_block_length(mut self, block_length: usize) -> Self {
        self.config.block_length = Some(block_length);
        self
    }

    /// Block length family.
    pub fn with_distribution(mut self, distribution: BlockLengthDistribution) -> Self {
        self.config.distribution = distribution;
        self
    }

    /// Allow blocks to wrap past the end.
    pub fn with_wrap_around(mut self, wrap_around: bool) -> Self {
        self.config.wrap_around = wrap_around;
        self
    }

    /// Allow consecutive blocks to share rows.
    pub fn with_overlap(mut self, overlap: bool) -> Self {
        self.config.overlap = overlap;
        self
    }

    /// Distance between overlapping block starts.
    pub fn with_overlap_length(mut self, overlap_length: usize) -> Self {
        self.config.overlap_length = overlap_length;
        self
    }

    /// Shortest generated block.
    pub fn with_min_block_length(mut self, min_block_length: usize) -> Self {
        self.config.min_block_length = min_block_length;
        self
    }

    /// Regenerate the partition before every draw.
    pub fn with_combine_generation_and_sampling(mut self, combine: bool) -> Self {
        self.config.combine_generation_and_sampling = combine;
        self
    }

    /// Block-selection weights.
    pub fn with_block_weights(mut self, block_weights: WeightSource) -> Self {
        self.block_weights = block_weights;
        self
    }

    /// Taper each block with a standard window.
    pub fn with_taper_window(mut self, window: TaperWindow) -> Self {
        self.config.taper_window = Some(window);
        self
    }

    /// Custom tapering; takes precedence over any configured window.
    pub fn with_tapered_weights(mut self, tapered_weights: TaperSource) -> Self {
        self.tapered_weights = Some(tapered_weights);
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    /// Configuration errors from [`BlockBootstrapConfig::validate`].
    pub fn build(self) -> Result<BlockBootstrap<R>, BlockError> {
        self.config.validate()?;
        let taper = self
            .tapered_weights
            .or_else(|| self.config.taper_window.map(TaperSource::Window));
        Ok(BlockBootstrap {
            rng: self.rng,
            config: self.config,
            block_weights: self.block_weights,
            taper,
        })
    }
}

/// Block bootstrap over the rows of a [`Series`].
///
/// ```
/// use blockstrap::{BlockBootstrap, BlockScheme, Re, Series};
/// use rand::SeedableRng;
///
/// let series: Series<f64> = (0..100).map(f64::from).collect();
/// let boot = BlockBootstrap::builder(rand::rngs::StdRng::seed_from_u64(7))
///     .with_scheme(BlockScheme::Circular)
///     .with_block_length(8)
///     .with_n_bootstraps(5)
///     .build()?;
///
/// for draw in boot.re(&series) {
///     assert_eq!(draw?.concat_indices().len(), 100);
/// }
/// # Ok::<(), blockstrap::BlockError>(())
/// ```
#[derive(Clone, Debug)]
pub struct BlockBootstrap<R: Rng> {
    /// Stream consumed by [`partition`](Self::partition) and [`sample`](Self::sample).
    pub rng: R,
    config: BlockBootstrapConfig,
    block_weights: WeightSource,
    taper: Option<TaperSource>,
}

impl<R: Rng> BlockBootstrap<R> {
    /// Non-overlapping fixed blocks with default settings.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            config: BlockBootstrapConfig::default(),
            block_weights: WeightSource::Uniform,
            taper: None,
        }
    }

    /// Start a [`BlockBootstrapBuilder`].
    pub fn builder(rng: R) -> BlockBootstrapBuilder<R> {
        BlockBootstrapBuilder::new(rng)
    }

    /// Moving block bootstrap with `window` tapering inside each block.
    pub fn tapered(rng: R, window: TaperWindow) -> BlockBootstrapBuilder<R> {
        BlockBootstrapBuilder::new(rng)
            .with_scheme(BlockScheme::Moving)
            .with_taper_window(window)
    }

    /// The validated settings.
    pub fn config(&self) -> &BlockBootstrapConfig {
        &self.config
    }

    /// Generate one partition for `n` rows with the owned stream.
    pub fn partition(&mut self, n: usize) -> Result<BlockPartition, BlockError> {
        let generator = self.config.generator(n)?;
        Ok(generator.generate_blocks(self.config.overlap, &mut self.rng))
    }

    /// One fresh partition and one draw with the owned stream.
    ///
    /// The stream only advances when the draw succeeds.
    #[tracing::instrument(skip_all, fields(n = series.len()))]
    pub fn sample<F: Float>(&mut self, series: &Series<F>) -> Result<Resample<F>, BlockError>
    where
        R: Clone,
    {
        let generator = self.config.generator(series.len())?;
        let mut rng = self.rng.clone();
        let resampler = self.resampler(&generator, series, &mut rng)?;
        let draw = resampler.resample_block_indices_and_data(&mut rng);
        self.rng = rng;
        Ok(draw)
    }

    /// Iterator over `n_bootstraps` draws, starting from a copy of the owned
    /// stream.
    pub fn iter<'a, 'b, F: Float>(
        &'a self,
        series: &'b Series<F>,
    ) -> BlockBootstrapIter<'a, 'b, F, R>
    where
        R: Clone,
    {
        BlockBootstrapIter::new(self, series, self.rng.clone())
    }

    fn resampler<F: Float, S: Rng + ?Sized>(
        &self,
        generator: &BlockGenerator,
        series: &Series<F>,
        rng: &mut S,
    ) -> Result<BlockResampler<F>, BlockError> {
        let partition = generator.generate_blocks(self.config.overlap, rng);
        BlockResampler::new(partition, series, &self.block_weights, self.taper.as_ref())
    }
}

impl<F: Float, R: Rng + Clone> Re<Series<F>> for BlockBootstrap<R> {
    type Item = Result<Resample<F>, BlockError>;

    fn re(&self, series: &Series<F>) -> impl Iterator<Item = Self::Item> {
        self.iter(series)
    }
}

/// Iterator returned by [`BlockBootstrap::iter`] and [`BlockBootstrap::re`].
///
/// Yields `n_bootstraps` draws. The partition and resampler are built on the
/// first call and reused unless generation and sampling are combined. An
/// error is yielded once and ends the iteration.
pub struct BlockBootstrapIter<'a, 'b, F, R: Rng> {
    bootstrap: &'a BlockBootstrap<R>,
    series: &'b Series<F>,
    rng: R,
    generator: Result<BlockGenerator, BlockError>,
    cached: Option<BlockResampler<F>>,
    remaining: usize,
}

impl<'a, 'b, F: Float, R: Rng> BlockBootstrapIter<'a, 'b, F, R> {
    fn new(bootstrap: &'a BlockBootstrap<R>, series: &'b Series<F>, rng: R) -> Self {
        Self {
            generator: bootstrap.config.generator(series.len()),
            remaining: bootstrap.config.n_bootstraps,
            cached: None,
            bootstrap,
            series,
            rng,
        }
    }

    /// Partition behind the most recent draw.
    pub fn current_partition(&self) -> Option<&BlockPartition> {
        self.cached.as_ref().map(BlockResampler::partition)
    }

    fn step(&mut self) -> Result<Resample<F>, BlockError> {
        let resampler = match self.cached.take() {
            Some(r) if !self.bootstrap.config.combine_generation_and_sampling => r,
            _ => {
                let generator = self.generator.as_ref().map_err(Clone::clone)?;
                debug!("regenerating block partition");
                self.bootstrap.resampler(generator, self.series, &mut self.rng)?
            }
        };
        let draw = resampler.resample_block_indices_and_data(&mut self.rng);
        self.cached = Some(resampler);
        Ok(draw)
    }
}

impl<F: Float, R: Rng> Iterator for BlockBootstrapIter<'_, '_, F, R> {
    type Item = Result<Resample<F>, BlockError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let item = self.step();
        if item.is_err() {
            self.remaining = 0;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining.min(1), Some(self.remaining))
    }
}

#[cfg(feature = "rayon")]
const GOLDEN_RATIO_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seed of the child stream for iteration `index`.
#[cfg(feature = "rayon")]
fn mix_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_mul(GOLDEN_RATIO_SEED_MIX)
        .wrapping_add(index as u64)
        .rotate_left(17)
}

#[cfg(feature = "rayon")]
impl<R: Rng + rand::SeedableRng> BlockBootstrap<R> {
    /// Run all iterations in parallel.
    ///
    /// The shared partition comes from `R::seed_from_u64(seed)` and draw `i`
    /// from its own stream seeded with a mix of `seed` and `i`, so the
    /// output depends only on `seed`, never on the thread count.
    #[tracing::instrument(
        skip_all,
        fields(n = series.len(), n_bootstraps = self.config.n_bootstraps)
    )]
    pub fn par_resamples<F>(
        &self,
        series: &Series<F>,
        seed: u64,
    ) -> Result<Vec<Resample<F>>, BlockError>
    where
        F: Float + Send + Sync,
    {
        use rayon::prelude::*;

        let generator = self.config.generator(series.len())?;
        let shared = if self.config.combine_generation_and_sampling {
            None
        } else {
            Some(self.resampler(&generator, series, &mut R::seed_from_u64(seed))?)
        };
        let weights = &self.block_weights;
        let taper = self.taper.as_ref();
        let overlap = self.config.overlap;

        (0..self.config.n_bootstraps)
            .into_par_iter()
            .map(|i| -> Result<Resample<F>, BlockError> {
                let mut rng = R::seed_from_u64(mix_seed(seed, i));
                if let Some(shared) = &shared {
                    return Ok(shared.resample_block_indices_and_data(&mut rng));
                }
                let partition = generator.generate_blocks(overlap, &mut rng);
                let fresh = BlockResampler::new(partition, series, weights, taper)?;
                Ok(fresh.resample_block_indices_and_data(&mut rng))
            })
            .collect()
    }
}
