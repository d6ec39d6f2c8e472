pub use rand::Rng;

/// Resampling scheme that turns one input into a stream of resamples.
pub trait Re<T> {
    type Item;
    fn re(&self, t: &T) -> impl Iterator<Item = Self::Item>;
}

mod block;
mod length;
mod weights;
mod generator;
mod resampler;
mod block_bootstrap;

pub use block::{Block, BlockPartition};
pub use length::{BlockLengthDistribution, BlockLengthSampler};
pub use weights::{TAPER_FLOOR, TaperSource, TaperWindow, WeightFn, WeightSource};
pub use generator::{BlockGenerator, GeneratorOptions};
pub use resampler::{BlockResampler, Resample};
pub use block_bootstrap::{
    BlockBootstrap, BlockBootstrapBuilder, BlockBootstrapConfig, BlockBootstrapIter, BlockScheme,
};
