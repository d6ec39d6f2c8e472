use std::collections::BTreeSet;

use approx::assert_abs_diff_eq;
use blockstrap::{
    BlockGenerator, BlockLengthDistribution, BlockLengthSampler, BlockResampler, GeneratorOptions,
    Series, TaperSource, TaperWindow, WeightSource,
};
use itertools::Itertools;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn rng(seed: u64) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

fn generator(
    dist: BlockLengthDistribution,
    avg: usize,
    n: usize,
    options: GeneratorOptions,
) -> BlockGenerator {
    let sampler = BlockLengthSampler::new(dist, avg).unwrap();
    BlockGenerator::new(sampler, n, options).unwrap()
}

#[test]
fn test_tiling_is_disjoint_and_exhaustive() {
    let mut r = rng(100);
    for dist in BlockLengthDistribution::ALL {
        for n in [1, 2, 7, 31, 200] {
            for avg in [1, (n / 3).max(1), n] {
                let p = generator(dist, avg, n, GeneratorOptions::default())
                    .generate_blocks(false, &mut r);
                let all: Vec<usize> = p.iter().flat_map(|b| b.indices().iter().copied()).collect();
                assert_eq!(all.len(), n, "{dist} n={n} avg={avg}");
                assert_eq!(all.iter().copied().collect::<BTreeSet<_>>().len(), n);
                assert!(all.iter().tuple_windows().all(|(a, b)| b == &(a + 1)));
            }
        }
    }
}

#[test]
fn test_every_configuration_resamples_to_n_rows() {
    let mut r = rng(101);
    let n = 47;
    let rows = (0..n).map(|i| vec![i as f64, 2.0 * i as f64]).collect();
    let data = Series::from_rows(rows).unwrap();
    for dist in BlockLengthDistribution::ALL {
        for (overlap, wrap_around) in [(false, false), (false, true), (true, false), (true, true)] {
            for overlap_length in [1, 3] {
                let options = GeneratorOptions {
                    wrap_around,
                    overlap_length,
                    min_block_length: 2,
                };
                let p = generator(dist, 6, n, options).generate_blocks(overlap, &mut r);
                assert!(p.iter().all(|b| b.len() >= 2 && b.indices().iter().all(|&i| i < n)));
                assert!(p.covers_all());

                let taper = TaperSource::Window(TaperWindow::Hamming);
                let resampler =
                    BlockResampler::new(p, &data, &WeightSource::Uniform, Some(&taper)).unwrap();
                let draw = resampler.resample_block_indices_and_data(&mut r);
                assert_eq!(draw.concat_indices().len(), n);
                let stacked = draw.to_series().unwrap();
                assert_eq!(stacked.len(), n);
                assert_eq!(stacked.width(), 2);
            }
        }
    }
}

#[test]
fn test_wrapped_blocks_are_consecutive_mod_n() {
    let n = 23;
    let options = GeneratorOptions {
        wrap_around: true,
        ..GeneratorOptions::default()
    };
    let mut r = rng(102);
    for overlap in [false, true] {
        let p = generator(BlockLengthDistribution::Poisson, 5, n, options)
            .generate_blocks(overlap, &mut r);
        for block in p.iter() {
            assert!(block.indices().iter().tuple_windows().all(|(a, b)| *b == (a + 1) % n));
        }
    }
}

#[test]
fn test_identical_seeds_identical_output() {
    let data: Series<f64> = (0..80).map(f64::from).collect();
    let run = |seed| {
        let mut r = rng(seed);
        let p = generator(BlockLengthDistribution::Gamma, 6, 80, GeneratorOptions::default())
            .generate_blocks(true, &mut r);
        let resampler =
            BlockResampler::new(p.clone(), &data, &WeightSource::Uniform, None).unwrap();
        (p, resampler.resample_block_indices_and_data(&mut r))
    };
    assert_eq!(run(7), run(7));
}

#[test]
fn test_normalized_weights_and_floored_tapers() {
    let n = 30;
    let data: Series<f64> = (0..n).map(|i| i as f64).collect();
    let p = generator(BlockLengthDistribution::Exponential, 4, n, GeneratorOptions::default())
        .generate_blocks(false, &mut rng(103));
    let weights = WeightSource::from_fn(|n| (0..n).map(|i| (i % 5) as f64).collect());
    let taper = TaperSource::Window(TaperWindow::Blackman);
    let resampler = BlockResampler::new(p, &data, &weights, Some(&taper)).unwrap();
    let total: f64 = resampler.block_probabilities().iter().sum();
    assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
    assert!(resampler.taper_weights().iter().flatten().all(|&w| w >= 0.1));
}

#[test]
fn test_unit_blocks_are_singletons() {
    let n = 15;
    let p = generator(BlockLengthDistribution::None, 1, n, GeneratorOptions::default())
        .generate_blocks(false, &mut rng(0));
    assert_eq!(p.len(), n);
    assert!(p.iter().enumerate().all(|(i, b)| b.indices() == [i]));
}

#[test]
fn test_ten_rows_block_three_example() {
    let data: Series<f64> = (0..10).map(f64::from).collect();
    let p = generator(BlockLengthDistribution::None, 3, 10, GeneratorOptions::default())
        .generate_blocks(false, &mut rng(0));
    assert_eq!(p.clone().into_indices(), vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8, 9]]);

    let resampler = BlockResampler::new(p, &data, &WeightSource::Uniform, None).unwrap();
    let a = resampler.resample_block_indices_and_data(&mut rng(5));
    let b = resampler.resample_block_indices_and_data(&mut rng(5));
    assert_eq!(a, b);
    assert_eq!(a.concat_indices().len(), 10);
    let (indices, data) = a.into_parts();
    assert!(indices[..indices.len() - 1].iter().all(|b| b.len() >= 3));
    assert_eq!(data.iter().map(Series::len).sum::<usize>(), 10);
}
