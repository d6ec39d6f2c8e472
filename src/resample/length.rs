use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::distributions::{Distribution, Uniform};
use rand_distr::{Beta, Exp, Gamma, Geometric, LogNormal, Pareto, Poisson, Weibull};
use serde::{Deserialize, Serialize};

use crate::error::BlockError;

/// Family of the law block lengths are drawn from.
///
/// Every random family is parameterized so that its mean equals the target
/// average block length `L`:
///
/// | family        | law                               |
/// |---------------|-----------------------------------|
/// | `None`        | always `L`                        |
/// | `Geometric`   | trials to first success, `p = 1/L` |
/// | `Exponential` | `Exp(1/L)`                        |
/// | `Gamma`       | shape 2, scale `L/2`              |
/// | `Beta`        | `2L · Beta(2, 2)`                 |
/// | `LogNormal`   | `σ = 0.5`, `μ = ln L − σ²/2`      |
/// | `Weibull`     | shape 1.5, scale `L / Γ(1 + 1/1.5)` |
/// | `Pareto`      | shape 3, scale `2L/3`             |
/// | `Poisson`     | `λ = L`                           |
/// | `Uniform`     | integers in `[1, 2L − 1]`         |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockLengthDistribution {
    /// Fixed length, no randomness.
    #[default]
    None,
    /// Geometric on `{1, 2, ...}`.
    Geometric,
    /// Exponential.
    Exponential,
    /// Gamma.
    Gamma,
    /// Scaled symmetric beta.
    Beta,
    /// Log-normal.
    LogNormal,
    /// Weibull.
    Weibull,
    /// Pareto (type I).
    Pareto,
    /// Poisson.
    Poisson,
    /// Discrete uniform.
    Uniform,
}

impl BlockLengthDistribution {
    /// All families, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::None,
        Self::Geometric,
        Self::Exponential,
        Self::Gamma,
        Self::Beta,
        Self::LogNormal,
        Self::Weibull,
        Self::Pareto,
        Self::Poisson,
        Self::Uniform,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Geometric => "geometric",
            Self::Exponential => "exponential",
            Self::Gamma => "gamma",
            Self::Beta => "beta",
            Self::LogNormal => "lognormal",
            Self::Weibull => "weibull",
            Self::Pareto => "pareto",
            Self::Poisson => "poisson",
            Self::Uniform => "uniform",
        }
    }
}

impl fmt::Display for BlockLengthDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockLengthDistribution {
    type Err = BlockError;

    /// Parses a family name, case-insensitively. `"fixed"` is accepted as an
    /// alias of `"none"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "fixed" {
            return Ok(Self::None);
        }
        Self::ALL
            .into_iter()
            .find(|d| d.name() == lower)
            .ok_or_else(|| BlockError::UnknownDistribution { name: s.to_string() })
    }
}

const LOGNORMAL_SIGMA: f64 = 0.5;
const WEIBULL_SHAPE: f64 = 1.5;
const PARETO_SHAPE: f64 = 3.0;
const GAMMA_SHAPE: f64 = 2.0;

/// Concrete law with parameters resolved at construction.
#[derive(Clone, Debug)]
enum Law {
    Fixed,
    Geometric(Geometric),
    Exponential(Exp<f64>),
    Gamma(Gamma<f64>),
    Beta { beta: Beta<f64>, scale: f64 },
    LogNormal(LogNormal<f64>),
    Weibull(Weibull<f64>),
    Pareto(Pareto<f64>),
    Poisson(Poisson<f64>),
    Uniform(Uniform<usize>),
}

fn rejected(dist: BlockLengthDistribution, e: impl fmt::Debug) -> BlockError {
    BlockError::config(format!("{dist} law rejected its parameters: {e:?}"))
}

impl Law {
    fn resolve(dist: BlockLengthDistribution, avg: usize) -> Result<Self, BlockError> {
        let l = avg as f64;
        let law = match dist {
            BlockLengthDistribution::None => Self::Fixed,
            BlockLengthDistribution::Geometric => {
                Self::Geometric(Geometric::new(1.0 / l).map_err(|e| rejected(dist, e))?)
            }
            BlockLengthDistribution::Exponential => {
                Self::Exponential(Exp::new(1.0 / l).map_err(|e| rejected(dist, e))?)
            }
            BlockLengthDistribution::Gamma => Self::Gamma(
                Gamma::new(GAMMA_SHAPE, l / GAMMA_SHAPE).map_err(|e| rejected(dist, e))?,
            ),
            BlockLengthDistribution::Beta => Self::Beta {
                beta: Beta::new(2.0, 2.0).map_err(|e| rejected(dist, e))?,
                scale: 2.0 * l,
            },
            BlockLengthDistribution::LogNormal => {
                let mu = l.ln() - LOGNORMAL_SIGMA * LOGNORMAL_SIGMA / 2.0;
                Self::LogNormal(LogNormal::new(mu, LOGNORMAL_SIGMA).map_err(|e| rejected(dist, e))?)
            }
            BlockLengthDistribution::Weibull => {
                let scale = l / statrs::function::gamma::gamma(1.0 + 1.0 / WEIBULL_SHAPE);
                Self::Weibull(Weibull::new(scale, WEIBULL_SHAPE).map_err(|e| rejected(dist, e))?)
            }
            BlockLengthDistribution::Pareto => {
                let scale = l * (PARETO_SHAPE - 1.0) / PARETO_SHAPE;
                Self::Pareto(Pareto::new(scale, PARETO_SHAPE).map_err(|e| rejected(dist, e))?)
            }
            BlockLengthDistribution::Poisson => {
                Self::Poisson(Poisson::new(l).map_err(|e| rejected(dist, e))?)
            }
            BlockLengthDistribution::Uniform => {
                Self::Uniform(Uniform::new_inclusive(1, 2 * avg - 1))
            }
        };
        Ok(law)
    }
}

/// Draws block lengths with a given mean from one of the
/// [`BlockLengthDistribution`] families.
///
/// All randomness comes from the generator passed to
/// [`sample_block_length`](Self::sample_block_length); the sampler itself is
/// immutable and can be shared.
#[derive(Clone, Debug)]
pub struct BlockLengthSampler {
    distribution: BlockLengthDistribution,
    avg_block_length: usize,
    min_block_length: usize,
    law: Law,
}

impl BlockLengthSampler {
    /// Build a sampler whose draws have mean `avg_block_length`.
    ///
    /// # Errors
    /// [`BlockError::InvalidConfig`] if `avg_block_length` is zero.
    pub fn new(
        distribution: BlockLengthDistribution,
        avg_block_length: usize,
    ) -> Result<Self, BlockError> {
        if avg_block_length == 0 {
            return Err(BlockError::config("avg_block_length must be >= 1"));
        }
        Ok(Self {
            distribution,
            avg_block_length,
            min_block_length: 1,
            law: Law::resolve(distribution, avg_block_length)?,
        })
    }

    /// Raise the floor applied to every draw.
    ///
    /// # Errors
    /// [`BlockError::InvalidConfig`] if `min_block_length` is zero.
    pub fn with_min_block_length(mut self, min_block_length: usize) -> Result<Self, BlockError> {
        if min_block_length == 0 {
            return Err(BlockError::config("min_block_length must be >= 1"));
        }
        self.min_block_length = min_block_length;
        Ok(self)
    }

    /// The configured family.
    pub fn distribution(&self) -> BlockLengthDistribution {
        self.distribution
    }

    /// The target mean length.
    pub fn avg_block_length(&self) -> usize {
        self.avg_block_length
    }

    /// The floor applied to every draw.
    pub fn min_block_length(&self) -> usize {
        self.min_block_length
    }

    /// Smallest value [`sample_block_length`](Self::sample_block_length) can return.
    pub fn smallest_length(&self) -> usize {
        match self.law {
            Law::Fixed => self.avg_block_length.max(self.min_block_length),
            _ => self.min_block_length,
        }
    }

    /// Draw one block length.
    ///
    /// The raw draw is rounded to the nearest integer and floored at
    /// `max(1, min_block_length)`. The fixed family consumes no entropy.
    pub fn sample_block_length<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let raw = match &self.law {
            Law::Fixed => return self.smallest_length(),
            Law::Geometric(d) => Distribution::<u64>::sample(d, rng).saturating_add(1) as f64,
            Law::Exponential(d) => d.sample(rng),
            Law::Gamma(d) => d.sample(rng),
            Law::Beta { beta, scale } => beta.sample(rng) * scale,
            Law::LogNormal(d) => d.sample(rng),
            Law::Weibull(d) => d.sample(rng),
            Law::Pareto(d) => d.sample(rng),
            Law::Poisson(d) => Distribution::<f64>::sample(d, rng),
            Law::Uniform(d) => d.sample(rng) as f64,
        };
        round_length(raw).max(self.min_block_length)
    }
}

/// Round a continuous draw to a usable length. Non-finite or huge draws
/// saturate at `usize::MAX`; callers clip to the input length anyway.
fn round_length(raw: f64) -> usize {
    if raw.is_nan() || raw <= 0.0 {
        return 1;
    }
    let rounded = raw.round();
    if rounded >= usize::MAX as f64 {
        usize::MAX
    } else {
        (rounded as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{RngCore, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng() -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(7)
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(
            "Geometric".parse::<BlockLengthDistribution>().unwrap(),
            BlockLengthDistribution::Geometric
        );
        assert_eq!(
            "LOGNORMAL".parse::<BlockLengthDistribution>().unwrap(),
            BlockLengthDistribution::LogNormal
        );
        assert_eq!(
            "fixed".parse::<BlockLengthDistribution>().unwrap(),
            BlockLengthDistribution::None
        );
        for d in BlockLengthDistribution::ALL {
            assert_eq!(d.to_string().parse::<BlockLengthDistribution>().unwrap(), d);
        }
    }

    #[test]
    fn unknown_name_is_configuration_error() {
        let err = "cauchy".parse::<BlockLengthDistribution>().unwrap_err();
        assert_eq!(err, BlockError::UnknownDistribution { name: "cauchy".into() });
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
    }

    #[test]
    fn zero_average_rejected() {
        assert!(BlockLengthSampler::new(BlockLengthDistribution::Geometric, 0).is_err());
        let s = BlockLengthSampler::new(BlockLengthDistribution::None, 3).unwrap();
        assert!(s.with_min_block_length(0).is_err());
    }

    #[test]
    fn fixed_returns_average_without_entropy() {
        let s = BlockLengthSampler::new(BlockLengthDistribution::None, 4).unwrap();
        let mut a = rng();
        let mut b = rng();
        for _ in 0..10 {
            assert_eq!(s.sample_block_length(&mut a), 4);
        }
        // Stream untouched.
        assert_eq!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn floor_applies_to_every_family() {
        let mut r = rng();
        for d in BlockLengthDistribution::ALL {
            let s = BlockLengthSampler::new(d, 5).unwrap().with_min_block_length(3).unwrap();
            for _ in 0..500 {
                assert!(s.sample_block_length(&mut r) >= 3, "{d} drew below floor");
            }
        }
    }

    #[test]
    fn average_of_one_always_gives_one_for_geometric() {
        let s = BlockLengthSampler::new(BlockLengthDistribution::Geometric, 1).unwrap();
        let mut r = rng();
        assert!((0..200).all(|_| s.sample_block_length(&mut r) == 1));
    }

    #[test]
    fn empirical_means_track_target() {
        let target = 8;
        let n = 40_000;
        let mut r = rng();
        for d in BlockLengthDistribution::ALL {
            let s = BlockLengthSampler::new(d, target).unwrap();
            let mean = (0..n).map(|_| s.sample_block_length(&mut r) as f64).sum::<f64>() / n as f64;
            // Rounding and the floor at 1 shift the mean slightly.
            assert_relative_eq!(mean, target as f64, max_relative = 0.08);
        }
    }

    #[test]
    fn uniform_support_is_bounded() {
        let s = BlockLengthSampler::new(BlockLengthDistribution::Uniform, 4).unwrap();
        let mut r = rng();
        for _ in 0..1000 {
            let len = s.sample_block_length(&mut r);
            assert!((1..=7).contains(&len));
        }
    }

    #[test]
    fn smallest_length_by_family() {
        let fixed = BlockLengthSampler::new(BlockLengthDistribution::None, 3).unwrap();
        assert_eq!(fixed.smallest_length(), 3);
        let geo = BlockLengthSampler::new(BlockLengthDistribution::Geometric, 3).unwrap();
        assert_eq!(geo.smallest_length(), 1);
        let geo = geo.with_min_block_length(2).unwrap();
        assert_eq!(geo.smallest_length(), 2);
    }

    #[test]
    fn rounding_handles_degenerate_draws() {
        assert_eq!(round_length(f64::NAN), 1);
        assert_eq!(round_length(0.2), 1);
        assert_eq!(round_length(2.5), 3);
        assert_eq!(round_length(f64::INFINITY), usize::MAX);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&BlockLengthDistribution::LogNormal).unwrap();
        assert_eq!(json, "\"lognormal\"");
    }
}
