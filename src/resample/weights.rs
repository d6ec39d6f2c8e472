use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::BlockError;

/// Lower bound applied to every tapering weight.
pub const TAPER_FLOOR: f64 = 0.1;

/// Function mapping a length to a weight vector of that length.
pub type WeightFn = Arc<dyn Fn(usize) -> Vec<f64> + Send + Sync>;

/// Per-position block-selection weights over `0..N`.
///
/// A block's selection weight is the mean of the position weights it covers,
/// so uniform position weights select every block with equal probability.
#[derive(Clone, Default)]
pub enum WeightSource {
    /// Every block is equally likely.
    #[default]
    Uniform,
    /// One weight per input row.
    Array(Vec<f64>),
    /// Called once with `N`; must return `N` weights.
    Fn(WeightFn),
}

impl WeightSource {
    /// Wrap a closure as a weight source.
    pub fn from_fn(f: impl Fn(usize) -> Vec<f64> + Send + Sync + 'static) -> Self {
        Self::Fn(Arc::new(f))
    }

    /// Evaluate the source for `n` rows. `None` means uniform.
    pub(crate) fn evaluate(&self, n: usize) -> Result<Option<Vec<f64>>, BlockError> {
        let weights = match self {
            Self::Uniform => return Ok(None),
            Self::Array(w) => w.clone(),
            Self::Fn(f) => f(n),
        };
        check_weights("block_weights", &weights, n)?;
        if weights.iter().all(|&w| w == 0.0) {
            return Err(BlockError::AllZeroWeights {
                field: "block_weights",
            });
        }
        Ok(Some(weights))
    }
}

impl fmt::Debug for WeightSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform => f.write_str("Uniform"),
            Self::Array(w) => f.debug_tuple("Array").field(&w.len()).finish(),
            Self::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}

/// Standard symmetric tapering windows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaperWindow {
    /// Triangular window, zero at both ends.
    Bartlett,
    /// Raised cosine with 0.08 end values.
    Hamming,
    /// Raised cosine, zero at both ends.
    Hann,
    /// Three-term Blackman window.
    Blackman,
    /// Flat top with cosine tapers over a fraction `alpha` of the window.
    Tukey {
        /// Tapered fraction, in `[0, 1]`.
        alpha: f64,
    },
}

impl TaperWindow {
    /// Tukey window with the customary `alpha = 0.5`.
    pub const TUKEY: Self = Self::Tukey { alpha: 0.5 };

    /// Check window parameters.
    pub fn validate(&self) -> Result<(), BlockError> {
        if let Self::Tukey { alpha } = *self {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(BlockError::config(format!(
                    "tukey alpha must be within [0, 1], got {alpha}"
                )));
            }
        }
        Ok(())
    }

    /// Window values for `len` points. A single point is always `[1.0]`.
    pub fn weights(&self, len: usize) -> Vec<f64> {
        if len <= 1 {
            return vec![1.0; len];
        }
        let m = (len - 1) as f64;
        let cosine = |a: &[f64], i: usize| {
            a.iter()
                .enumerate()
                .map(|(k, &ak)| {
                    let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                    sign * ak * (2.0 * PI * k as f64 * i as f64 / m).cos()
                })
                .sum::<f64>()
        };
        (0..len)
            .map(|i| match *self {
                Self::Bartlett => 1.0 - (2.0 * i as f64 / m - 1.0).abs(),
                Self::Hamming => cosine(&[0.54, 0.46], i),
                Self::Hann => cosine(&[0.5, 0.5], i),
                Self::Blackman => cosine(&[0.42, 0.5, 0.08], i),
                Self::Tukey { alpha } => tukey(alpha, i as f64, m),
            })
            // cosine sums can dip a hair below zero at the edges
            .map(|w| w.max(0.0))
            .collect()
    }
}

fn tukey(alpha: f64, x: f64, m: f64) -> f64 {
    if alpha <= 0.0 {
        return 1.0;
    }
    let edge = alpha * m / 2.0;
    let dist = x.min(m - x);
    if dist >= edge {
        1.0
    } else {
        0.5 * (1.0 + (PI * (dist / edge - 1.0)).cos())
    }
}

/// Within-block tapering weights.
#[derive(Clone)]
pub enum TaperSource {
    /// A standard window evaluated at each block's length.
    Window(TaperWindow),
    /// Called with each block's length; must return that many weights.
    Fn(WeightFn),
    /// One explicit weight vector per block, in partition order.
    PerBlock(Vec<Vec<f64>>),
}

impl TaperSource {
    /// Wrap a closure as a taper source.
    pub fn from_fn(f: impl Fn(usize) -> Vec<f64> + Send + Sync + 'static) -> Self {
        Self::Fn(Arc::new(f))
    }

    /// Tapering weights for block `block` of length `len`, floored at
    /// [`TAPER_FLOOR`].
    pub(crate) fn evaluate(&self, block: usize, len: usize) -> Result<Vec<f64>, BlockError> {
        let mut weights = match self {
            Self::Window(w) => {
                w.validate()?;
                w.weights(len)
            }
            Self::Fn(f) => f(len),
            Self::PerBlock(all) => all.get(block).cloned().ok_or(BlockError::LengthMismatch {
                field: "tapered_weights blocks",
                expected: block + 1,
                got: all.len(),
            })?,
        };
        check_weights("tapered_weights", &weights, len)?;
        for w in &mut weights {
            *w = w.max(TAPER_FLOOR);
        }
        Ok(weights)
    }
}

impl fmt::Debug for TaperSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Window(w) => f.debug_tuple("Window").field(w).finish(),
            Self::Fn(_) => f.write_str("Fn(..)"),
            Self::PerBlock(all) => f.debug_tuple("PerBlock").field(&all.len()).finish(),
        }
    }
}

impl From<TaperWindow> for TaperSource {
    fn from(window: TaperWindow) -> Self {
        Self::Window(window)
    }
}

/// Length, finiteness and sign checks shared by both weight kinds.
fn check_weights(field: &'static str, weights: &[f64], expected: usize) -> Result<(), BlockError> {
    if weights.len() != expected {
        return Err(BlockError::LengthMismatch {
            field,
            expected,
            got: weights.len(),
        });
    }
    if let Some(index) = weights.iter().position(|w| !w.is_finite()) {
        return Err(BlockError::NonFiniteWeight { field, index });
    }
    if let Some(index) = weights.iter().position(|&w| w < 0.0) {
        return Err(BlockError::NegativeWeight {
            field,
            index,
            value: weights[index],
        });
    }
    Ok(())
}
