//! Block bootstrap resampling for dependent sequences.
//!
//! A series is carved into blocks of consecutive rows ([`BlockGenerator`]),
//! blocks are drawn with replacement and optionally tapered
//! ([`BlockResampler`]) until a resample of the original length is built.
//! [`BlockBootstrap`] ties both steps together behind the [`Re`] trait.
//!
//! All randomness comes from a caller-supplied [`rand::Rng`]; a fixed seed
//! gives identical partitions and draws.

mod error;
mod series;
mod resample;
mod display;

pub use error::{BlockError, ErrorKind};
pub use series::Series;
pub use crate::resample::*;
pub use rand;
