//! Error types for block generation and resampling.

/// Broad category of a [`BlockError`].
///
/// Configuration errors are raised while setting up a sampler, generator or
/// bootstrap. Validation errors are raised while checking blocks, weights or
/// data handed to the resampler, always before any random draw is consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or inconsistent configuration.
    Configuration,
    /// Malformed blocks, weights or data.
    Validation,
}

/// Error type for all fallible operations in the crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BlockError {
    /// Returned when a distribution name is not one of the known families.
    #[error("unknown block length distribution '{name}'")]
    UnknownDistribution {
        /// The rejected name.
        name: String,
    },

    /// Returned when a configuration value is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a length parameter is out of range for the input.
    #[error("{field} = {value} exceeds the limit of {limit}")]
    InvalidLength {
        /// Name of the offending parameter.
        field: &'static str,
        /// The configured value.
        value: usize,
        /// The largest accepted value.
        limit: usize,
    },

    /// Returned when the resampler receives no blocks.
    #[error("block partition is empty")]
    EmptyPartition,

    /// Returned when a block holds no indices.
    #[error("block {block} contains no indices")]
    EmptyBlock {
        /// Position of the block in the partition.
        block: usize,
    },

    /// Returned when a block refers to a row outside the input.
    #[error("block {block} refers to index {index}, input has {len} rows")]
    IndexOutOfRange {
        /// Position of the block in the partition.
        block: usize,
        /// The offending index.
        index: usize,
        /// Number of rows in the input.
        len: usize,
    },

    /// Returned when an array length does not match what is expected.
    #[error("{field}: expected {expected} elements, got {got}")]
    LengthMismatch {
        /// Name of the mismatched field.
        field: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Returned when a weight is NaN or infinite.
    #[error("non-finite value in {field} at position {index}")]
    NonFiniteWeight {
        /// Which weight source failed.
        field: &'static str,
        /// Position of the first non-finite entry.
        index: usize,
    },

    /// Returned when a weight is negative.
    #[error("negative value {value} in {field} at position {index}")]
    NegativeWeight {
        /// Which weight source failed.
        field: &'static str,
        /// Position of the first negative entry.
        index: usize,
        /// The negative value.
        value: f64,
    },

    /// Returned when every weight is zero.
    #[error("all values in {field} are zero")]
    AllZeroWeights {
        /// Which weight source failed.
        field: &'static str,
    },

    /// Returned when the input series has no rows or no columns.
    #[error("input series is empty")]
    EmptySeries,
}

impl BlockError {
    /// Returns whether this is a configuration or a validation failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownDistribution { .. }
            | Self::InvalidConfig { .. }
            | Self::InvalidLength { .. } => ErrorKind::Configuration,
            Self::EmptyPartition
            | Self::EmptyBlock { .. }
            | Self::IndexOutOfRange { .. }
            | Self::LengthMismatch { .. }
            | Self::NonFiniteWeight { .. }
            | Self::NegativeWeight { .. }
            | Self::AllZeroWeights { .. }
            | Self::EmptySeries => ErrorKind::Validation,
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_distribution() {
        let e = BlockError::UnknownDistribution {
            name: "cauchy".to_string(),
        };
        assert_eq!(e.to_string(), "unknown block length distribution 'cauchy'");
        assert_eq!(e.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn display_invalid_length() {
        let e = BlockError::InvalidLength {
            field: "min_block_length",
            value: 12,
            limit: 10,
        };
        assert_eq!(e.to_string(), "min_block_length = 12 exceeds the limit of 10");
        assert_eq!(e.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn display_index_out_of_range() {
        let e = BlockError::IndexOutOfRange {
            block: 2,
            index: 11,
            len: 10,
        };
        assert_eq!(e.to_string(), "block 2 refers to index 11, input has 10 rows");
        assert_eq!(e.kind(), ErrorKind::Validation);
    }

    #[test]
    fn display_negative_weight() {
        let e = BlockError::NegativeWeight {
            field: "block_weights",
            index: 0,
            value: -1.0,
        };
        assert_eq!(e.to_string(), "negative value -1 in block_weights at position 0");
        assert_eq!(e.kind(), ErrorKind::Validation);
    }

    #[test]
    fn config_helper_builds_invalid_config() {
        let e = BlockError::config("n_bootstraps must be >= 1");
        assert_eq!(e.to_string(), "invalid configuration: n_bootstraps must be >= 1");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<BlockError>();
    }
}
