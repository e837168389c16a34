//! Aggregation and normalization modes
//!
//! This module defines the fundamental types for the voxel-wise reduction:
//! the user facing mode enums and the closed set of per-voxel functions.

use super::descriptive;
use super::dispersion::{entropy_index_unchecked, gini_coefficient, theil_index, validate_alpha};
use super::histogram::{histogram_entropy, validate_bins};
use crate::errors::{AggregateError, Result};
use std::fmt;
use std::str::FromStr;

/// Supported aggregation functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    /// Arithmetic mean
    Mean,
    /// Median value
    Median,
    /// Standard deviation
    StDev,
    /// Gini coefficient
    Gini,
    /// Theil coefficient, i.e., GE(1)
    Theil,
    /// Generalized entropy index GE(alpha)
    EntropyIndex,
    /// Shannon entropy of a histogram estimate
    Entropy,
}

impl AggregationMode {
    /// Get the string representation of the mode
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::StDev => "stddev",
            Self::Gini => "gini",
            Self::Theil => "theil",
            Self::EntropyIndex => "entropy_index",
            Self::Entropy => "entropy",
        }
    }

    /// Whether the mode is an inequality measure that needs positive inputs
    #[must_use]
    pub const fn is_inequality_measure(self) -> bool {
        matches!(self, Self::Gini | Self::Theil | Self::EntropyIndex)
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationMode {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self> {
        let mode = match s.to_lowercase().as_str() {
            "mean" | "mu" | "avg" | "average" => Self::Mean,
            "median" => Self::Median,
            "stddev" | "stdev" | "sdev" | "sd" | "sigma" => Self::StDev,
            "gini" | "gini-coefficient" => Self::Gini,
            "theil" | "theil-index" => Self::Theil,
            "entropy-index" | "ge" | "generalized-entropy-index" => Self::EntropyIndex,
            "entropy" | "shannon-entropy" => Self::Entropy,
            _ => {
                return Err(AggregateError::InvalidMode {
                    kind: "aggregation",
                    value: s.to_string(),
                })
            }
        };
        Ok(mode)
    }
}

/// Input intensity normalization applied per volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizationMode {
    /// Use input intensities unmodified
    #[default]
    None,
    /// Divide by the mean foreground intensity
    Mean,
    /// Divide by the median foreground intensity
    Median,
    /// Subtract the mean and divide by the standard deviation
    ZScore,
    /// Rescale foreground intensities to [0, 1]
    UnitRange,
}

impl NormalizationMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::ZScore => "z-score",
            Self::UnitRange => "unit",
        }
    }
}

impl fmt::Display for NormalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalizationMode {
    type Err = AggregateError;

    /// Accepts mode names as well as boolean switches, where "yes" selects z-score
    fn from_str(s: &str) -> Result<Self> {
        let mode = match s.to_lowercase().as_str() {
            "none" | "no" | "off" | "false" => Self::None,
            "yes" | "on" | "true" => Self::ZScore,
            "mean" => Self::Mean,
            "median" => Self::Median,
            "zscore" | "z-score" => Self::ZScore,
            "unit" => Self::UnitRange,
            _ => {
                return Err(AggregateError::InvalidMode {
                    kind: "normalization",
                    value: s.to_string(),
                })
            }
        };
        Ok(mode)
    }
}

/// Per-voxel aggregation function, chosen once per run
///
/// The function receives a scratch column that it may reorder or overwrite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregationFunction {
    Mean,
    Median,
    StDev,
    Gini,
    Theil,
    EntropyIndex { alpha: f64 },
    Entropy { bins: usize, parzen: bool },
}

impl AggregationFunction {
    /// Resolve a mode and its parameters into an evaluable function
    ///
    /// # Errors
    ///
    /// Returns an error for a negative alpha (GE only) or a bin count outside
    /// `1..=MAX_BINS` (entropy only).
    pub fn new(mode: AggregationMode, alpha: f64, bins: usize, parzen: bool) -> Result<Self> {
        let function = match mode {
            AggregationMode::Mean => Self::Mean,
            AggregationMode::Median => Self::Median,
            AggregationMode::StDev => Self::StDev,
            AggregationMode::Gini => Self::Gini,
            AggregationMode::Theil => Self::Theil,
            AggregationMode::EntropyIndex => {
                validate_alpha(alpha)?;
                Self::EntropyIndex { alpha }
            }
            AggregationMode::Entropy => {
                validate_bins(bins)?;
                Self::Entropy { bins, parzen }
            }
        };
        Ok(function)
    }

    /// Evaluate the function on one voxel column
    #[must_use]
    pub fn evaluate(&self, values: &mut Vec<f64>) -> f64 {
        match *self {
            Self::Mean => descriptive::mean(values),
            Self::Median => descriptive::median(values),
            Self::StDev => descriptive::stdev(values),
            Self::Gini => gini_coefficient(values.as_mut_slice()),
            Self::Theil => theil_index(values.as_slice()),
            Self::EntropyIndex { alpha } => entropy_index_unchecked(values.as_slice(), alpha),
            Self::Entropy { bins, parzen } => histogram_entropy(values, bins, parzen),
        }
    }
}
