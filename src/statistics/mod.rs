//! Statistical computations and parallel voxel-wise reduction
//!
//! This module provides the per-voxel aggregation functions and the parallel
//! driver that evaluates them over a stack of co-registered volumes.
//!
//! # Organization
//!
//! This module is organized into submodules:
//! - [`operations`]: Aggregation/normalization modes and the per-voxel function
//! - [`descriptive`]: Mean, median, standard deviation and extrema
//! - [`dispersion`]: Gini coefficient and generalized entropy index
//! - [`histogram`]: Fixed-width histogram and Shannon entropy
//! - [`parallel`]: Parallel aggregation over voxel columns

pub mod descriptive;
pub mod dispersion;
pub mod histogram;
pub mod operations;
pub mod parallel;

// Re-export the main types and functions for convenience
pub use dispersion::{entropy_index, gini_coefficient, theil_index, Sample};
pub use histogram::{histogram_entropy, Histogram1D, DEFAULT_BINS, MAX_BINS};
pub use operations::{AggregationFunction, AggregationMode, NormalizationMode};
pub use parallel::aggregate_voxels;
