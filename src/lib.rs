//! voxel_aggregate: voxel-wise aggregation of co-registered volumes
//!
//! Given N intensity volumes defined on the same grid, this library computes
//! at every voxel a statistic over the N values observed there and produces a
//! single output volume. Each input can be intensity normalized over its own
//! foreground first, and voxels are classified as background through a
//! padding value with either a union or an intersection policy.
//!
//! ## Key Features
//!
//! - **Parallel Processing**: Per-voxel reductions distributed with Rayon
//! - **Aggregation Functions**: Mean, median, standard deviation, Gini
//!   coefficient, Theil index, generalized entropy index and Shannon entropy
//! - **Normalization**: Mean, median, z-score and unit range normalization
//! - **NetCDF Support**: Read input volumes and write the aggregate
//!
//! ## Module Organization
//!
//! - [`pipeline`]: The end-to-end aggregation run and its options
//! - [`statistics`]: Aggregation functions and the parallel voxel aggregator
//! - [`foreground`]: Foreground classification and padding handling
//! - [`normalize`]: Per-volume intensity normalization
//! - [`volume`]: In-memory input and output volumes
//! - [`netcdf_io`]: NetCDF reading and writing of volumes
//! - [`parallel`]: Parallel processing configuration
//! - [`errors`]: Centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use voxel_aggregate::prelude::*;
//! use std::path::Path;
//!
//! let inputs = ["a.nc", "b.nc"]
//!     .iter()
//!     .map(|p| read_volume_from_path(Path::new(p), None))
//!     .collect::<Result<Vec<_>>>()?;
//!
//! let options = AggregateOptions::new(AggregationMode::Gini)
//!     .with_padding(0.0)
//!     .with_normalization(NormalizationMode::ZScore);
//! let outcome = aggregate_volumes(inputs, &options)?;
//! println!("{} foreground voxels", outcome.foreground_voxels);
//! # Ok::<(), AggregateError>(())
//! ```

pub mod cli;
pub mod errors;
pub mod foreground;
pub mod netcdf_io;
pub mod normalize;
pub mod parallel;
pub mod pipeline;
pub mod statistics;
pub mod volume;

mod utils;

pub use errors::*;
pub use pipeline::{aggregate_volumes, AggregateOptions, AggregationOutcome};
pub use volume::{OutputVolume, Volume, VolumeAttributes};

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::errors::{AggregateError, Result};
    pub use crate::netcdf_io::{read_volume, read_volume_from_path, VolumeWriter};
    pub use crate::parallel::ParallelConfig;
    pub use crate::pipeline::{aggregate_volumes, AggregateOptions, AggregationOutcome};
    pub use crate::statistics::{AggregationFunction, AggregationMode, NormalizationMode};
    pub use crate::volume::{OutputVolume, Volume, VolumeAttributes};
}
