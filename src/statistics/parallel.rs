//! Parallel voxel-wise aggregation
//!
//! This module contains the data-parallel reduction over voxel columns.

use super::operations::AggregationFunction;
use crate::errors::{AggregateError, Result};
use crate::volume::{is_output_foreground, OutputVolume, Volume};
use rayon::prelude::*;
use tracing::debug;

/// Number of chunks handed to each worker thread on average
const CHUNKS_PER_THREAD: usize = 4;

/// Evaluates `function` at every foreground voxel of `output`
///
/// The output is split into contiguous voxel ranges, one rayon task per range.
/// Each task gathers the N input values of a voxel into a scratch column
/// that is reused for all voxels of the task; background voxels of the
/// output keep their fill value.
///
/// # Errors
///
/// Returns an error if an input volume has a different number of voxels than
/// the output.
pub fn aggregate_voxels(
    inputs: &[Volume],
    output: &mut OutputVolume,
    function: &AggregationFunction,
) -> Result<()> {
    let nvox = output.number_of_voxels();
    if let Some(volume) = inputs.iter().find(|v| v.number_of_voxels() != nvox) {
        return Err(AggregateError::GeometryMismatch {
            name: volume.name().to_string(),
        });
    }

    let columns = inputs.len();
    let background = output.background_value();
    let chunk_size = nvox
        .div_ceil(rayon::current_num_threads() * CHUNKS_PER_THREAD)
        .max(1);

    debug!(
        voxels = nvox,
        chunk_size,
        threads = rayon::current_num_threads(),
        "⚡ Aggregating voxel columns"
    );

    output
        .samples_mut()
        .par_chunks_mut(chunk_size)
        .enumerate()
        .for_each_init(
            || Vec::with_capacity(columns),
            |values, (chunk, slots)| {
                let offset = chunk * chunk_size;
                for (i, slot) in slots.iter_mut().enumerate() {
                    if !is_output_foreground(*slot, background) {
                        continue;
                    }
                    let voxel = offset + i;
                    values.clear();
                    values.extend(inputs.iter().map(|v| v.get(voxel)));
                    *slot = function.evaluate(values) as f32;
                }
            },
        );

    Ok(())
}
