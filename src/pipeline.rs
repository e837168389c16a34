//! End-to-end aggregation of co-registered volumes
//!
//! [`aggregate_volumes`] runs the stages strictly in order:
//!
//! 1. check inputs and unify padding with NaN as the background marker
//! 2. optional per-volume intensity normalization
//! 3. positivity shift, for the inequality measures only
//! 4. output initialisation with the union or intersection background policy
//! 5. parallel per-voxel aggregation
//! 6. replacement of NaN left in the output
//!
//! Every stage is exposed on its own for callers that drive the steps
//! themselves.

use crate::errors::{AggregateError, Result};
use crate::foreground::{is_foreground, is_foreground_value, unify_background};
use crate::normalize::normalize;
use crate::statistics::{
    aggregate_voxels, AggregationFunction, AggregationMode, NormalizationMode, DEFAULT_BINS,
};
use crate::volume::{is_output_foreground, OutputVolume, Volume, VolumeAttributes};
use rayon::prelude::*;
use tracing::{debug, info};

/// Minimum number of input volumes of a run
pub const MIN_INPUTS: usize = 2;

/// Output background value for every mode except the mean
pub const BACKGROUND_FILL: f32 = 1e-3;

/// Distance below the output minimum used to replace NaN values
pub const NAN_FILL_OFFSET: f32 = 1e-3;

/// Options of one aggregation run
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    /// Aggregation function
    pub mode: AggregationMode,
    /// Per-volume intensity normalization
    pub normalization: NormalizationMode,
    /// Input value marking background voxels, NaN for none
    pub padding: f64,
    /// Alpha of the generalized entropy index
    pub alpha: f64,
    /// Number of histogram bins for the entropy
    pub bins: usize,
    /// Parzen window smoothing of the entropy histogram
    pub parzen: bool,
    /// Background if any input is background (instead of all)
    pub intersection: bool,
}

impl AggregateOptions {
    /// Options with defaults for everything but the mode
    #[must_use]
    pub fn new(mode: AggregationMode) -> Self {
        Self {
            mode,
            normalization: NormalizationMode::None,
            padding: f64::NAN,
            alpha: 0.0,
            bins: DEFAULT_BINS,
            parzen: false,
            intersection: false,
        }
    }

    #[must_use]
    pub fn with_normalization(mut self, normalization: NormalizationMode) -> Self {
        self.normalization = normalization;
        self
    }

    #[must_use]
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    #[must_use]
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    #[must_use]
    pub fn with_parzen(mut self, parzen: bool) -> Self {
        self.parzen = parzen;
        self
    }

    #[must_use]
    pub fn with_intersection(mut self, intersection: bool) -> Self {
        self.intersection = intersection;
        self
    }

    /// Background fill value of the output volume
    #[must_use]
    pub fn background_fill(&self) -> f32 {
        if self.mode == AggregationMode::Mean {
            f32::NAN
        } else {
            BACKGROUND_FILL
        }
    }

    /// Per-voxel function selected by these options
    ///
    /// # Errors
    ///
    /// Returns an error for a negative alpha or zero histogram bins.
    pub fn aggregation_function(&self) -> Result<AggregationFunction> {
        AggregationFunction::new(self.mode, self.alpha, self.bins, self.parzen)
    }
}

/// Result of [`aggregate_volumes`]
#[derive(Debug, Clone)]
pub struct AggregationOutcome {
    /// Aggregated volume
    pub output: OutputVolume,
    /// Output voxels that were aggregated
    pub foreground_voxels: usize,
    /// Output voxels that received the background fill
    pub background_voxels: usize,
    /// NaN values replaced during cleanup
    pub replaced_nan: usize,
}

/// Aggregate co-registered volumes voxel by voxel
///
/// # Errors
///
/// Returns an error if:
/// - fewer than two volumes are given
/// - the volumes are defined on different grids
/// - alpha is negative or the number of bins is zero
/// - an inequality measure is requested but no volume has any foreground
pub fn aggregate_volumes(mut volumes: Vec<Volume>, options: &AggregateOptions) -> Result<AggregationOutcome> {
    let function = options.aggregation_function()?;
    check_inputs(&volumes)?;

    info!(
        mode = %options.mode,
        normalization = %options.normalization,
        inputs = volumes.len(),
        voxels = volumes[0].number_of_voxels(),
        intersection = options.intersection,
        "🚀 Starting voxel-wise aggregation"
    );

    volumes.par_iter_mut().for_each(|volume| {
        let replaced = unify_background(volume, options.padding);
        debug!(volume = volume.name(), replaced, "Replaced padding by NaN");
    });

    if options.normalization != NormalizationMode::None {
        info!("Normalizing volumes ({})", options.normalization);
        volumes.par_iter_mut().for_each(|volume| {
            let transform = normalize(volume, options.normalization);
            debug!(
                volume = volume.name(),
                scale = transform.scale,
                shift = transform.shift,
                "Normalized intensities"
            );
        });
    }

    if options.mode.is_inequality_measure() {
        let offset = shift_foreground_positive(&mut volumes, options.padding)?;
        debug!(offset, "Shifted foreground intensities to be positive");
    }

    let mut output = init_output(&volumes, options.background_fill(), options.intersection);
    let foreground_voxels = output
        .samples()
        .iter()
        .filter(|&&v| is_output_foreground(v, output.background_value()))
        .count();
    let background_voxels = output.number_of_voxels() - foreground_voxels;
    debug!(foreground_voxels, background_voxels, "Initialized output volume");

    info!(
        "⚡ Performing voxel-wise aggregation across {} threads",
        rayon::current_num_threads()
    );
    aggregate_voxels(&volumes, &mut output, &function)?;

    let replaced_nan = replace_nan(&mut output);
    if replaced_nan > 0 {
        debug!(replaced_nan, "Replaced NaN output values by minimum");
    }
    info!("✅ Aggregation done");

    Ok(AggregationOutcome {
        output,
        foreground_voxels,
        background_voxels,
        replaced_nan,
    })
}

/// Require at least [`MIN_INPUTS`] volumes on one common grid
///
/// # Errors
///
/// Returns [`AggregateError::NotEnoughInputs`] or [`AggregateError::GeometryMismatch`].
pub fn check_inputs(volumes: &[Volume]) -> Result<()> {
    if volumes.len() < MIN_INPUTS {
        return Err(AggregateError::NotEnoughInputs {
            required: MIN_INPUTS,
            given: volumes.len(),
        });
    }
    let reference = volumes[0].attributes();
    if let Some(volume) = volumes[1..].iter().find(|v| v.attributes() != reference) {
        return Err(AggregateError::GeometryMismatch {
            name: volume.name().to_string(),
        });
    }
    Ok(())
}

/// Smallest foreground value of a volume
fn foreground_min(volume: &Volume) -> Option<f64> {
    let background = volume.background_value();
    volume
        .samples()
        .iter()
        .copied()
        .filter(|&v| is_foreground_value(v, background))
        .reduce(f64::min)
}

/// Shift foreground intensities of all volumes so that the global minimum becomes 1
///
/// Background samples are set to 0, which also becomes the background value
/// of every volume. Returns the subtracted offset.
///
/// # Errors
///
/// Returns [`AggregateError::NoForeground`] if no volume has any foreground voxel.
pub fn shift_foreground_positive(volumes: &mut [Volume], padding: f64) -> Result<f64> {
    let min_value = volumes
        .par_iter()
        .filter_map(foreground_min)
        .reduce_with(f64::min)
        .ok_or(AggregateError::NoForeground { padding })?;
    let offset = min_value - 1.0;

    volumes.par_iter_mut().for_each(|volume| {
        let background = volume.background_value();
        for value in volume.samples_mut() {
            if is_foreground_value(*value, background) {
                *value -= offset;
            } else {
                *value = 0.0;
            }
        }
        volume.set_background_value(0.0);
    });
    Ok(offset)
}

/// Output volume with background voxels set to `background` and all others to 0
///
/// With `intersection` a voxel is background if any input is background there,
/// otherwise only if all inputs are.
#[must_use]
pub fn init_output(volumes: &[Volume], background: f32, intersection: bool) -> OutputVolume {
    let attributes = volumes
        .first()
        .map(|v| v.attributes().clone())
        .unwrap_or_else(|| VolumeAttributes::from_shape(&[0]));
    let mut output = OutputVolume::filled(attributes, 0.0, background);
    output
        .samples_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(voxel, value)| {
            let foreground = if intersection {
                volumes.iter().all(|v| is_foreground(v, voxel))
            } else {
                volumes.iter().any(|v| is_foreground(v, voxel))
            };
            if !foreground {
                *value = background;
            }
        });
    output
}

/// Replace NaN output values by the output minimum minus [`NAN_FILL_OFFSET`]
///
/// The minimum is taken as 0 when the output holds no other value. Returns
/// the number of replaced values.
pub fn replace_nan(output: &mut OutputVolume) -> usize {
    let min_value = output
        .samples()
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f32::min)
        .unwrap_or(0.0);
    let fill = min_value - NAN_FILL_OFFSET;

    let mut replaced = 0;
    for value in output.samples_mut() {
        if value.is_nan() {
            *value = fill;
            replaced += 1;
        }
    }
    replaced
}
