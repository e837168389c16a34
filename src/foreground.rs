//! Foreground classification of input volume samples
//!
//! NaN is the single background marker inside the pipeline. Caller supplied
//! padding values are folded into it once per volume by [`unify_background`],
//! after which [`is_foreground`] is a pure predicate on the sample value.

use crate::volume::Volume;

/// Foreground test for a single sample value
#[inline]
#[must_use]
pub fn is_foreground_value(value: f64, background: f64) -> bool {
    !value.is_nan() && value != background
}

/// Whether a voxel of a volume counts as foreground
#[inline]
#[must_use]
pub fn is_foreground(volume: &Volume, voxel: usize) -> bool {
    is_foreground_value(volume.get(voxel), volume.background_value())
}

/// Rewrite padding samples to NaN and make NaN the volume's background value.
///
/// A NaN padding leaves the samples untouched. Returns the number of samples
/// that were rewritten.
pub fn unify_background(volume: &mut Volume, padding: f64) -> usize {
    let mut replaced = 0;
    if !padding.is_nan() {
        for value in volume.samples_mut().iter_mut() {
            if *value == padding {
                *value = f64::NAN;
                replaced += 1;
            }
        }
    }
    volume.set_background_value(f64::NAN);
    replaced
}

/// Per-voxel foreground flags of one volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundMask {
    flags: Vec<bool>,
}

impl ForegroundMask {
    /// Classify every voxel of a volume
    #[must_use]
    pub fn from_volume(volume: &Volume) -> Self {
        let background = volume.background_value();
        let flags = volume
            .samples()
            .iter()
            .map(|&v| is_foreground_value(v, background))
            .collect();
        Self { flags }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.flags
    }

    /// Number of foreground voxels
    #[must_use]
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }
}
