//! Foreground intensity normalization of a single volume

use crate::foreground::ForegroundMask;
use crate::statistics::descriptive::{masked_extrema, masked_mean, masked_mean_stdev, masked_median};
use crate::statistics::NormalizationMode;
use crate::utils::fequal;
use crate::volume::Volume;

/// Affine intensity map `x' = scale * x + shift`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub scale: f64,
    pub shift: f64,
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        scale: 1.0,
        shift: 0.0,
    };

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.shift == 0.0
    }

    #[inline]
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        self.scale * value + self.shift
    }
}

/// Intensity map that `mode` would apply to the masked samples
///
/// Degenerate statistics (zero mean, median, deviation or range) fall back to
/// a unit scale so the result stays finite. An empty foreground yields the
/// identity.
#[must_use]
pub fn normalization_transform(data: &[f64], mask: &[bool], mode: NormalizationMode) -> AffineTransform {
    let mut transform = AffineTransform::IDENTITY;
    match mode {
        NormalizationMode::None => {}
        NormalizationMode::Mean => {
            if let Some(mean) = masked_mean(data, mask) {
                if !fequal(mean, 0.0) {
                    transform.scale = 1.0 / mean;
                }
            }
        }
        NormalizationMode::Median => {
            if let Some(median) = masked_median(data, mask) {
                if !fequal(median, 0.0) {
                    transform.scale = 1.0 / median;
                }
            }
        }
        NormalizationMode::ZScore => {
            if let Some((mean, sigma)) = masked_mean_stdev(data, mask) {
                if fequal(sigma, 0.0) {
                    transform.shift = -mean;
                } else {
                    transform.scale = 1.0 / sigma;
                    transform.shift = -mean / sigma;
                }
            }
        }
        NormalizationMode::UnitRange => {
            if let Some((min, max)) = masked_extrema(data, mask) {
                let range = max - min;
                if fequal(range, 0.0) {
                    transform.shift = -min;
                } else {
                    transform.scale = 1.0 / range;
                    transform.shift = -min / range;
                }
            }
        }
    }
    transform
}

/// Normalize the foreground intensities of `volume` in place
///
/// Background samples are left untouched. Returns the applied transform.
pub fn normalize(volume: &mut Volume, mode: NormalizationMode) -> AffineTransform {
    if mode == NormalizationMode::None {
        return AffineTransform::IDENTITY;
    }
    let mask = ForegroundMask::from_volume(volume);
    let transform = normalization_transform(volume.samples(), mask.as_slice(), mode);
    if !transform.is_identity() {
        for (value, &fg) in volume.samples_mut().iter_mut().zip(mask.as_slice()) {
            if fg {
                *value = transform.apply(*value);
            }
        }
    }
    transform
}
