//! Fixed-width 1-D histogram and Shannon entropy estimation

use crate::errors::{AggregateError, Result};
use crate::utils::finite_min_max;

/// Default number of bins for histogram based aggregation
pub const DEFAULT_BINS: usize = 64;

/// Largest number of bins accepted for a histogram
pub const MAX_BINS: usize = 1 << 16;

/// Histogram with equally sized bins spanning `[min, max]`
#[derive(Debug, Clone)]
pub struct Histogram1D {
    min: f64,
    max: f64,
    width: f64,
    bins: Vec<f64>,
    samples: f64,
}

impl Histogram1D {
    /// Empty histogram with `bins` bins over `[min, max]`
    ///
    /// # Errors
    ///
    /// Returns an error for a bin count outside `1..=MAX_BINS` or an empty or
    /// non-finite range.
    pub fn new(bins: usize, min: f64, max: f64) -> Result<Self> {
        validate_bins(bins)?;
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(AggregateError::invalid_argument(format!(
                "invalid histogram range [{min}, {max}]"
            )));
        }
        Ok(Self {
            min,
            max,
            width: (max - min) / bins as f64,
            bins: vec![0.0; bins],
            samples: 0.0,
        })
    }

    #[must_use]
    pub fn number_of_bins(&self) -> usize {
        self.bins.len()
    }

    #[must_use]
    pub fn bin_width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    /// Total weight of all bins
    #[must_use]
    pub fn number_of_samples(&self) -> f64 {
        self.samples
    }

    /// Bin index of a value; values outside the range are clamped
    #[must_use]
    pub fn bin_index(&self, value: f64) -> usize {
        if value <= self.min {
            return 0;
        }
        let last = self.number_of_bins() - 1;
        if value >= self.max {
            return last;
        }
        (((value - self.min) / self.width) as usize).min(last)
    }

    /// Count one sample; NaN is ignored
    pub fn add_sample(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        let bin = self.bin_index(value);
        self.bins[bin] += 1.0;
        self.samples += 1.0;
    }

    /// Parzen window estimate with the discrete kernel `[1 2 1]`.
    ///
    /// The kernel is renormalised at the first and last bin.
    pub fn smooth(&mut self) {
        let n = self.number_of_bins();
        if n < 2 {
            return;
        }
        let src = self.bins.clone();
        self.bins[0] = (2.0 * src[0] + src[1]) / 3.0;
        for i in 1..n - 1 {
            self.bins[i] = (src[i - 1] + 2.0 * src[i] + src[i + 1]) / 4.0;
        }
        self.bins[n - 1] = (src[n - 2] + 2.0 * src[n - 1]) / 3.0;
        self.samples = self.bins.iter().sum();
    }

    /// Shannon entropy (natural logarithm) of the normalised bin weights
    #[must_use]
    pub fn entropy(&self) -> f64 {
        if self.samples <= 0.0 {
            return 0.0;
        }
        -self
            .bins
            .iter()
            .filter(|&&count| count > 0.0)
            .map(|&count| {
                let p = count / self.samples;
                p * p.ln()
            })
            .sum::<f64>()
    }
}

/// Reject bin counts outside `1..=MAX_BINS`
///
/// # Errors
///
/// Returns [`AggregateError::InvalidArgument`] for zero or too many bins.
pub fn validate_bins(bins: usize) -> Result<()> {
    if bins == 0 || bins > MAX_BINS {
        return Err(AggregateError::invalid_argument(format!(
            "number of histogram bins must be between 1 and {MAX_BINS}, got {bins}"
        )));
    }
    Ok(())
}

/// Shannon entropy of a sample estimated from a histogram with `bins` bins
///
/// NaN samples are ignored. A sample without variation has zero entropy and
/// no histogram is built for it.
#[must_use]
pub fn histogram_entropy(samples: &[f64], bins: usize, parzen: bool) -> f64 {
    let Some((min, max)) = finite_min_max(samples.iter().copied()) else {
        return 0.0;
    };
    if min >= max {
        return 0.0;
    }
    let Ok(mut hist) = Histogram1D::new(bins, min, max) else {
        return 0.0;
    };
    for &value in samples {
        hist.add_sample(value);
    }
    if parzen {
        hist.smooth();
    }
    hist.entropy()
}
