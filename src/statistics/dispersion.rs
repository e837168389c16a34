//! Inequality measures over a finite sample
//!
//! Both measures are only defined for strictly positive distributions, so
//! samples are shifted first when their minimum is not positive. The shift is
//! applied in `f64` while accumulating and never written back, so integer
//! samples cannot overflow. [`gini_coefficient`] sorts the caller's buffer.
//!
//! See <https://en.wikipedia.org/wiki/Generalized_entropy_index> and
//! <https://en.wikipedia.org/wiki/Theil_index>.

use crate::errors::{AggregateError, Result};
use std::cmp::Ordering;

/// Sample element type accepted by the inequality measures
pub trait Sample: Copy + PartialOrd + Into<f64> {
    /// Margin kept above zero when shifting a sample to positivity
    const SHIFT_EPSILON: f64;
}

macro_rules! impl_sample {
    ($eps:expr => $($t:ty),+) => {
        $(
            impl Sample for $t {
                const SHIFT_EPSILON: f64 = $eps;
            }
        )+
    };
}

impl_sample!(1e-6 => f32, f64);
impl_sample!(1.0 => i8, i16, i32, u8, u16, u32);

/// Offset that moves the smallest sample to `SHIFT_EPSILON`, 0 if all samples are positive
fn positivity_shift<T: Sample>(samples: &[T]) -> f64 {
    let min = samples
        .iter()
        .map(|&x| Into::<f64>::into(x))
        .fold(f64::INFINITY, f64::min);
    if min <= 0.0 {
        min - T::SHIFT_EPSILON
    } else {
        0.0
    }
}

/// Gini coefficient of a sample in `[0, 1]`
///
/// 0 means all values are equal, values close to 1 mean a single value
/// dominates. The samples are sorted ascending in place. An empty sample
/// yields 0.
pub fn gini_coefficient<T: Sample>(samples: &mut [T]) -> f64 {
    let n = samples.len();
    if n == 0 {
        return 0.0;
    }
    samples.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let shift = positivity_shift(samples);

    let n_f = n as f64;
    let (weighted, total) = samples
        .iter()
        .enumerate()
        .fold((0.0_f64, 0.0_f64), |(weighted, total), (rank, &x)| {
            // zero-based rank: 2 * (rank + 1) - n - 1
            let x = Into::<f64>::into(x) - shift;
            (weighted + (2.0 * rank as f64 - n_f + 1.0) * x, total + x)
        });
    weighted / (n_f * total)
}

/// Generalized entropy index GE(alpha)
///
/// alpha = 0 is the mean log deviation, alpha = 1 the Theil index and
/// alpha = 2 half the squared coefficient of variation.
///
/// # Errors
///
/// Returns [`AggregateError::InvalidArgument`] for a negative or non-finite alpha.
pub fn entropy_index<T: Sample>(samples: &[T], alpha: f64) -> Result<f64> {
    validate_alpha(alpha)?;
    Ok(entropy_index_unchecked(samples, alpha))
}

/// Theil index, GE(1)
pub fn theil_index<T: Sample>(samples: &[T]) -> f64 {
    entropy_index_unchecked(samples, 1.0)
}

/// Reject alpha values for which GE is not defined here
///
/// # Errors
///
/// Returns [`AggregateError::InvalidArgument`] for a negative or non-finite alpha.
pub fn validate_alpha(alpha: f64) -> Result<()> {
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(AggregateError::invalid_argument(format!(
            "alpha must be non-negative, got {alpha}"
        )));
    }
    Ok(())
}

/// GE(alpha) for an already validated alpha
pub(crate) fn entropy_index_unchecked<T: Sample>(samples: &[T], alpha: f64) -> f64 {
    let n = samples.len();
    if n == 0 {
        return 0.0;
    }
    let shift = positivity_shift(samples);
    let shifted = || samples.iter().map(move |&x| Into::<f64>::into(x) - shift);

    let n_f = n as f64;
    let mean = shifted().sum::<f64>() / n_f;
    let ratios = shifted().map(|x| x / mean);

    let sum = if alpha == 0.0 {
        -ratios.map(f64::ln).sum::<f64>()
    } else if alpha == 1.0 {
        ratios.map(|p| p * p.ln()).sum::<f64>()
    } else if alpha == 2.0 {
        let sum_sq: f64 = shifted().map(|x| x * x).sum();
        (sum_sq / (mean * mean) - n_f) / 2.0
    } else {
        (ratios.map(|p| p.powf(alpha)).sum::<f64>() - n_f) / (alpha * (alpha - 1.0))
    };
    sum / n_f
}
