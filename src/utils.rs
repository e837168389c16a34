//! Small numeric helpers shared by the normalizer and the measures

/// Absolute tolerance used when testing a statistic for equality.
pub const FLOAT_TOLERANCE: f64 = 1e-12;

/// Approximate floating-point equality with [`FLOAT_TOLERANCE`].
#[inline]
#[must_use]
pub fn fequal(a: f64, b: f64) -> bool {
    (a - b).abs() <= FLOAT_TOLERANCE
}

/// Minimum and maximum over the non-NaN values of a sequence.
///
/// Returns `None` when every value is NaN or the sequence is empty.
#[must_use]
pub fn finite_min_max<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
