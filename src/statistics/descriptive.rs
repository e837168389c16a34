//! Descriptive statistics over masked sample arrays and voxel columns
//!
//! The masked variants feed the intensity normalizer, the column variants
//! implement the mean / median / standard deviation aggregation functions.
//! NaN entries of a column are treated as missing.

/// Mean of the samples selected by `mask`, `None` for an empty selection
#[must_use]
pub fn masked_mean(data: &[f64], mask: &[bool]) -> Option<f64> {
    let (sum, count) = data
        .iter()
        .zip(mask)
        .filter(|&(_, &m)| m)
        .fold((0.0_f64, 0_usize), |(s, n), (&v, _)| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Median of the samples selected by `mask`, `None` for an empty selection
#[must_use]
pub fn masked_median(data: &[f64], mask: &[bool]) -> Option<f64> {
    let mut selected: Vec<f64> = data
        .iter()
        .zip(mask)
        .filter(|&(_, &m)| m)
        .map(|(&v, _)| v)
        .collect();
    median_in_place(&mut selected)
}

/// Mean and population standard deviation of the masked samples
#[must_use]
pub fn masked_mean_stdev(data: &[f64], mask: &[bool]) -> Option<(f64, f64)> {
    let mean = masked_mean(data, mask)?;
    let (sum_sq, count) = data
        .iter()
        .zip(mask)
        .filter(|&(_, &m)| m)
        .fold((0.0_f64, 0_usize), |(s, n), (&v, _)| {
            let d = v - mean;
            (s + d * d, n + 1)
        });
    Some((mean, (sum_sq / count as f64).sqrt()))
}

/// Minimum and maximum of the masked samples
#[must_use]
pub fn masked_extrema(data: &[f64], mask: &[bool]) -> Option<(f64, f64)> {
    data.iter()
        .zip(mask)
        .filter(|&(_, &m)| m)
        .fold(None, |acc, (&v, _)| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

/// Mean of the non-NaN values of a column, NaN if there are none
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0_f64, 0_usize), |(s, n), &v| (s + v, n + 1));
    if count == 0 {
        return f64::NAN;
    }
    sum / count as f64
}

/// Median of the non-NaN values of a column, NaN if there are none.
///
/// Reorders the column.
pub fn median(values: &mut Vec<f64>) -> f64 {
    values.retain(|v| !v.is_nan());
    median_in_place(values).unwrap_or(f64::NAN)
}

/// Population standard deviation of the non-NaN values, NaN if there are none
#[must_use]
pub fn stdev(values: &[f64]) -> f64 {
    let mu = mean(values);
    if mu.is_nan() {
        return f64::NAN;
    }
    let (sum_sq, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0_f64, 0_usize), |(s, n), &v| {
            let d = v - mu;
            (s + d * d, n + 1)
        });
    (sum_sq / count as f64).sqrt()
}

/// Median of a NaN-free slice; even counts average the two middle values
fn median_in_place(values: &mut [f64]) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    values.sort_unstable_by(f64::total_cmp);
    if n % 2 == 1 {
        Some(values[n / 2])
    } else {
        Some(0.5 * (values[n / 2 - 1] + values[n / 2]))
    }
}
