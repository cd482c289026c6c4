/// Compensated (Kahan) summation.
pub fn stable_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for value in values {
        let corrected = value - correction;
        let next = sum + corrected;
        correction = (next - sum) - corrected;
        sum = next;
    }

    sum
}

/// Exact equality where two NaNs are considered equal.
pub fn nan_aware_eq(lhs: f64, rhs: f64) -> bool {
    lhs == rhs || (lhs.is_nan() && rhs.is_nan())
}

/// Maximum ignoring NaN; `None` when every value is NaN or the slice is empty.
pub fn nan_max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|value| !value.is_nan())
        .fold(None, |max, value| match max {
            Some(current) if current >= value => Some(current),
            _ => Some(value),
        })
}

pub fn nan_mean(values: &[f64]) -> Option<f64> {
    let count = values.iter().filter(|value| !value.is_nan()).count();
    if count == 0 {
        return None;
    }
    let sum = stable_sum(values.iter().copied().filter(|value| !value.is_nan()));
    Some(sum / count as f64)
}

/// Population standard deviation ignoring NaN.
pub fn nan_std(values: &[f64]) -> Option<f64> {
    let mean = nan_mean(values)?;
    let count = values.iter().filter(|value| !value.is_nan()).count();
    let squared = stable_sum(
        values
            .iter()
            .copied()
            .filter(|value| !value.is_nan())
            .map(|value| (value - mean) * (value - mean)),
    );
    Some((squared / count as f64).sqrt())
}

/// Converts a flat row-major index into coordinates for `shape`.
pub fn unravel_index(mut flat_index: usize, shape: &[usize]) -> Vec<usize> {
    let mut coordinates = vec![0; shape.len()];
    for (axis, &extent) in shape.iter().enumerate().rev() {
        if extent == 0 {
            continue;
        }
        coordinates[axis] = flat_index % extent;
        flat_index /= extent;
    }
    coordinates
}
