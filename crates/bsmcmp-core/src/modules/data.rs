//! Leaf payload comparison: exact, NaN-aware equality plus error statistics.

use crate::domain::{DType, Payload, PayloadValues};
use crate::numerics::{nan_aware_eq, nan_max, nan_mean, nan_std, unravel_index};

#[derive(Debug, Clone, PartialEq)]
pub enum DataMismatch {
    Shape { first: Vec<usize>, second: Vec<usize> },
    DType { first: DType, second: DType },
    Values { differing: usize },
}

/// Informational statistics over `|d1 - d2|`; they never change the verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorStats {
    /// NaN when every error is NaN.
    pub max_error: f64,
    /// Every coordinate reaching `max_error`.
    pub max_positions: Vec<Vec<usize>>,
    /// Values of both sides at the first max coordinate.
    pub sample: Option<(f64, f64)>,
    pub mean_error: f64,
    pub std_error: f64,
    pub zero_error_count: usize,
    pub element_count: usize,
}

impl ErrorStats {
    pub fn zero_error_percent(&self) -> f64 {
        if self.element_count == 0 {
            return 100.0;
        }
        self.zero_error_count as f64 * 100.0 / self.element_count as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataComparison {
    pub matched: bool,
    pub mismatch: Option<DataMismatch>,
    pub stats: Option<ErrorStats>,
}

impl DataComparison {
    const fn matched() -> Self {
        Self {
            matched: true,
            mismatch: None,
            stats: None,
        }
    }

    const fn mismatched(mismatch: DataMismatch, stats: Option<ErrorStats>) -> Self {
        Self {
            matched: false,
            mismatch: Some(mismatch),
            stats,
        }
    }
}

pub fn compare_payloads(first: &Payload, second: &Payload) -> DataComparison {
    if first.shape() != second.shape() {
        return DataComparison::mismatched(
            DataMismatch::Shape {
                first: first.shape().to_vec(),
                second: second.shape().to_vec(),
            },
            None,
        );
    }

    // 0-d data is not error-compared.
    if first.shape().is_empty() {
        return DataComparison::matched();
    }

    match (first.values(), second.values()) {
        (PayloadValues::Numeric(lhs), PayloadValues::Numeric(rhs)) => {
            let differing = lhs
                .iter()
                .zip(rhs.iter())
                .filter(|(left, right)| !nan_aware_eq(**left, **right))
                .count();
            if differing == 0 {
                return DataComparison::matched();
            }
            DataComparison::mismatched(
                DataMismatch::Values { differing },
                Some(error_stats(lhs, rhs, first.shape())),
            )
        }
        (PayloadValues::Text(lhs), PayloadValues::Text(rhs)) => {
            let differing = lhs
                .iter()
                .zip(rhs.iter())
                .filter(|(left, right)| left != right)
                .count();
            if differing == 0 {
                DataComparison::matched()
            } else {
                DataComparison::mismatched(DataMismatch::Values { differing }, None)
            }
        }
        (lhs, rhs) => DataComparison::mismatched(
            DataMismatch::DType {
                first: lhs.dtype(),
                second: rhs.dtype(),
            },
            None,
        ),
    }
}

fn error_stats(first: &[f64], second: &[f64], shape: &[usize]) -> ErrorStats {
    let errors: Vec<f64> = first
        .iter()
        .zip(second.iter())
        .map(|(lhs, rhs)| (lhs - rhs).abs())
        .collect();

    let max_error = nan_max(&errors).unwrap_or(f64::NAN);
    let max_indices: Vec<usize> = errors
        .iter()
        .enumerate()
        .filter(|(_, error)| **error == max_error)
        .map(|(index, _)| index)
        .collect();
    let sample = max_indices
        .first()
        .map(|&index| (first[index], second[index]));

    ErrorStats {
        max_error,
        max_positions: max_indices
            .iter()
            .map(|&index| unravel_index(index, shape))
            .collect(),
        sample,
        mean_error: nan_mean(&errors).unwrap_or(f64::NAN),
        std_error: nan_std(&errors).unwrap_or(f64::NAN),
        zero_error_count: errors.iter().filter(|error| **error == 0.0).count(),
        element_count: errors.len(),
    }
}
