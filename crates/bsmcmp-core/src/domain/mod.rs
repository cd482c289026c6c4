pub mod errors;

pub use errors::{CmpError, CmpErrorCategory, CmpResult};

use crate::numerics::nan_aware_eq;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// A single attribute value. Floats compare NaN-aware and integers compare
/// numerically against floats.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Array(Vec<AttrValue>),
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(lhs), Self::Bool(rhs)) => lhs == rhs,
            (Self::Int(lhs), Self::Int(rhs)) => lhs == rhs,
            (Self::Float(lhs), Self::Float(rhs)) => nan_aware_eq(*lhs, *rhs),
            (Self::Int(lhs), Self::Float(rhs)) | (Self::Float(rhs), Self::Int(lhs)) => {
                *lhs as f64 == *rhs
            }
            (Self::Text(lhs), Self::Text(rhs)) => lhs == rhs,
            (Self::Array(lhs), Self::Array(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl Display for AttrValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
            Self::Text(value) => write!(f, "{:?}", value),
            Self::Array(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

pub type AttributeSet = BTreeMap<String, AttrValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Numeric,
    NonNumeric,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValues {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl PayloadValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn dtype(&self) -> DType {
        match self {
            Self::Numeric(_) => DType::Numeric,
            Self::Text(_) => DType::NonNumeric,
        }
    }
}

/// Leaf content: a row-major n-dimensional array.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    shape: Vec<usize>,
    values: PayloadValues,
}

impl Payload {
    pub fn new(shape: Vec<usize>, values: PayloadValues) -> CmpResult<Self> {
        let expected = shape.iter().product::<usize>();
        if expected != values.len() {
            return Err(CmpError::input_validation(
                "INPUT.PAYLOAD_SHAPE",
                format!(
                    "shape {:?} requires {} element(s) but {} were supplied",
                    shape,
                    expected,
                    values.len()
                ),
            ));
        }
        Ok(Self { shape, values })
    }

    pub fn numeric_vector(values: Vec<f64>) -> Self {
        Self {
            shape: vec![values.len()],
            values: PayloadValues::Numeric(values),
        }
    }

    pub fn text_vector(values: Vec<String>) -> Self {
        Self {
            shape: vec![values.len()],
            values: PayloadValues::Text(values),
        }
    }

    pub fn numeric_scalar(value: f64) -> Self {
        Self {
            shape: Vec::new(),
            values: PayloadValues::Numeric(vec![value]),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &PayloadValues {
        &self.values
    }

    pub const fn dtype(&self) -> DType {
        self.values.dtype()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonResult {
    pub data_match: bool,
    pub attr_match: bool,
}

impl ComparisonResult {
    pub const fn new(data_match: bool, attr_match: bool) -> Self {
        Self {
            data_match,
            attr_match,
        }
    }

    pub const fn is_match(self) -> bool {
        self.data_match && self.attr_match
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    pub file_count: usize,
    pub mismatch_count: usize,
    pub mismatch_attr_count: usize,
    pub missing_count: usize,
}

impl RunStats {
    pub fn record(&mut self, result: ComparisonResult) {
        self.file_count += 1;
        if !result.data_match {
            self.mismatch_count += 1;
        }
        if !result.attr_match {
            self.mismatch_attr_count += 1;
        }
    }

    pub const fn has_mismatch(&self) -> bool {
        self.mismatch_count > 0 || self.mismatch_attr_count > 0
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("{} files checked!", self.file_count),
            format!("    mismatch: {}", self.mismatch_count),
            format!("    attribute mismatch: {}", self.mismatch_attr_count),
        ];
        if self.missing_count > 0 {
            lines.push(format!("    missing: {}", self.missing_count));
        }
        lines
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    SinglePair,
    Batch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    StoppedEarly,
    Aborted(CmpError),
}

impl RunOutcome {
    pub fn aborted_error(&self) -> Option<&CmpError> {
        match self {
            Self::Aborted(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub stats: RunStats,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub const fn is_aborted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Aborted(_))
    }

    /// 0 when everything matched, 1 on any mismatch, the fault's code on abort.
    pub fn exit_code(&self) -> i32 {
        match &self.outcome {
            RunOutcome::Aborted(error) => error.exit_code(),
            _ if self.stats.has_mismatch() => 1,
            _ => 0,
        }
    }
}
