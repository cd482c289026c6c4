//! Regular-expression exclusion lists for file, variable and attribute names.
//!
//! A name is excluded when any pattern is found anywhere inside it, so an
//! anchored pattern such as `^y$` is needed to exclude exactly `y`.

use crate::domain::CmpError;
use regex::Regex;

#[derive(Debug, thiserror::Error)]
#[error("invalid ignore pattern '{pattern}': {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

impl From<PatternError> for CmpError {
    fn from(error: PatternError) -> Self {
        CmpError::input_validation("INPUT.IGNORE_PATTERN", error.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct IgnorePatterns {
    patterns: Vec<Regex>,
}

impl IgnorePatterns {
    pub fn new<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|source| PatternError {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(name))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
