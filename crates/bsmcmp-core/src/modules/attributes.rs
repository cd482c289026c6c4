use crate::common::IgnorePatterns;
use crate::domain::{AttrValue, AttributeSet};

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeMismatch {
    pub key: String,
    pub first: AttrValue,
    pub second: AttrValue,
}

/// Outcome of comparing two attribute sets.
///
/// Keys present on only one side are listed but do not affect `matched`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeComparison {
    pub matched: bool,
    pub only_in_first: Vec<String>,
    pub only_in_second: Vec<String>,
    pub ignored: Vec<String>,
    pub mismatches: Vec<AttributeMismatch>,
}

impl AttributeComparison {
    pub fn has_key_skew(&self) -> bool {
        !self.only_in_first.is_empty() || !self.only_in_second.is_empty()
    }
}

pub fn compare_attributes(
    first: &AttributeSet,
    second: &AttributeSet,
    ignore: &IgnorePatterns,
) -> AttributeComparison {
    let only_in_first = first
        .keys()
        .filter(|key| !second.contains_key(*key))
        .cloned()
        .collect();
    let only_in_second = second
        .keys()
        .filter(|key| !first.contains_key(*key))
        .cloned()
        .collect();

    let mut ignored = Vec::new();
    let mut mismatches = Vec::new();
    for (key, first_value) in first {
        let Some(second_value) = second.get(key) else {
            continue;
        };
        if ignore.is_match(key) {
            ignored.push(key.clone());
            continue;
        }
        if first_value != second_value {
            mismatches.push(AttributeMismatch {
                key: key.clone(),
                first: first_value.clone(),
                second: second_value.clone(),
            });
        }
    }

    AttributeComparison {
        matched: mismatches.is_empty(),
        only_in_first,
        only_in_second,
        ignored,
        mismatches,
    }
}
