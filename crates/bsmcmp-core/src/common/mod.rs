pub mod patterns;

pub use patterns::{IgnorePatterns, PatternError};
