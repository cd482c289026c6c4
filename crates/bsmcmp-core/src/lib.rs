//! Structural equivalence checks for hierarchical scientific datasets.
//!
//! Two dataset trees (groups, variables and attributes) are walked in
//! lock-step through a [`modules::FormatAdapter`]; payloads are compared
//! exactly (NaN-aware) and attributes key by key. [`modules::BatchRunner`]
//! applies the same comparison across two mirrored directory trees.

pub mod adapters;
pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
