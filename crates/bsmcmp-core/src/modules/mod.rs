pub mod attributes;
pub mod batch;
pub mod config;
pub mod data;
pub mod engine;
pub mod reporter;

mod dispatch;
mod traits;

pub use attributes::{AttributeComparison, AttributeMismatch, compare_attributes};
pub use batch::{BatchRunner, collect_candidate_files, counterpart_path};
pub use config::{
    ComparePatterns, ConfigError, ConfigOverrides, DEFAULT_CONFIG_FILE, RunConfig,
    load_config_or_report, load_config_section, resolve_config,
};
pub use data::{DataComparison, DataMismatch, ErrorStats, compare_payloads};
pub use dispatch::{
    AdapterKind, FormatRun, RunRequest, RunTarget, execute_format_run, format_unavailable_error,
};
pub use engine::ComparisonEngine;
pub use reporter::{Level, Message, Reporter, Tone};
pub use traits::{ChildNodes, FormatAdapter};
