use super::batch::BatchRunner;
use super::config::{ConfigOverrides, RunConfig, load_config_or_report, resolve_config};
use super::reporter::Reporter;
use super::traits::FormatAdapter;
use crate::adapters::{AsciiAdapter, JsonAdapter};
use crate::domain::{CmpError, CmpResult, RunReport};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    Ascii,
    Csv,
    Json,
}

impl AdapterKind {
    pub const ALL: [AdapterKind; 3] = [Self::Ascii, Self::Csv, Self::Json];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub const fn default_extension(self) -> &'static str {
        match self {
            Self::Ascii => ".txt",
            Self::Csv => ".csv",
            Self::Json => ".json",
        }
    }

    /// Case-insensitive, matching config section lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }

    /// Feature-gated adapters report unavailable when compiled out.
    pub const fn available(self) -> bool {
        match self {
            Self::Ascii | Self::Json => true,
            Self::Csv => cfg!(feature = "csv"),
        }
    }

    pub fn available_formats() -> Vec<AdapterKind> {
        Self::ALL.into_iter().filter(|kind| kind.available()).collect()
    }
}

impl Display for AdapterKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn format_unavailable_error(kind: AdapterKind) -> CmpError {
    CmpError::input_validation(
        "INPUT.FORMAT_UNAVAILABLE",
        format!("format '{}' is not available in this build", kind),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTarget {
    Pair { file1: PathBuf, file2: PathBuf },
    Batch { folder1: PathBuf, folder2: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub target: RunTarget,
    /// Skipped silently when the file does not exist.
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug)]
pub struct FormatRun {
    pub report: RunReport,
    pub reporter: Reporter,
}

pub fn execute_format_run(
    kind: AdapterKind,
    request: &RunRequest,
    reporter: Reporter,
) -> CmpResult<FormatRun> {
    if !kind.available() {
        return Err(format_unavailable_error(kind));
    }

    match kind {
        AdapterKind::Ascii => execute_with(AsciiAdapter, request, reporter),
        AdapterKind::Json => execute_with(JsonAdapter, request, reporter),
        #[cfg(feature = "csv")]
        AdapterKind::Csv => execute_with(crate::adapters::CsvAdapter, request, reporter),
        #[cfg(not(feature = "csv"))]
        AdapterKind::Csv => Err(format_unavailable_error(kind)),
    }
}

fn execute_with<A: FormatAdapter>(
    adapter: A,
    request: &RunRequest,
    mut reporter: Reporter,
) -> CmpResult<FormatRun> {
    let file = request
        .config_path
        .as_deref()
        .and_then(|path| load_config_or_report(path, adapter.name(), &mut reporter));
    let config = resolve_config(
        RunConfig::defaults_for(adapter.default_extension()),
        file.as_ref(),
        &request.overrides,
    );
    tracing::debug!(format = adapter.name(), ?config, "resolved run configuration");

    let mut runner = BatchRunner::new(adapter, config, reporter)?;
    let report = match &request.target {
        RunTarget::Pair { file1, file2 } => runner.run_pair(file1, file2),
        RunTarget::Batch { folder1, folder2 } => runner.run_batch(folder1, folder2)?,
    };
    Ok(FormatRun {
        report,
        reporter: runner.into_reporter(),
    })
}

#[cfg(test)]
mod tests {
    use super::{AdapterKind, RunRequest, RunTarget, execute_format_run};
    use crate::domain::{CmpErrorCategory, RunOutcome};
    use crate::modules::config::ConfigOverrides;
    use crate::modules::reporter::{Level, Reporter};
    use tempfile::TempDir;

    #[test]
    fn registry_lookup_is_case_insensitive() {
        assert_eq!(AdapterKind::from_name("JSON"), Some(AdapterKind::Json));
        assert_eq!(AdapterKind::from_name("Ascii"), Some(AdapterKind::Ascii));
        assert_eq!(AdapterKind::from_name("netcdf"), None);
        assert!(AdapterKind::available_formats().contains(&AdapterKind::Json));
        assert_eq!(
            AdapterKind::Csv.available(),
            AdapterKind::available_formats().contains(&AdapterKind::Csv)
        );
    }

    #[test]
    fn config_file_section_applies_unless_invocation_overrides() {
        let temp = TempDir::new().expect("tempdir should be created");
        let left = temp.path().join("left");
        let right = temp.path().join("right");
        std::fs::create_dir_all(&left).expect("left root should be created");
        std::fs::create_dir_all(&right).expect("right root should be created");
        std::fs::write(left.join("a.log"), "one\ntwo\n").expect("fixture should be written");
        std::fs::write(right.join("a.log"), "one\nTWO\n").expect("fixture should be written");

        let config_path = temp.path().join("file_compare.yml");
        std::fs::write(&config_path, "ASCII:\n  ext: .log\n  stop_on_mismatch: false\n")
            .expect("config should be written");

        let request = RunRequest {
            target: RunTarget::Batch {
                folder1: left.clone(),
                folder2: right.clone(),
            },
            config_path: Some(config_path.clone()),
            overrides: ConfigOverrides::default(),
        };
        let run = execute_format_run(AdapterKind::Ascii, &request, Reporter::captured(Level::Auto))
            .expect("run should execute");
        assert_eq!(run.report.stats.file_count, 1);
        assert_eq!(run.report.stats.mismatch_count, 1);

        let request = RunRequest {
            overrides: ConfigOverrides {
                ext: Some(".txt".to_string()),
                ..ConfigOverrides::default()
            },
            ..request
        };
        let run = execute_format_run(AdapterKind::Ascii, &request, Reporter::captured(Level::Auto))
            .expect("run should execute");
        assert_eq!(run.report.stats.file_count, 0);
        assert_eq!(run.report.outcome, RunOutcome::Completed);
    }

    #[test]
    fn invalid_pattern_fails_before_any_comparison() {
        let request = RunRequest {
            target: RunTarget::Pair {
                file1: "a.json".into(),
                file2: "b.json".into(),
            },
            config_path: None,
            overrides: ConfigOverrides {
                ignore_var: Some(vec!["[".to_string()]),
                ..ConfigOverrides::default()
            },
        };
        let error = execute_format_run(AdapterKind::Json, &request, Reporter::captured(Level::Auto))
            .expect_err("invalid regex should fail");
        assert_eq!(error.category(), CmpErrorCategory::InputValidationError);
    }
}
