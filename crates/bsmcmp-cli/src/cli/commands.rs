use super::CliError;
use super::helpers::{flag_pair, patterns_option};
use anyhow::Context;
use bsmcmp_core::modules::{
    AdapterKind, ConfigOverrides, DEFAULT_CONFIG_FILE, Level, Reporter, RunRequest, RunTarget,
    execute_format_run,
};
use std::io::Write;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
#[command(group(clap::ArgGroup::new("target").required(true).args(["file1", "folder1"])))]
pub(super) struct CompareArgs {
    /// File extension filter for folder runs (defaults to the format's own)
    #[arg(long)]
    ext: Option<String>,

    /// 1st file
    #[arg(long, requires = "file2", conflicts_with_all = ["folder1", "folder2"])]
    file1: Option<PathBuf>,

    /// 2nd file
    #[arg(long, requires = "file1")]
    file2: Option<PathBuf>,

    /// 1st top folder
    #[arg(long, requires = "folder2")]
    folder1: Option<PathBuf>,

    /// 2nd top folder; must mirror the structure of folder1
    #[arg(long, requires = "folder1")]
    folder2: Option<PathBuf>,

    /// Stop when any data mismatch is seen (folder runs, default)
    #[arg(long, alias = "stop_on_mismatch", overrides_with = "no_stop_on_mismatch")]
    stop_on_mismatch: bool,

    #[arg(long, alias = "no-stop_on_mismatch", overrides_with = "stop_on_mismatch")]
    no_stop_on_mismatch: bool,

    /// Stop when any attribute mismatch is seen
    #[arg(long, alias = "stop_on_attr_mismatch", overrides_with = "no_stop_on_attr_mismatch")]
    stop_on_attr_mismatch: bool,

    #[arg(
        long,
        alias = "no-stop_on_attr_mismatch",
        overrides_with = "stop_on_attr_mismatch"
    )]
    no_stop_on_attr_mismatch: bool,

    /// Search sub-folders recursively (default)
    #[arg(long, overrides_with = "no_recursive")]
    recursive: bool,

    #[arg(long, overrides_with = "recursive")]
    no_recursive: bool,

    /// File path pattern to ignore (regex, repeatable)
    #[arg(short = 'i', long, alias = "ignore_pattern")]
    ignore_pattern: Vec<String>,

    /// Variable name pattern to ignore (regex, repeatable)
    #[arg(long, alias = "ignore_var")]
    ignore_var: Vec<String>,

    /// Attribute name pattern to ignore (regex, repeatable)
    #[arg(long, alias = "ignore_attr")]
    ignore_attr: Vec<String>,

    /// Verbosity: 0 none, 1 error, 2 warn, 3 info, 4 max, 5 auto
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=5))]
    verbose: Option<u8>,

    /// YAML configuration file; a missing file is ignored
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

impl CompareArgs {
    fn into_request(self) -> Result<RunRequest, CliError> {
        let target = match (self.file1, self.file2, self.folder1, self.folder2) {
            (Some(file1), Some(file2), None, None) => RunTarget::Pair { file1, file2 },
            (None, None, Some(folder1), Some(folder2)) => RunTarget::Batch { folder1, folder2 },
            _ => {
                return Err(CliError::Usage(
                    "pass either --file1/--file2 or --folder1/--folder2".to_string(),
                ));
            }
        };

        let overrides = ConfigOverrides {
            ext: self.ext,
            recursive: flag_pair(self.recursive, self.no_recursive),
            ignore_pattern: patterns_option(self.ignore_pattern),
            ignore_var: patterns_option(self.ignore_var),
            ignore_attr: patterns_option(self.ignore_attr),
            stop_on_mismatch: flag_pair(self.stop_on_mismatch, self.no_stop_on_mismatch),
            stop_on_attr_mismatch: flag_pair(
                self.stop_on_attr_mismatch,
                self.no_stop_on_attr_mismatch,
            ),
            verbose: self.verbose.and_then(Level::from_index),
        };

        Ok(RunRequest {
            target,
            config_path: Some(self.config),
            overrides,
        })
    }
}

pub(super) fn run_compare_command(kind: AdapterKind, args: CompareArgs) -> Result<i32, CliError> {
    let request = args.into_request()?;
    tracing::debug!(format = %kind, ?request, "dispatching compare command");

    let run = execute_format_run(kind, &request, Reporter::console(Level::Auto))
        .map_err(CliError::Compare)?;
    if let Some(error) = run.report.outcome.aborted_error() {
        if let Some(summary_line) = error.fatal_exit_line() {
            eprintln!("{}", summary_line);
        }
    }
    Ok(run.report.exit_code())
}

pub(super) fn run_formats_command() -> Result<i32, CliError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for kind in AdapterKind::available_formats() {
        writeln!(out, "{:<8}{}", kind.as_str(), kind.default_extension())
            .context("failed to write the format list")?;
    }
    Ok(0)
}
