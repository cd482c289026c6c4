//! Single-pair and mirrored-directory runs.
//!
//! A batch walks every candidate file under the first root, derives its
//! counterpart under the second root and compares the pair. Mismatches are
//! counted and may stop the run cooperatively; adapter faults abort it.

use super::config::{ComparePatterns, RunConfig};
use super::engine::ComparisonEngine;
use super::reporter::{Level, Reporter};
use super::traits::FormatAdapter;
use crate::domain::{
    CmpError, CmpResult, ComparisonResult, RunMode, RunOutcome, RunReport, RunStats,
};
use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};

pub struct BatchRunner<A: FormatAdapter> {
    adapter: A,
    config: RunConfig,
    patterns: ComparePatterns,
    reporter: Reporter,
    stats: RunStats,
    stop: bool,
}

impl<A: FormatAdapter> BatchRunner<A> {
    /// Fails when any ignore pattern is not a valid regular expression.
    pub fn new(adapter: A, config: RunConfig, reporter: Reporter) -> CmpResult<Self> {
        let patterns = config.compile()?;
        Ok(Self {
            adapter,
            config,
            patterns,
            reporter,
            stats: RunStats::default(),
            stop: false,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn into_reporter(self) -> Reporter {
        self.reporter
    }

    /// Opens both files and compares them as whole trees.
    pub fn compare_files(&mut self, file1: &Path, file2: &Path) -> CmpResult<ComparisonResult> {
        tracing::debug!(
            file1 = %file1.display(),
            file2 = %file2.display(),
            format = self.adapter.name(),
            "comparing file pair"
        );
        let root1 = self
            .adapter
            .open(file1)
            .map_err(|error| error.with_context(file1.display()))?;
        let root2 = self
            .adapter
            .open(file2)
            .map_err(|error| error.with_context(file2.display()))?;

        let result = ComparisonEngine::new(&self.adapter, &self.patterns, &mut self.reporter)
            .compare_tree(&root1, &root2)
            .map_err(|error| {
                error.with_context(format!("{} vs {}", file1.display(), file2.display()))
            })?;

        self.adapter.close(root1)?;
        self.adapter.close(root2)?;
        Ok(result)
    }

    /// Single-pair mode never stops early and is always fully verbose; the
    /// resolved stop flags and verbosity apply to batches only.
    pub fn run_pair(&mut self, file1: &Path, file2: &Path) -> RunReport {
        self.reset(Level::Max);

        let outcome = match self.compare_files(file1, file2) {
            Ok(result) => {
                self.stats.record(result);
                if result.is_match() {
                    self.reporter.success(
                        Level::Error,
                        format!("{} and {} match", file1.display(), file2.display()),
                    );
                } else {
                    self.reporter.error(
                        Level::Error,
                        format!("{} and {} differ", file1.display(), file2.display()),
                    );
                }
                RunOutcome::Completed
            }
            Err(error) => self.abort(file1, file2, error),
        };
        self.finish(outcome)
    }

    /// Returns `Err` only when the first root cannot be enumerated; faults
    /// while comparing a pair end the run with `RunOutcome::Aborted`.
    pub fn run_batch(&mut self, folder1: &Path, folder2: &Path) -> CmpResult<RunReport> {
        self.reset(self.config.verbose.resolve(RunMode::Batch));
        let files = collect_candidate_files(folder1, &self.config.ext, self.config.recursive)?;
        tracing::debug!(
            folder1 = %folder1.display(),
            folder2 = %folder2.display(),
            candidates = files.len(),
            "batch enumeration complete"
        );

        let mut outcome = RunOutcome::Completed;
        for file1 in &files {
            if self.stop {
                outcome = RunOutcome::StoppedEarly;
                break;
            }
            if self.patterns.files.is_match(&file1.to_string_lossy()) {
                tracing::debug!(file1 = %file1.display(), "file ignored");
                continue;
            }

            let file2 = counterpart_path(folder1, folder2, file1);
            if !file2.is_file() {
                self.stats.missing_count += 1;
                tracing::warn!(file1 = %file1.display(), file2 = %file2.display(), "counterpart missing");
                self.reporter
                    .warning(Level::Warn, format!("can't find file: {}", file2.display()));
                continue;
            }

            self.reporter.begin_delay();
            self.reporter.echo(Level::Error, file1.display().to_string());
            let result = match self.compare_files(file1, &file2) {
                Ok(result) => result,
                Err(error) => {
                    outcome = self.abort(file1, &file2, error);
                    break;
                }
            };

            self.stats.record(result);
            if !result.is_match() {
                self.reporter.error(Level::None, format!("mismatch: {}", file1.display()));
                self.reporter.error(Level::None, format!("      vs: {}", file2.display()));
            }
            self.reporter.end_delay();

            if (self.config.stop_on_mismatch && !result.data_match)
                || (self.config.stop_on_attr_mismatch && !result.attr_match)
            {
                self.stop = true;
            }
        }

        Ok(self.finish(outcome))
    }

    fn reset(&mut self, verbosity: Level) {
        self.stats = RunStats::default();
        self.stop = false;
        self.reporter.set_verbosity(verbosity);
    }

    fn abort(&mut self, file1: &Path, file2: &Path, error: CmpError) -> RunOutcome {
        self.reporter.flush_pending();
        tracing::error!(
            file1 = %file1.display(),
            file2 = %file2.display(),
            code = error.placeholder(),
            "{}",
            error.message()
        );
        self.reporter.error(
            Level::None,
            format!("failed to compare {} and {}", file1.display(), file2.display()),
        );
        self.reporter.error(Level::None, error.diagnostic_line());
        RunOutcome::Aborted(error)
    }

    fn finish(&mut self, outcome: RunOutcome) -> RunReport {
        let clean = !self.stats.has_mismatch() && !matches!(outcome, RunOutcome::Aborted(_));
        for (index, line) in self.stats.summary_lines().into_iter().enumerate() {
            match index {
                0 if clean => self.reporter.success(Level::None, line),
                0 => self.reporter.error(Level::None, line),
                _ => self.reporter.echo(Level::None, line),
            }
        }
        tracing::info!(
            files = self.stats.file_count,
            mismatches = self.stats.mismatch_count,
            attribute_mismatches = self.stats.mismatch_attr_count,
            missing = self.stats.missing_count,
            "run finished"
        );
        RunReport {
            stats: self.stats,
            outcome,
        }
    }
}

/// Literal replacement of every occurrence of `root1` with `root2`. Paths in
/// which `root1` also appears as an unrelated segment are rewritten too.
pub fn counterpart_path(root1: &Path, root2: &Path, file: &Path) -> PathBuf {
    let root1 = root1.to_string_lossy();
    if root1.is_empty() {
        return root2.join(file);
    }
    let root2 = root2.to_string_lossy();
    PathBuf::from(file.to_string_lossy().replace(&*root1, &root2))
}

/// Sorted files under `root` whose name ends with `ext`. Hidden entries are
/// skipped; without `recursive` only the top level is listed.
pub fn collect_candidate_files(root: &Path, ext: &str, recursive: bool) -> CmpResult<Vec<PathBuf>> {
    let matcher = Glob::new(&format!("*{}", ext))
        .map_err(|source| {
            CmpError::input_validation(
                "INPUT.EXTENSION_FILTER",
                format!("invalid extension filter '{}': {}", ext, source),
            )
        })?
        .compile_matcher();

    let mut results = Vec::new();
    collect_candidate_files_recursive(root, &matcher, recursive, &mut results)?;
    results.sort();
    Ok(results)
}

fn collect_candidate_files_recursive(
    current_dir: &Path,
    matcher: &GlobMatcher,
    recursive: bool,
    results: &mut Vec<PathBuf>,
) -> CmpResult<()> {
    let read_error = |path: &Path, source: std::io::Error| {
        CmpError::io_system(
            "IO.BATCH_ENUMERATE",
            format!("failed to read directory '{}': {}", path.display(), source),
        )
    };

    let directory = fs::read_dir(current_dir).map_err(|source| read_error(current_dir, source))?;
    for entry in directory {
        let entry = entry.map_err(|source| read_error(current_dir, source))?;
        let entry_path = entry.path();
        let file_name = entry.file_name();
        if file_name.to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry
            .file_type()
            .map_err(|source| read_error(&entry_path, source))?;

        if file_type.is_dir() {
            if recursive {
                collect_candidate_files_recursive(&entry_path, matcher, recursive, results)?;
            }
            continue;
        }

        if file_type.is_file() && matcher.is_match(&file_name) {
            results.push(entry_path);
        }
    }

    Ok(())
}
