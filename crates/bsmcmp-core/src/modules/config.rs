//! Run configuration layering: built-in defaults, then the format's section of
//! the YAML config file, then values supplied on this invocation.

use super::reporter::{Level, Reporter};
use crate::common::IgnorePatterns;
use crate::domain::{CmpError, CmpResult};
use serde::Deserialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "file_compare.yml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub ext: String,
    pub recursive: bool,
    /// Applied to file paths during a batch run.
    pub ignore_pattern: Vec<String>,
    pub ignore_var: Vec<String>,
    pub ignore_attr: Vec<String>,
    pub stop_on_mismatch: bool,
    pub stop_on_attr_mismatch: bool,
    pub verbose: Level,
}

impl RunConfig {
    pub fn defaults_for(ext: impl Into<String>) -> Self {
        Self {
            ext: ext.into(),
            recursive: true,
            ignore_pattern: Vec::new(),
            ignore_var: Vec::new(),
            ignore_attr: Vec::new(),
            stop_on_mismatch: true,
            stop_on_attr_mismatch: false,
            verbose: Level::Auto,
        }
    }

    pub fn compile(&self) -> CmpResult<ComparePatterns> {
        Ok(ComparePatterns {
            files: IgnorePatterns::new(&self.ignore_pattern)?,
            variables: IgnorePatterns::new(&self.ignore_var)?,
            attributes: IgnorePatterns::new(&self.ignore_attr)?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComparePatterns {
    pub files: IgnorePatterns,
    pub variables: IgnorePatterns,
    pub attributes: IgnorePatterns,
}

/// One layer of option values; `None` means the layer does not set it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub ext: Option<String>,
    pub recursive: Option<bool>,
    #[serde(deserialize_with = "one_or_many")]
    pub ignore_pattern: Option<Vec<String>>,
    #[serde(deserialize_with = "one_or_many")]
    pub ignore_var: Option<Vec<String>>,
    #[serde(deserialize_with = "one_or_many")]
    pub ignore_attr: Option<Vec<String>>,
    pub stop_on_mismatch: Option<bool>,
    pub stop_on_attr_mismatch: Option<bool>,
    pub verbose: Option<Level>,
}

impl ConfigOverrides {
    pub fn apply_to(&self, config: &mut RunConfig) {
        if let Some(ext) = &self.ext {
            config.ext = ext.clone();
        }
        if let Some(recursive) = self.recursive {
            config.recursive = recursive;
        }
        if let Some(patterns) = &self.ignore_pattern {
            config.ignore_pattern = patterns.clone();
        }
        if let Some(patterns) = &self.ignore_var {
            config.ignore_var = patterns.clone();
        }
        if let Some(patterns) = &self.ignore_attr {
            config.ignore_attr = patterns.clone();
        }
        if let Some(stop) = self.stop_on_mismatch {
            config.stop_on_mismatch = stop;
        }
        if let Some(stop) = self.stop_on_attr_mismatch {
            config.stop_on_attr_mismatch = stop;
        }
        if let Some(verbose) = self.verbose {
            config.verbose = verbose;
        }
    }
}

/// Invocation values win over the file section, which wins over defaults.
pub fn resolve_config(
    defaults: RunConfig,
    file: Option<&ConfigOverrides>,
    invocation: &ConfigOverrides,
) -> RunConfig {
    let mut config = defaults;
    if let Some(file) = file {
        file.apply_to(&mut config);
    }
    invocation.apply_to(&mut config);
    config
}

/// Accepts `key: pattern` as well as `key: [a, b]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct PatternsVisitor;

    impl<'de> Visitor<'de> for PatternsVisitor {
        type Value = Option<Vec<String>>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a pattern string or a list of pattern strings")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(vec![value.to_string()]))
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut patterns = Vec::new();
            while let Some(pattern) = seq.next_element::<String>()? {
                patterns.push(pattern);
            }
            Ok(Some(patterns))
        }
    }

    deserializer.deserialize_any(PatternsVisitor)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("'{}' must be a mapping keyed by format name", .path.display())]
    Layout { path: PathBuf },
    #[error("invalid '{section}' section in '{}': {source}", .path.display())]
    Section {
        path: PathBuf,
        section: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl From<ConfigError> for CmpError {
    fn from(error: ConfigError) -> Self {
        let message = error.to_string();
        match error {
            ConfigError::Read { .. } => CmpError::io_system("IO.CONFIG_READ", message),
            _ => CmpError::input_validation("INPUT.CONFIG_FILE", message),
        }
    }
}

/// Reads the section for `format` (case-insensitive). A missing file, an
/// empty file and a file without that section all yield `Ok(None)`.
pub fn load_config_section(
    path: &Path,
    format: &str,
) -> Result<Option<ConfigOverrides>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let sections = match document {
        Value::Null => return Ok(None),
        Value::Mapping(sections) => sections,
        _ => {
            return Err(ConfigError::Layout {
                path: path.to_path_buf(),
            });
        }
    };

    let section = sections.into_iter().find_map(|(key, value)| {
        key.as_str()
            .filter(|key| key.eq_ignore_ascii_case(format))
            .map(|key| (key.to_string(), value))
    });
    let Some((name, value)) = section else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(Some(ConfigOverrides::default()));
    }

    serde_yaml::from_value(value)
        .map(Some)
        .map_err(|source| ConfigError::Section {
            path: path.to_path_buf(),
            section: name,
            source,
        })
}

/// Config load faults are not fatal: they are reported and the run continues
/// without file overrides.
pub fn load_config_or_report(
    path: &Path,
    format: &str,
    reporter: &mut Reporter,
) -> Option<ConfigOverrides> {
    match load_config_section(path, format) {
        Ok(section) => section,
        Err(error) => {
            tracing::warn!(path = %path.display(), format, %error, "config file ignored");
            reporter.error(Level::None, format!("Fail to load {}: {}", path.display(), error));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigOverrides, RunConfig, load_config_or_report, load_config_section, resolve_config,
    };
    use crate::domain::CmpErrorCategory;
    use crate::modules::reporter::{Level, Reporter};
    use std::path::Path;
    use tempfile::TempDir;

    fn write_config(temp: &TempDir, content: &str) -> std::path::PathBuf {
        let path = temp.path().join("file_compare.yml");
        std::fs::write(&path, content).expect("config fixture should be written");
        path
    }

    fn every_option(ext: &str, flag: bool, pattern: &str, verbose: Level) -> ConfigOverrides {
        ConfigOverrides {
            ext: Some(ext.to_string()),
            recursive: Some(flag),
            ignore_pattern: Some(vec![pattern.to_string()]),
            ignore_var: Some(vec![pattern.to_string()]),
            ignore_attr: Some(vec![pattern.to_string()]),
            stop_on_mismatch: Some(flag),
            stop_on_attr_mismatch: Some(flag),
            verbose: Some(verbose),
        }
    }

    #[test]
    fn section_lookup_is_case_insensitive_and_accepts_scalar_patterns() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = write_config(
            &temp,
            "JSON:\n  ext: .nc4\n  recursive: false\n  ignore_var: ^time$\n  ignore_attr: [history, date]\n  verbose: 3\n  unknown_key: 1\nascii:\n  ext: .log\n",
        );

        let section = load_config_section(&path, "json")
            .expect("config should load")
            .expect("json section should exist");
        assert_eq!(section.ext.as_deref(), Some(".nc4"));
        assert_eq!(section.recursive, Some(false));
        assert_eq!(section.ignore_var, Some(vec!["^time$".to_string()]));
        assert_eq!(
            section.ignore_attr,
            Some(vec!["history".to_string(), "date".to_string()])
        );
        assert_eq!(section.verbose, Some(Level::Info));
        assert_eq!(section.stop_on_mismatch, None);

        assert!(
            load_config_section(&path, "csv")
                .expect("config should load")
                .is_none()
        );
    }

    #[test]
    fn missing_file_yields_no_overrides() {
        let section = load_config_section(Path::new("no/such/file_compare.yml"), "json")
            .expect("missing file is not an error");
        assert!(section.is_none());
    }

    #[test]
    fn file_values_apply_over_defaults() {
        let file = every_option(".dat", false, "tmp", Level::Warn);
        let config = resolve_config(
            RunConfig::defaults_for(".json"),
            Some(&file),
            &ConfigOverrides::default(),
        );

        assert_eq!(config.ext, ".dat");
        assert!(!config.recursive);
        assert!(!config.stop_on_mismatch);
        assert_eq!(config.ignore_var, ["tmp"]);
        assert_eq!(config.verbose, Level::Warn);
    }

    #[test]
    fn invocation_values_are_never_overridden_by_the_file() {
        let file = every_option(".dat", false, "from_file", Level::Warn);
        let invocation = every_option(".json", true, "from_call", Level::Error);
        let config = resolve_config(RunConfig::defaults_for(".txt"), Some(&file), &invocation);

        assert_eq!(config.ext, ".json");
        assert!(config.recursive);
        assert_eq!(config.ignore_pattern, ["from_call"]);
        assert_eq!(config.ignore_var, ["from_call"]);
        assert_eq!(config.ignore_attr, ["from_call"]);
        assert!(config.stop_on_mismatch);
        assert!(config.stop_on_attr_mismatch);
        assert_eq!(config.verbose, Level::Error);

        let inverted_file = every_option(".dat", true, "from_file", Level::Warn);
        let inverted_call = every_option(".json", false, "from_call", Level::Error);
        let config = resolve_config(
            RunConfig::defaults_for(".txt"),
            Some(&inverted_file),
            &inverted_call,
        );
        assert!(!config.recursive);
        assert!(!config.stop_on_mismatch);
        assert!(!config.stop_on_attr_mismatch);
    }

    #[test]
    fn malformed_file_is_reported_and_ignored() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = write_config(&temp, "json: [unclosed\n");

        let error = load_config_section(&path, "json").expect_err("malformed yaml should fail");
        assert_eq!(
            crate::domain::CmpError::from(error).category(),
            CmpErrorCategory::InputValidationError
        );

        let mut reporter = Reporter::captured(Level::None);
        assert!(load_config_or_report(&path, "json", &mut reporter).is_none());
        assert!(reporter.contains("Fail to load"));
    }

    #[test]
    fn invalid_verbose_level_is_a_section_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = write_config(&temp, "json:\n  verbose: 9\n");
        let error = load_config_section(&path, "json").expect_err("verbose 9 should fail");
        assert!(error.to_string().contains("json"));
    }

    #[test]
    fn invalid_regex_is_an_input_validation_error() {
        let mut config = RunConfig::defaults_for(".json");
        config.ignore_attr = vec!["(".to_string()];
        let error = config.compile().expect_err("unbalanced group should fail");
        assert_eq!(error.category(), CmpErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.IGNORE_PATTERN");
    }
}
