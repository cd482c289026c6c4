use tracing_subscriber::EnvFilter;

pub(super) const LOG_ENV: &str = "BSMCMP_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Diagnostics go to stderr so they never mix with the comparison report.
pub(super) fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// `--x` / `--no-x` pairs: the last one given wins, neither means unset.
pub(super) fn flag_pair(enabled: bool, disabled: bool) -> Option<bool> {
    match (enabled, disabled) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

pub(super) fn patterns_option(patterns: Vec<String>) -> Option<Vec<String>> {
    (!patterns.is_empty()).then_some(patterns)
}

#[cfg(test)]
mod tests {
    use super::{flag_pair, patterns_option};

    #[test]
    fn flag_pairs_are_unset_unless_given() {
        assert_eq!(flag_pair(false, false), None);
        assert_eq!(flag_pair(true, false), Some(true));
        assert_eq!(flag_pair(false, true), Some(false));
    }

    #[test]
    fn empty_pattern_lists_are_unset() {
        assert_eq!(patterns_option(Vec::new()), None);
        assert_eq!(
            patterns_option(vec!["^y$".to_string()]),
            Some(vec!["^y$".to_string()])
        );
    }
}
