//! Recursive lock-step comparison of two dataset trees.
//!
//! Attributes of a group are compared before its children; children are
//! visited in adapter order and every child is visited even after a
//! mismatch. Each child forms one reporter delay scope, so a child that
//! matched silently leaves no output.

use super::attributes::compare_attributes;
use super::config::ComparePatterns;
use super::data::{DataComparison, DataMismatch, ErrorStats, compare_payloads};
use super::reporter::{Level, Reporter};
use super::traits::FormatAdapter;
use crate::domain::{CmpResult, ComparisonResult};
use std::collections::{HashMap, HashSet};

const INDENT: &str = "    ";

pub struct ComparisonEngine<'a, A: FormatAdapter> {
    adapter: &'a A,
    patterns: &'a ComparePatterns,
    reporter: &'a mut Reporter,
    compare_attributes: bool,
}

impl<'a, A: FormatAdapter> ComparisonEngine<'a, A> {
    pub fn new(adapter: &'a A, patterns: &'a ComparePatterns, reporter: &'a mut Reporter) -> Self {
        Self {
            adapter,
            patterns,
            reporter,
            compare_attributes: adapter.supports_attributes(),
        }
    }

    /// Data-only comparison; `attr_match` is always true.
    pub fn without_attributes(mut self) -> Self {
        self.compare_attributes = false;
        self
    }

    pub fn compare_tree(&mut self, node1: &A::Node, node2: &A::Node) -> CmpResult<ComparisonResult> {
        self.compare_group(node1, node2, "/", 0)
    }

    fn compare_group(
        &mut self,
        node1: &A::Node,
        node2: &A::Node,
        location: &str,
        depth: usize,
    ) -> CmpResult<ComparisonResult> {
        tracing::debug!(path = location, format = self.adapter.name(), "comparing group");
        let mut attr_match = self.check_attributes(node1, node2, location, depth)?;

        let children1 = self
            .adapter
            .children(node1)
            .map_err(|error| error.with_context(format!("at '{}' in 1st file", location)))?;
        let children2 = self
            .adapter
            .children(node2)
            .map_err(|error| error.with_context(format!("at '{}' in 2nd file", location)))?;

        let indent = INDENT.repeat(depth);
        let variables = &self.patterns.variables;
        let (ignored, kept1): (Vec<_>, Vec<_>) = children1
            .into_iter()
            .partition(|(name, _)| variables.is_match(name));
        let kept2: Vec<_> = children2
            .into_iter()
            .filter(|(name, _)| !variables.is_match(name))
            .collect();
        let lookup2: HashMap<&str, &A::Node> = kept2
            .iter()
            .map(|(name, node)| (&**name, &**node))
            .collect();
        let names1: HashSet<&str> = kept1.iter().map(|(name, _)| &**name).collect();

        for (name, _) in &ignored {
            self.reporter.begin_delay();
            self.reporter.echo(Level::Error, format!("{}{}", indent, name));
            self.reporter.warning(Level::Info, format!("{}{}ignore", indent, INDENT));
            self.reporter.end_delay();
        }

        let mut data_match = kept1.len() == kept2.len();
        for (name, child1) in &kept1 {
            let child_location = join_location(location, name);
            self.reporter.begin_delay();
            self.reporter.echo(Level::Error, format!("{}{}", indent, name));

            let result = match lookup2.get(&**name) {
                None => {
                    self.reporter.error(
                        Level::Error,
                        format!("{}{}not found in 2nd file: {}", indent, INDENT, child_location),
                    );
                    Ok(ComparisonResult::new(false, true))
                }
                Some(child2) => self.compare_child(child1, child2, &child_location, depth),
            };
            // Closed before propagating so a fault never leaves the scope open.
            self.reporter.end_delay();

            let result = result?;
            data_match &= result.data_match;
            attr_match &= result.attr_match;
        }

        for (name, _) in &kept2 {
            if names1.contains(&**name) {
                continue;
            }
            self.reporter.begin_delay();
            self.reporter.echo(Level::Error, format!("{}{}", indent, name));
            self.reporter.error(
                Level::Error,
                format!(
                    "{}{}not found in 1st file: {}",
                    indent,
                    INDENT,
                    join_location(location, name)
                ),
            );
            self.reporter.end_delay();
            data_match = false;
        }

        Ok(ComparisonResult::new(data_match, attr_match))
    }

    fn compare_child(
        &mut self,
        child1: &A::Node,
        child2: &A::Node,
        location: &str,
        depth: usize,
    ) -> CmpResult<ComparisonResult> {
        let detail = INDENT.repeat(depth + 1);
        match (self.adapter.is_group(child1), self.adapter.is_group(child2)) {
            (true, true) => self.compare_group(child1, child2, location, depth + 1),
            (true, false) => Ok(self.report_kind_skew(location, &detail, "group", "variable")),
            (false, true) => Ok(self.report_kind_skew(location, &detail, "variable", "group")),
            (false, false) => {
                let attr_match = self.check_attributes(child1, child2, location, depth + 1)?;
                let payload1 = self
                    .adapter
                    .payload(child1)
                    .map_err(|error| error.with_context(format!("at '{}' in 1st file", location)))?;
                let payload2 = self
                    .adapter
                    .payload(child2)
                    .map_err(|error| error.with_context(format!("at '{}' in 2nd file", location)))?;

                let comparison = compare_payloads(&payload1, &payload2);
                if !comparison.matched {
                    self.report_data_mismatch(&comparison, location, &detail);
                }
                Ok(ComparisonResult::new(comparison.matched, attr_match))
            }
        }
    }

    fn report_kind_skew(
        &mut self,
        location: &str,
        indent: &str,
        kind1: &str,
        kind2: &str,
    ) -> ComparisonResult {
        self.reporter.error(
            Level::Error,
            format!(
                "{}kind differs at {}: {} in 1st file, {} in 2nd file",
                indent, location, kind1, kind2
            ),
        );
        ComparisonResult::new(false, true)
    }

    fn check_attributes(
        &mut self,
        node1: &A::Node,
        node2: &A::Node,
        location: &str,
        depth: usize,
    ) -> CmpResult<bool> {
        if !self.compare_attributes {
            return Ok(true);
        }

        let attrs1 = self
            .adapter
            .attributes(node1)
            .map_err(|error| error.with_context(format!("at '{}' in 1st file", location)))?;
        let attrs2 = self
            .adapter
            .attributes(node2)
            .map_err(|error| error.with_context(format!("at '{}' in 2nd file", location)))?;
        let comparison = compare_attributes(&attrs1, &attrs2, &self.patterns.attributes);

        let indent = INDENT.repeat(depth);
        if comparison.has_key_skew() {
            self.reporter.warning(
                Level::Warn,
                format!(
                    "{}attribute keys differ at {}: only in 1st file {:?}, only in 2nd file {:?}",
                    indent, location, comparison.only_in_first, comparison.only_in_second
                ),
            );
        }
        for mismatch in &comparison.mismatches {
            self.reporter.error(
                Level::Error,
                format!(
                    "{}attribute '{}' mismatch at {}: {} vs {}",
                    indent, mismatch.key, location, mismatch.first, mismatch.second
                ),
            );
        }
        Ok(comparison.matched)
    }

    fn report_data_mismatch(&mut self, comparison: &DataComparison, location: &str, indent: &str) {
        tracing::debug!(path = location, "data mismatch");
        match &comparison.mismatch {
            Some(DataMismatch::Shape { first, second }) => self.reporter.error(
                Level::Error,
                format!("{}shape mismatch at {}: {:?} vs {:?}", indent, location, first, second),
            ),
            Some(DataMismatch::DType { first, second }) => self.reporter.error(
                Level::Error,
                format!("{}dtype mismatch at {}: {:?} vs {:?}", indent, location, first, second),
            ),
            Some(DataMismatch::Values { differing }) => self.reporter.error(
                Level::Error,
                format!(
                    "{}data mismatch at {}: {} element(s) differ",
                    indent, location, differing
                ),
            ),
            None => {}
        }

        if let Some(stats) = &comparison.stats {
            self.report_error_stats(stats, indent);
        }
    }

    fn report_error_stats(&mut self, stats: &ErrorStats, indent: &str) {
        let positions: Vec<String> = stats
            .max_positions
            .iter()
            .map(|position| format!("{:?}", position))
            .collect();
        self.reporter.echo(
            Level::Info,
            format!("{}max error: {} at {}", indent, stats.max_error, positions.join(", ")),
        );
        if let Some((first, second)) = stats.sample {
            self.reporter.echo(
                Level::Info,
                format!("{}sample: {} vs {}", indent, first, second),
            );
        }
        self.reporter.echo(
            Level::Info,
            format!(
                "{}mean error: {}, std error: {}",
                indent, stats.mean_error, stats.std_error
            ),
        );
        self.reporter.echo(
            Level::Info,
            format!(
                "{}zero error: {}/{} ({:.2}%)",
                indent,
                stats.zero_error_count,
                stats.element_count,
                stats.zero_error_percent()
            ),
        );
    }
}

fn join_location(location: &str, name: &str) -> String {
    if location.ends_with('/') {
        format!("{}{}", location, name)
    } else {
        format!("{}/{}", location, name)
    }
}

#[cfg(test)]
mod tests {
    use super::ComparisonEngine;
    use crate::adapters::{AsciiAdapter, DatasetNode, MemoryAdapter};
    use crate::common::IgnorePatterns;
    use crate::domain::{CmpError, ComparisonResult, Payload};
    use crate::modules::config::ComparePatterns;
    use crate::modules::reporter::{Level, Reporter};
    use crate::modules::FormatAdapter;
    use std::borrow::Cow;

    fn vector(values: &[f64]) -> DatasetNode {
        DatasetNode::variable(Payload::numeric_vector(values.to_vec()))
    }

    fn scenario_a() -> DatasetNode {
        DatasetNode::group().with_child(
            "root",
            DatasetNode::group()
                .with_attribute("units", "K")
                .with_attribute("title", "scenario")
                .with_child("x", vector(&[1.0, 2.0, 3.0]))
                .with_child("y", vector(&[4.0, 5.0, 6.0])),
        )
    }

    fn replace_root(tree: &DatasetNode, edit: impl FnOnce(DatasetNode) -> DatasetNode) -> DatasetNode {
        let root = tree.child("root").expect("root group should exist").clone();
        tree.clone().with_child("root", edit(root))
    }

    fn compare_with(
        first: &DatasetNode,
        second: &DatasetNode,
        patterns: &ComparePatterns,
    ) -> (ComparisonResult, Reporter) {
        let mut reporter = Reporter::captured(Level::Max);
        let result = ComparisonEngine::new(&MemoryAdapter, patterns, &mut reporter)
            .compare_tree(first, second)
            .expect("in-memory comparison should not fault");
        (result, reporter)
    }

    fn compare(first: &DatasetNode, second: &DatasetNode) -> (ComparisonResult, Reporter) {
        compare_with(first, second, &ComparePatterns::default())
    }

    fn ignore_variables(patterns: &[&str]) -> ComparePatterns {
        ComparePatterns {
            variables: IgnorePatterns::new(patterns).expect("patterns should compile"),
            ..ComparePatterns::default()
        }
    }

    #[test]
    fn scenario_a_identical_trees_match() {
        let tree = scenario_a();
        let (result, reporter) = compare(&tree, &tree.clone());
        assert_eq!(result, ComparisonResult::new(true, true));
        assert!(!reporter.contains("mismatch"));
    }

    #[test]
    fn scenario_b_single_value_difference_reports_statistics() {
        let first = replace_root(&scenario_a(), |root| root.with_child("y", vector(&[4.0, 5.0, 7.0])));
        let (result, reporter) = compare(&first, &scenario_a());

        assert_eq!(result, ComparisonResult::new(false, true));
        assert!(reporter.contains("data mismatch at /root/y"));
        assert!(reporter.contains("max error: 1 at [2]"));
        assert!(reporter.contains("zero error: 2/3"));
    }

    #[test]
    fn scenario_c_attribute_value_difference_leaves_data_verdict_alone() {
        let second = replace_root(&scenario_a(), |root| root.with_attribute("units", "C"));
        let (result, reporter) = compare(&scenario_a(), &second);

        assert_eq!(result, ComparisonResult::new(true, false));
        assert!(reporter.contains("attribute 'units' mismatch at /root"));
    }

    #[test]
    fn scenario_d_missing_variable_is_a_data_mismatch() {
        let second = replace_root(&scenario_a(), |root| root.without_child("y"));
        let (result, reporter) = compare(&scenario_a(), &second);

        assert!(!result.data_match);
        assert!(result.attr_match);
        assert!(reporter.contains("not found in 2nd file: /root/y"));
    }

    #[test]
    fn one_sided_addition_is_reported_from_the_second_tree() {
        let second = replace_root(&scenario_a(), |root| root.with_child("z", vector(&[0.0])));
        let (result, reporter) = compare(&scenario_a(), &second);

        assert!(!result.data_match);
        assert!(reporter.contains("not found in 1st file: /root/z"));
    }

    #[test]
    fn scenario_e_ignored_variable_is_excluded_before_missing_check() {
        let second = replace_root(&scenario_a(), |root| root.without_child("y"));
        let (result, _) = compare_with(&scenario_a(), &second, &ignore_variables(&["^y$"]));
        assert_eq!(result, ComparisonResult::new(true, true));
    }

    #[test]
    fn ignoring_a_differing_entity_equals_removing_it() {
        let first = replace_root(&scenario_a(), |root| {
            root.with_child("y", vector(&[9.0, 9.0, 9.0]))
                .with_attribute("history", "monday")
        });
        let second = replace_root(&scenario_a(), |root| root.with_attribute("history", "tuesday"));

        let patterns = ComparePatterns {
            variables: IgnorePatterns::new(["^y$"]).expect("pattern should compile"),
            attributes: IgnorePatterns::new(["history"]).expect("pattern should compile"),
            ..ComparePatterns::default()
        };
        let (ignored, _) = compare_with(&first, &second, &patterns);

        let strip = |tree: &DatasetNode| {
            replace_root(tree, |root| match root.without_child("y") {
                DatasetNode::Group { mut attributes, children } => {
                    attributes.remove("history");
                    DatasetNode::Group { attributes, children }
                }
                variable => variable,
            })
        };
        let (removed, _) = compare(&strip(&first), &strip(&second));
        assert_eq!(ignored, removed);
        assert!(ignored.is_match());
    }

    #[test]
    fn every_child_is_visited_after_a_mismatch() {
        let first = replace_root(&scenario_a(), |root| {
            root.with_child("x", vector(&[0.0, 2.0, 3.0]))
                .with_child("y", vector(&[0.0, 5.0, 6.0]))
        });
        let (result, reporter) = compare(&first, &scenario_a());

        assert!(!result.data_match);
        assert!(reporter.contains("data mismatch at /root/x"));
        assert!(reporter.contains("data mismatch at /root/y"));
    }

    #[test]
    fn nested_groups_recurse_and_kind_skew_is_a_mismatch() {
        let nested = |leaf: DatasetNode| {
            DatasetNode::group().with_child("outer", DatasetNode::group().with_child("inner", leaf))
        };
        let first = nested(vector(&[1.0]));
        let second = nested(DatasetNode::group());

        let (result, reporter) = compare(&first, &second);
        assert!(!result.data_match);
        assert!(reporter.contains("kind differs at /outer/inner"));

        let (deep, _) = compare(&nested(DatasetNode::group()), &nested(DatasetNode::group()));
        assert!(deep.is_match());
    }

    #[test]
    fn leaf_attributes_are_compared() {
        let first = DatasetNode::group().with_child("v", vector(&[1.0]).with_attribute("units", "m"));
        let second = DatasetNode::group().with_child("v", vector(&[1.0]).with_attribute("units", "km"));

        let (result, reporter) = compare(&first, &second);
        assert_eq!(result, ComparisonResult::new(true, false));
        assert!(reporter.contains("attribute 'units' mismatch at /v"));
    }

    #[test]
    fn attribute_less_comparison_reports_attributes_as_matching() {
        let first = DatasetNode::group().with_attribute("units", "K");
        let second = DatasetNode::group().with_attribute("units", "C");
        let patterns = ComparePatterns::default();
        let mut reporter = Reporter::captured(Level::Max);

        let result = ComparisonEngine::new(&MemoryAdapter, &patterns, &mut reporter)
            .without_attributes()
            .compare_tree(&first, &second)
            .expect("comparison should not fault");
        assert_eq!(result, ComparisonResult::new(true, true));

        let text_engine = ComparisonEngine::new(&AsciiAdapter, &patterns, &mut reporter);
        assert!(!text_engine.compare_attributes);
    }

    #[test]
    fn matching_children_leave_no_output_at_error_verbosity() {
        let root = scenario_a()
            .child("root")
            .cloned()
            .expect("root group should exist");
        let patterns = ComparePatterns::default();
        let mut reporter = Reporter::captured(Level::Error);
        ComparisonEngine::new(&MemoryAdapter, &patterns, &mut reporter)
            .compare_tree(&root, &root.clone())
            .expect("comparison should not fault");
        assert!(reporter.messages().is_empty());
    }

    #[test]
    fn adapter_faults_carry_the_subtree_location() {
        let broken = DatasetNode::group().with_child("v", DatasetNode::group());
        let patterns = ComparePatterns::default();
        let mut reporter = Reporter::captured(Level::None);

        struct LeafFault;
        impl crate::modules::FormatAdapter for LeafFault {
            type Node = DatasetNode;
            fn name(&self) -> &'static str {
                "fault"
            }
            fn default_extension(&self) -> &'static str {
                ""
            }
            fn open(&self, _: &std::path::Path) -> crate::domain::CmpResult<DatasetNode> {
                Ok(DatasetNode::group())
            }
            fn is_group(&self, node: &DatasetNode) -> bool {
                node.children().iter().any(|(name, _)| name == "v")
            }
            fn children<'n>(
                &self,
                node: &'n DatasetNode,
            ) -> crate::domain::CmpResult<crate::modules::ChildNodes<'n, DatasetNode>> {
                MemoryAdapter.children(node)
            }
            fn attributes<'n>(
                &self,
                _: &'n DatasetNode,
            ) -> crate::domain::CmpResult<Cow<'n, crate::domain::AttributeSet>> {
                Ok(Cow::Owned(Default::default()))
            }
            fn payload<'n>(&self, _: &'n DatasetNode) -> crate::domain::CmpResult<Cow<'n, Payload>> {
                Err(CmpError::comparison_fault("RUN.ADAPTER_PAYLOAD", "unreadable variable"))
            }
        }

        let error = ComparisonEngine::new(&LeafFault, &patterns, &mut reporter)
            .compare_tree(&broken, &broken)
            .expect_err("payload fault should propagate");
        assert!(error.message().contains("at '/v' in 1st file"));
        assert_eq!(reporter.delay_depth(), 0);

        reporter.set_verbosity(Level::Max);
        reporter.echo(Level::Error, "after the fault");
        assert!(reporter.contains("after the fault"));
    }
}
