use crate::domain::{AttributeSet, CmpResult, Payload};
use std::borrow::Cow;
use std::path::Path;

/// Named children of a group, in declaration order.
pub type ChildNodes<'n, N> = Vec<(Cow<'n, str>, Cow<'n, N>)>;

/// Read access to one file format's group/variable/attribute tree.
///
/// The comparison engine is written once against this trait. Children,
/// attributes and payloads are handed out as `Cow`: adapters holding the
/// decoded tree in memory lend borrowed views, adapters reading lazily
/// return owned handles.
pub trait FormatAdapter {
    type Node: Clone;

    /// Lower-case format name, also the key of the format's config section.
    fn name(&self) -> &'static str;

    fn default_extension(&self) -> &'static str;

    /// Formats without node attributes skip attribute comparison entirely.
    fn supports_attributes(&self) -> bool {
        true
    }

    fn open(&self, path: &Path) -> CmpResult<Self::Node>;

    fn close(&self, root: Self::Node) -> CmpResult<()> {
        drop(root);
        Ok(())
    }

    fn is_group(&self, node: &Self::Node) -> bool;

    fn children<'n>(&self, node: &'n Self::Node) -> CmpResult<ChildNodes<'n, Self::Node>>;

    fn attributes<'n>(&self, node: &'n Self::Node) -> CmpResult<Cow<'n, AttributeSet>>;

    fn payload<'n>(&self, node: &'n Self::Node) -> CmpResult<Cow<'n, Payload>>;
}
