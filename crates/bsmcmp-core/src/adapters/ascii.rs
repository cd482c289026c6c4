use super::{DatasetNode, MemoryAdapter, read_file};
use crate::domain::{AttributeSet, CmpResult, Payload};
use crate::modules::{ChildNodes, FormatAdapter};
use std::borrow::Cow;
use std::path::Path;

pub const LINES_VARIABLE: &str = "lines";

/// Plain text: the file is a root group holding one non-numeric `lines`
/// variable. `\r\n` and lone `\r` read as `\n`, so files differing only in
/// line endings compare equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsciiAdapter;

impl AsciiAdapter {
    pub fn decode(bytes: &[u8]) -> DatasetNode {
        let text = String::from_utf8_lossy(bytes)
            .replace("\r\n", "\n")
            .replace('\r', "\n");
        let lines = text.split_inclusive('\n').map(str::to_string).collect();
        DatasetNode::group().with_child(
            LINES_VARIABLE,
            DatasetNode::variable(Payload::text_vector(lines)),
        )
    }
}

impl FormatAdapter for AsciiAdapter {
    type Node = DatasetNode;

    fn name(&self) -> &'static str {
        "ascii"
    }

    fn default_extension(&self) -> &'static str {
        ".txt"
    }

    fn supports_attributes(&self) -> bool {
        false
    }

    fn open(&self, path: &Path) -> CmpResult<DatasetNode> {
        Ok(Self::decode(&read_file(path)?))
    }

    fn is_group(&self, node: &DatasetNode) -> bool {
        MemoryAdapter.is_group(node)
    }

    fn children<'n>(&self, node: &'n DatasetNode) -> CmpResult<ChildNodes<'n, DatasetNode>> {
        MemoryAdapter.children(node)
    }

    fn attributes<'n>(&self, node: &'n DatasetNode) -> CmpResult<Cow<'n, AttributeSet>> {
        MemoryAdapter.attributes(node)
    }

    fn payload<'n>(&self, node: &'n DatasetNode) -> CmpResult<Cow<'n, Payload>> {
        MemoryAdapter.payload(node)
    }
}
