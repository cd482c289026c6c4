//! In-memory dataset tree shared by the bundled adapters.
//!
//! Each bundled adapter decodes a whole file into a [`DatasetNode`] on open;
//! traversal is then identical for every format.

use super::AdapterError;
use crate::domain::{AttrValue, AttributeSet, CmpError, CmpResult, Payload};
use crate::modules::{ChildNodes, FormatAdapter};
use std::borrow::Cow;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetNode {
    Group {
        attributes: AttributeSet,
        children: Vec<(String, DatasetNode)>,
    },
    Variable {
        attributes: AttributeSet,
        payload: Payload,
    },
}

impl DatasetNode {
    pub fn group() -> Self {
        Self::Group {
            attributes: AttributeSet::new(),
            children: Vec::new(),
        }
    }

    pub fn variable(payload: Payload) -> Self {
        Self::Variable {
            attributes: AttributeSet::new(),
            payload,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes_mut().insert(key.into(), value.into());
        self
    }

    /// Appends a child, replacing any existing child of the same name in place.
    /// Has no effect on variables.
    pub fn with_child(mut self, name: impl Into<String>, child: DatasetNode) -> Self {
        if let Self::Group { children, .. } = &mut self {
            let name = name.into();
            match children.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = child,
                None => children.push((name, child)),
            }
        }
        self
    }

    pub fn without_child(mut self, name: &str) -> Self {
        if let Self::Group { children, .. } = &mut self {
            children.retain(|(existing, _)| existing != name);
        }
        self
    }

    pub fn child(&self, name: &str) -> Option<&DatasetNode> {
        match self {
            Self::Group { children, .. } => children
                .iter()
                .find(|(existing, _)| existing == name)
                .map(|(_, child)| child),
            Self::Variable { .. } => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group { .. })
    }

    pub fn attributes(&self) -> &AttributeSet {
        match self {
            Self::Group { attributes, .. } | Self::Variable { attributes, .. } => attributes,
        }
    }

    fn attributes_mut(&mut self) -> &mut AttributeSet {
        match self {
            Self::Group { attributes, .. } | Self::Variable { attributes, .. } => attributes,
        }
    }

    pub fn children(&self) -> &[(String, DatasetNode)] {
        match self {
            Self::Group { children, .. } => children,
            Self::Variable { .. } => &[],
        }
    }

    pub fn payload(&self) -> CmpResult<&Payload> {
        match self {
            Self::Variable { payload, .. } => Ok(payload),
            Self::Group { .. } => Err(CmpError::comparison_fault(
                "RUN.ADAPTER_NODE",
                "payload requested from a group node",
            )),
        }
    }
}

/// Adapter over trees that are already in memory; `open` is not supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryAdapter;

impl FormatAdapter for MemoryAdapter {
    type Node = DatasetNode;

    fn name(&self) -> &'static str {
        "memory"
    }

    fn default_extension(&self) -> &'static str {
        ""
    }

    fn open(&self, path: &Path) -> CmpResult<DatasetNode> {
        Err(AdapterError::layout(path, "/", "in-memory datasets cannot be opened from disk").into())
    }

    fn is_group(&self, node: &DatasetNode) -> bool {
        node.is_group()
    }

    fn children<'n>(&self, node: &'n DatasetNode) -> CmpResult<ChildNodes<'n, DatasetNode>> {
        Ok(node
            .children()
            .iter()
            .map(|(name, child)| (Cow::Borrowed(name.as_str()), Cow::Borrowed(child)))
            .collect())
    }

    fn attributes<'n>(&self, node: &'n DatasetNode) -> CmpResult<Cow<'n, AttributeSet>> {
        Ok(Cow::Borrowed(node.attributes()))
    }

    fn payload<'n>(&self, node: &'n DatasetNode) -> CmpResult<Cow<'n, Payload>> {
        node.payload().map(Cow::Borrowed)
    }
}
