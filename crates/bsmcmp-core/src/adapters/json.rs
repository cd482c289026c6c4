//! Hierarchical datasets stored as JSON documents.
//!
//! ```json
//! {
//!   "attributes": {"title": "run"},
//!   "variables": {"x": {"attributes": {"units": "K"}, "shape": [3], "data": [1, 2, 3]}},
//!   "groups": {"inner": {"variables": {}}}
//! }
//! ```
//!
//! `data` may be flat (with `shape`) or nested arrays (shape inferred).
//! `null` cells read as NaN.

use super::{AdapterError, DatasetNode, MemoryAdapter, read_file};
use crate::domain::{AttrValue, AttributeSet, CmpResult, Payload, PayloadValues};
use crate::modules::{ChildNodes, FormatAdapter};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonAdapter;

impl JsonAdapter {
    pub fn decode(path: &Path, bytes: &[u8]) -> Result<DatasetNode, AdapterError> {
        let document: Value =
            serde_json::from_slice(bytes).map_err(|source| AdapterError::ParseJson {
                path: path.to_path_buf(),
                source,
            })?;
        Decoder { path }.group(&document, "/")
    }
}

struct Decoder<'a> {
    path: &'a Path,
}

impl Decoder<'_> {
    fn layout(&self, location: &str, message: impl Into<String>) -> AdapterError {
        AdapterError::layout(self.path, location, message)
    }

    fn object<'v>(&self, value: &'v Value, location: &str) -> Result<&'v Map<String, Value>, AdapterError> {
        value
            .as_object()
            .ok_or_else(|| self.layout(location, "expected an object"))
    }

    fn section<'v>(
        &self,
        object: &'v Map<String, Value>,
        key: &str,
        location: &str,
    ) -> Result<Option<&'v Map<String, Value>>, AdapterError> {
        match object.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self
                .object(value, location)
                .map(Some)
                .map_err(|_| self.layout(location, format!("'{}' must be an object", key))),
        }
    }

    fn group(&self, value: &Value, location: &str) -> Result<DatasetNode, AdapterError> {
        let object = self.object(value, location)?;
        let mut node = DatasetNode::group();

        if let Some(attributes) = self.section(object, "attributes", location)? {
            for (key, value) in attributes {
                node = node.with_attribute(key.clone(), self.attribute(value, location)?);
            }
        }
        if let Some(variables) = self.section(object, "variables", location)? {
            for (name, value) in variables {
                let child_location = join(location, name);
                node = node.with_child(name.clone(), self.variable(value, &child_location)?);
            }
        }
        if let Some(groups) = self.section(object, "groups", location)? {
            for (name, value) in groups {
                let child_location = join(location, name);
                if node.child(name).is_some() {
                    return Err(self.layout(
                        &child_location,
                        format!("'{}' is declared both as a variable and as a group", name),
                    ));
                }
                node = node.with_child(name.clone(), self.group(value, &child_location)?);
            }
        }
        Ok(node)
    }

    fn variable(&self, value: &Value, location: &str) -> Result<DatasetNode, AdapterError> {
        let object = self.object(value, location)?;
        let data = object
            .get("data")
            .ok_or_else(|| self.layout(location, "variable has no 'data'"))?;

        let mut cells = Vec::new();
        let inferred = self.flatten(data, location, &mut cells)?;
        let shape = match object.get("shape") {
            None | Some(Value::Null) => inferred,
            Some(shape) => self.shape(shape, location)?,
        };

        let values = cell_values(cells);
        let payload = Payload::new(shape, values)
            .map_err(|error| self.layout(location, error.message().to_string()))?;

        let mut node = DatasetNode::variable(payload);
        if let Some(attributes) = self.section(object, "attributes", location)? {
            for (key, value) in attributes {
                node = node.with_attribute(key.clone(), self.attribute(value, location)?);
            }
        }
        Ok(node)
    }

    fn shape(&self, value: &Value, location: &str) -> Result<Vec<usize>, AdapterError> {
        let Some(dims) = value.as_array() else {
            return Err(self.layout(location, "'shape' must be an array"));
        };
        dims.iter()
            .map(|dim| {
                dim.as_u64()
                    .and_then(|dim| usize::try_from(dim).ok())
                    .ok_or_else(|| self.layout(location, "'shape' entries must be non-negative integers"))
            })
            .collect()
    }

    /// Flattens nested arrays row-major and returns the inferred shape.
    fn flatten<'v>(
        &self,
        value: &'v Value,
        location: &str,
        cells: &mut Vec<&'v Value>,
    ) -> Result<Vec<usize>, AdapterError> {
        let Value::Array(items) = value else {
            cells.push(value);
            return Ok(Vec::new());
        };

        let mut inner: Option<Vec<usize>> = None;
        for item in items {
            let shape = self.flatten(item, location, cells)?;
            match &inner {
                None => inner = Some(shape),
                Some(expected) if *expected != shape => {
                    return Err(self.layout(location, "ragged nested 'data' arrays"));
                }
                Some(_) => {}
            }
        }

        let mut shape = vec![items.len()];
        shape.extend(inner.unwrap_or_default());
        Ok(shape)
    }

    fn attribute(&self, value: &Value, location: &str) -> Result<AttrValue, AdapterError> {
        Ok(match value {
            Value::Null => AttrValue::Float(f64::NAN),
            Value::Bool(flag) => AttrValue::Bool(*flag),
            Value::Number(number) => match number.as_i64() {
                Some(int) => AttrValue::Int(int),
                None => AttrValue::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(text) => AttrValue::Text(text.clone()),
            Value::Array(items) => AttrValue::Array(
                items
                    .iter()
                    .map(|item| self.attribute(item, location))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(_) => {
                return Err(self.layout(location, "attribute values cannot be objects"));
            }
        })
    }
}

/// Numeric when every cell is a number or null; otherwise every cell is
/// rendered as text.
fn cell_values(cells: Vec<&Value>) -> PayloadValues {
    let numeric: Option<Vec<f64>> = cells
        .iter()
        .map(|cell| match cell {
            Value::Null => Some(f64::NAN),
            Value::Number(number) => number.as_f64(),
            _ => None,
        })
        .collect();

    match numeric {
        Some(values) => PayloadValues::Numeric(values),
        None => PayloadValues::Text(
            cells
                .into_iter()
                .map(|cell| match cell {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
    }
}

fn join(location: &str, name: &str) -> String {
    if location.ends_with('/') {
        format!("{}{}", location, name)
    } else {
        format!("{}/{}", location, name)
    }
}

impl FormatAdapter for JsonAdapter {
    type Node = DatasetNode;

    fn name(&self) -> &'static str {
        "json"
    }

    fn default_extension(&self) -> &'static str {
        ".json"
    }

    fn open(&self, path: &Path) -> CmpResult<DatasetNode> {
        let bytes = read_file(path)?;
        Ok(Self::decode(path, &bytes)?)
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
