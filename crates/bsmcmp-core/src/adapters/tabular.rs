use super::{AdapterError, DatasetNode, MemoryAdapter, read_file};
use crate::domain::{AttributeSet, CmpResult, Payload};
use crate::modules::{ChildNodes, FormatAdapter};
use std::borrow::Cow;
use std::path::Path;

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Delimited text: one variable per column, in header order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CsvAdapter;

impl CsvAdapter {
    pub fn decode(path: &Path, bytes: &[u8]) -> Result<DatasetNode, AdapterError> {
        let text = String::from_utf8_lossy(bytes);
        let delimiter = sniff_delimiter(text.lines().next().unwrap_or_default());

        let mut reader = ::csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(::csv::Trim::All)
            .from_reader(text.as_bytes());
        let parse_error = |source| AdapterError::ParseCsv {
            path: path.to_path_buf(),
            source,
        };

        let headers = unique_headers(reader.headers().map_err(parse_error)?);
        let mut columns = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record.map_err(parse_error)?;
            for (index, column) in columns.iter_mut().enumerate() {
                column.push(record.get(index).unwrap_or_default().to_string());
            }
        }

        let mut root = DatasetNode::group();
        for (name, cells) in headers.into_iter().zip(columns) {
            root = root.with_child(name, DatasetNode::variable(column_payload(cells)));
        }
        Ok(root)
    }
}

fn sniff_delimiter(header: &str) -> u8 {
    DELIMITER_CANDIDATES
        .iter()
        .copied()
        .map(|candidate| {
            let count = header.bytes().filter(|byte| *byte == candidate).count();
            (candidate, count)
        })
        .fold((b',', 0), |best, current| {
            if current.1 > best.1 { current } else { best }
        })
        .0
}

/// Repeated header names get a `.n` suffix so every column stays addressable.
fn unique_headers(record: &::csv::StringRecord) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(record.len());
    for raw in record.iter() {
        let mut name = raw.to_string();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{}.{}", raw, suffix);
            suffix += 1;
        }
        names.push(name);
    }
    names
}

/// Empty cells in a numeric column read as NaN.
fn column_payload(cells: Vec<String>) -> Payload {
    let numeric: Option<Vec<f64>> = cells
        .iter()
        .map(|cell| {
            if cell.is_empty() {
                Some(f64::NAN)
            } else {
                cell.parse::<f64>().ok()
            }
        })
        .collect();

    match numeric {
        Some(values) if cells.iter().any(|cell| !cell.is_empty()) => {
            Payload::numeric_vector(values)
        }
        _ => Payload::text_vector(cells),
    }
}

impl FormatAdapter for CsvAdapter {
    type Node = DatasetNode;

    fn name(&self) -> &'static str {
        "csv"
    }

    fn default_extension(&self) -> &'static str {
        ".csv"
    }

    fn supports_attributes(&self) -> bool {
        false
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
