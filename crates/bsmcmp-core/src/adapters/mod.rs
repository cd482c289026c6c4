//! Bundled format adapters. Each one decodes a file into a [`DatasetNode`]
//! tree; the comparison engine never sees format details.

pub mod ascii;
pub mod json;
#[cfg(feature = "csv")]
pub mod tabular;
pub mod tree;

pub use ascii::AsciiAdapter;
pub use json::JsonAdapter;
#[cfg(feature = "csv")]
pub use tabular::CsvAdapter;
pub use tree::{DatasetNode, MemoryAdapter};

use crate::domain::CmpError;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse '{}': {source}", .path.display())]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[cfg(feature = "csv")]
    #[error("failed to parse '{}': {source}", .path.display())]
    ParseCsv {
        path: PathBuf,
        #[source]
        source: ::csv::Error,
    },
    #[error("invalid dataset layout in '{}' at '{location}': {message}", .path.display())]
    Layout {
        path: PathBuf,
        location: String,
        message: String,
    },
}

impl AdapterError {
    pub fn layout(path: &Path, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Layout {
            path: path.to_path_buf(),
            location: location.into(),
            message: message.into(),
        }
    }
}

impl From<AdapterError> for CmpError {
    fn from(error: AdapterError) -> Self {
        let message = error.to_string();
        match error {
            AdapterError::Read { .. } => CmpError::io_system("IO.ADAPTER_READ", message),
            AdapterError::ParseJson { .. } | AdapterError::Layout { .. } => {
                CmpError::comparison_fault("RUN.ADAPTER_DECODE", message)
            }
            #[cfg(feature = "csv")]
            AdapterError::ParseCsv { .. } => {
                CmpError::comparison_fault("RUN.ADAPTER_DECODE", message)
            }
        }
    }
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, AdapterError> {
    std::fs::read(path).map_err(|source| AdapterError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{AdapterError, read_file};
    use crate::domain::{CmpError, CmpErrorCategory};
    use std::path::Path;

    #[test]
    fn read_and_decode_faults_map_to_distinct_categories() {
        let read = read_file(Path::new("does/not/exist.json")).expect_err("read should fail");
        assert_eq!(
            CmpError::from(read).category(),
            CmpErrorCategory::IoSystemError
        );

        let layout = AdapterError::layout(Path::new("a.json"), "/grid", "shape mismatch");
        let error = CmpError::from(layout);
        assert_eq!(error.category(), CmpErrorCategory::ComparisonFault);
        assert_eq!(error.placeholder(), "RUN.ADAPTER_DECODE");
        assert!(error.message().contains("/grid"));
    }
}
