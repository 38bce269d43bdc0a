//! File format parsers for importing boundary meshes.
//!
//! Supported formats:
//! - [`.obj`](obj): Wavefront OBJ mesh files

pub mod obj;

use std::path::Path;

use thiserror::Error;

/// Errors during geometry file parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    FormatError { line: usize, message: String },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// Read and parse a mesh file, choosing the parser from the extension.
pub fn load_mesh(path: &Path) -> Result<obj::ObjMesh, ParseError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "obj" => {
            let content = std::fs::read_to_string(path)?;
            obj::parse_obj(&content)
        }
        other => Err(ParseError::UnsupportedFormat(other.to_string())),
    }
}
