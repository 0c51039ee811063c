pub mod directory;
pub mod json;
pub mod pretty;

use std::path::PathBuf;
use thiserror::Error;

pub use directory::{DirectoryNode, DirectoryView};
pub use json::JsonFormatter;
pub use pretty::{render_symbols, PrettyTreeFormatter};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("path conflict: '{}' is used both as a file and as a directory", path.display())]
    PathConflict { path: PathBuf },

    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}
