pub mod common;
pub mod exports;
pub mod imports;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tree_sitter::Language;

pub use exports::{extract_exports, Symbol, SymbolKind};
pub use imports::{ImportDetector, TreeSitterDetector};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load grammar: {0}")]
    Grammar(String),

    #[error("syntax error in {0}")]
    Syntax(PathBuf),
}

/// Grammar flavor used to parse a file. Chosen from the extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserMode {
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
}

impl ParserMode {
    /// Script extensions this crate knows how to parse.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let extension = path.extension()?.to_str()?;

        if name.ends_with(".d.ts") {
            return Some(ParserMode::TypeScript);
        }

        match extension {
            "js" | "mjs" | "cjs" => Some(ParserMode::JavaScript),
            "jsx" => Some(ParserMode::Jsx),
            "ts" | "mts" | "cts" => Some(ParserMode::TypeScript),
            "tsx" => Some(ParserMode::Tsx),
            _ => None,
        }
    }

    pub fn language(self) -> Language {
        match self {
            // The JavaScript grammar parses JSX natively
            ParserMode::JavaScript | ParserMode::Jsx => tree_sitter_javascript::language(),
            ParserMode::TypeScript => tree_sitter_typescript::language_typescript(),
            ParserMode::Tsx => tree_sitter_typescript::language_tsx(),
        }
    }

    pub fn is_typed(self) -> bool {
        matches!(self, ParserMode::TypeScript | ParserMode::Tsx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_follows_extension() {
        assert_eq!(
            ParserMode::from_path(Path::new("a/b.tsx")),
            Some(ParserMode::Tsx)
        );
        assert_eq!(
            ParserMode::from_path(Path::new("types.d.ts")),
            Some(ParserMode::TypeScript)
        );
        assert_eq!(
            ParserMode::from_path(Path::new("x.mjs")),
            Some(ParserMode::JavaScript)
        );
        assert_eq!(ParserMode::from_path(Path::new("style.css")), None);
        assert_eq!(ParserMode::from_path(Path::new("Makefile")), None);
    }
}
