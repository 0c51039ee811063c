use std::path::Path;

use crate::core::DependencyTree;
use crate::parsers::{extract_exports, Symbol};

/// `tree(1)`-style rendering of a dependency tree by file name, optionally
/// listing each file's exports beneath it.
pub struct PrettyTreeFormatter {
    with_symbols: bool,
}

impl PrettyTreeFormatter {
    pub fn new() -> Self {
        Self {
            with_symbols: false,
        }
    }

    pub fn with_symbols(mut self, with_symbols: bool) -> Self {
        self.with_symbols = with_symbols;
        self
    }

    /// Renders the first root of `tree`; an empty tree renders as "".
    pub fn format(&self, tree: &DependencyTree) -> String {
        let Some((root, subtree)) = tree.iter().next() else {
            return String::new();
        };

        let mut output = format!("{}\n", file_name(root));
        output.push_str(&self.symbols_text(root, "  "));
        self.write_children(subtree, "", &mut output);
        output.trim_end().to_string()
    }

    fn write_children(&self, tree: &DependencyTree, prefix: &str, output: &mut String) {
        let count = tree.len();
        for (index, (dependency, subtree)) in tree.iter().enumerate() {
            let is_last = index + 1 == count;
            let branch = if is_last { "└──" } else { "├──" };
            let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });

            output.push_str(&format!("{prefix}{branch} {}\n", file_name(dependency)));
            output.push_str(&self.symbols_text(dependency, &child_prefix));
            self.write_children(subtree, &child_prefix, output);
        }
    }

    fn symbols_text(&self, file: &Path, prefix: &str) -> String {
        if !self.with_symbols {
            return String::new();
        }
        render_symbols(&extract_exports(file), prefix)
    }
}

impl Default for PrettyTreeFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One `* name (kind)` line per top-level symbol.
pub fn render_symbols(symbols: &[Symbol], prefix: &str) -> String {
    symbols
        .iter()
        .map(|symbol| format!("{prefix}* {} ({})\n", symbol.name, symbol.kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::SymbolKind;
    use std::path::PathBuf;

    #[test]
    fn nested_branches_and_last_child_glyphs() {
        let tree: DependencyTree = [(
            PathBuf::from("/p/a.js"),
            [
                (
                    PathBuf::from("/p/b.js"),
                    [(PathBuf::from("/p/c.js"), DependencyTree::new())]
                        .into_iter()
                        .collect(),
                ),
                (PathBuf::from("/p/d.js"), DependencyTree::new()),
            ]
            .into_iter()
            .collect(),
        )]
        .into_iter()
        .collect();

        let rendered = PrettyTreeFormatter::new().format(&tree);
        assert_eq!(rendered, "a.js\n├── b.js\n│   └── c.js\n└── d.js");
    }

    #[test]
    fn symbol_lines_use_kind_names() {
        let symbols = vec![
            Symbol::new("add(a, b)", SymbolKind::Function),
            Symbol::new("x", SymbolKind::ReExport),
        ];
        assert_eq!(
            render_symbols(&symbols, "  "),
            "  * add(a, b) (function)\n  * x (re-export)\n"
        );
    }

    #[test]
    fn empty_tree_renders_nothing() {
        assert_eq!(PrettyTreeFormatter::new().format(&DependencyTree::new()), "");
    }
}
