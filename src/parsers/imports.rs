use indexmap::IndexSet;
use std::path::Path;
use tree_sitter::Node as TSNode;

use super::common::{extract_text, find_child_by_kind, named_children, string_literal, TreeSitterParser};
use super::{ParseError, ParserMode};

/// Finds the raw module specifiers a single file references.
pub trait ImportDetector {
    fn detect(&self, file_path: &Path) -> Result<Vec<String>, ParseError>;
}

const NODE_BUILTINS: &[&str] = &[
    "assert", "async_hooks", "buffer", "child_process", "cluster", "console", "constants",
    "crypto", "dgram", "diagnostics_channel", "dns", "domain", "events", "fs", "http", "http2",
    "https", "inspector", "module", "net", "os", "path", "perf_hooks", "process", "punycode",
    "querystring", "readline", "repl", "stream", "string_decoder", "sys", "timers", "tls",
    "trace_events", "tty", "url", "util", "v8", "vm", "wasi", "worker_threads", "zlib",
];

/// Builtin subpath modules; any other `<builtin>/...` specifier is a package.
const NODE_BUILTIN_SUBPATHS: &[&str] = &[
    "assert/strict", "dns/promises", "fs/promises", "inspector/promises", "path/posix",
    "path/win32", "readline/promises", "stream/consumers", "stream/promises", "stream/web",
    "timers/promises", "util/types",
];

/// AMD dependency names that refer to the loader itself, not to files.
const AMD_PSEUDO_MODULES: &[&str] = &["require", "exports", "module"];

pub fn is_builtin(specifier: &str) -> bool {
    if specifier.starts_with("node:") {
        return true;
    }
    NODE_BUILTINS.contains(&specifier) || NODE_BUILTIN_SUBPATHS.contains(&specifier)
}

/// Import detector for ES modules, CommonJS, AMD and TypeScript import-equals,
/// built on the tree-sitter JavaScript and TypeScript grammars.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeSitterDetector;

impl TreeSitterDetector {
    pub fn new() -> Self {
        Self
    }

    fn visit(&self, node: &TSNode, source: &[u8], found: &mut IndexSet<String>) {
        match node.kind() {
            "import_statement" => {
                if let Some(specifier) = import_source(node, source) {
                    found.insert(specifier);
                }
                return;
            }
            "export_statement" => {
                if let Some(specifier) = node
                    .child_by_field_name("source")
                    .and_then(|source_node| string_literal(&source_node, source))
                {
                    found.insert(specifier);
                }
            }
            "call_expression" => self.visit_call(node, source, found),
            _ => {}
        }

        let mut cursor = node.walk();
        let children: Vec<TSNode> = node.children(&mut cursor).collect();
        for child in children {
            self.visit(&child, source, found);
        }
    }

    fn visit_call(&self, call: &TSNode, source: &[u8], found: &mut IndexSet<String>) {
        let Some(function) = call.child_by_field_name("function") else {
            return;
        };
        let Some(arguments) = call.child_by_field_name("arguments") else {
            return;
        };
        let args = named_children(&arguments);

        match (function.kind(), extract_text(&function, source)) {
            ("import", _) => {
                if let Some(specifier) = args.first().and_then(|arg| string_literal(arg, source)) {
                    found.insert(specifier);
                }
            }
            ("identifier", "require") => match args.first() {
                Some(first) if first.kind() == "array" => {
                    collect_amd_array(first, source, found);
                }
                Some(first) => {
                    if let Some(specifier) = string_literal(first, source) {
                        found.insert(specifier);
                    }
                }
                None => {}
            },
            ("identifier", "define") => {
                if let Some(array) = args.iter().find(|arg| arg.kind() == "array") {
                    collect_amd_array(array, source, found);
                }
            }
            _ => {}
        }
    }
}

fn import_source(import: &TSNode, source: &[u8]) -> Option<String> {
    if let Some(source_node) = import.child_by_field_name("source") {
        return string_literal(&source_node, source);
    }

    // import foo = require('foo')
    let clause = find_child_by_kind(import, "import_require_clause")?;
    let source_node = clause
        .child_by_field_name("source")
        .or_else(|| find_child_by_kind(&clause, "string"))?;
    string_literal(&source_node, source)
}

fn collect_amd_array(array: &TSNode, source: &[u8], found: &mut IndexSet<String>) {
    for element in named_children(array) {
        if let Some(specifier) = string_literal(&element, source) {
            if !AMD_PSEUDO_MODULES.contains(&specifier.as_str()) {
                found.insert(specifier);
            }
        }
    }
}

impl ImportDetector for TreeSitterDetector {
    fn detect(&self, file_path: &Path) -> Result<Vec<String>, ParseError> {
        let Some(mode) = ParserMode::from_path(file_path) else {
            tracing::trace!("no import grammar for {}", file_path.display());
            return Ok(Vec::new());
        };

        let mut parser = TreeSitterParser::new(mode)?;
        let parsed = parser.parse_file(file_path)?;

        let mut found = IndexSet::new();
        self.visit(&parsed.root(), parsed.source_bytes(), &mut found);

        Ok(found
            .into_iter()
            .filter(|specifier| !specifier.is_empty() && !is_builtin(specifier))
            .collect())
    }
}
