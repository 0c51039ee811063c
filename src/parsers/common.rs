use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tree_sitter::{Node as TSNode, Parser, Tree};

use super::{ParseError, ParserMode};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A parsed file together with the source the tree points into.
pub struct ParsedFile {
    pub tree: Tree,
    pub source: String,
}

impl ParsedFile {
    pub fn root(&self) -> TSNode<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }
}

pub struct TreeSitterParser {
    parser: Parser,
    mode: ParserMode,
}

impl TreeSitterParser {
    pub fn new(mode: ParserMode) -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(mode.language())
            .map_err(|err| ParseError::Grammar(format!("{err:?}")))?;
        Ok(Self { parser, mode })
    }

    pub fn mode(&self) -> ParserMode {
        self.mode
    }

    /// Parse a file, rejecting trees that contain syntax errors.
    pub fn parse_file(&mut self, file_path: &Path) -> Result<ParsedFile, ParseError> {
        let source = read_source(file_path)?;
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or_else(|| ParseError::Syntax(file_path.to_path_buf()))?;

        if tree.root_node().has_error() {
            return Err(ParseError::Syntax(file_path.to_path_buf()));
        }

        Ok(ParsedFile { tree, source })
    }
}

/// Buffered UTF-8 read with the capacity sized from metadata
fn read_source(file_path: &Path) -> Result<String, ParseError> {
    let read_error = |source| ParseError::Read {
        path: file_path.to_path_buf(),
        source,
    };

    let file = File::open(file_path).map_err(read_error)?;
    let file_size = file.metadata().map_err(read_error)?.len() as usize;

    let mut reader = BufReader::with_capacity(file_size.clamp(1, 8192), file);
    let mut content = String::with_capacity(file_size);
    reader.read_to_string(&mut content).map_err(read_error)?;
    Ok(content)
}

pub fn extract_text<'a>(node: &TSNode, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

pub fn find_child_by_kind<'a>(node: &TSNode<'a>, kind: &str) -> Option<TSNode<'a>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

/// Named children, skipping comments.
pub fn named_children<'a>(node: &TSNode<'a>) -> Vec<TSNode<'a>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

pub fn has_token(node: &TSNode, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

/// Collapse every whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}

/// Unquote a string literal node; template literals with substitutions yield `None`.
pub fn string_literal(node: &TSNode, source: &[u8]) -> Option<String> {
    match node.kind() {
        "string" => {
            let text = extract_text(node, source);
            Some(text.trim_matches(|c| c == '"' || c == '\'').to_string())
        }
        "template_string" => {
            if find_child_by_kind(node, "template_substitution").is_some() {
                return None;
            }
            Some(extract_text(node, source).trim_matches('`').to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_mixed_whitespace() {
        assert_eq!(collapse_whitespace("a,\n\t  b"), "a, b");
        assert_eq!(collapse_whitespace("plain"), "plain");
    }
}
