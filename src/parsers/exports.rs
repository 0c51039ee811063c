//! Export symbol extraction.
//!
//! Lists the declarations a single JavaScript or TypeScript file exposes to
//! its importers: ES module exports, re-exports and CommonJS assignments.
//! Class declarations carry their members one level deep.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tree_sitter::Node as TSNode;

use super::common::{
    collapse_whitespace, extract_text, find_child_by_kind, has_token, named_children,
    TreeSitterParser,
};
use super::ParserMode;

const MAX_INITIALIZER_CHARS: usize = 80;
const MAX_INTERFACE_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    Variable,
    Method,
    Constructor,
    Property,
    Getter,
    Setter,
    ReExport,
    Unknown,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Variable => "variable",
            SymbolKind::Method => "method",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Property => "property",
            SymbolKind::Getter => "getter",
            SymbolKind::Setter => "setter",
            SymbolKind::ReExport => "re-export",
            SymbolKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Symbol>>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: None,
        }
    }

    pub fn with_children(mut self, children: Vec<Symbol>) -> Self {
        self.children = Some(children);
        self
    }
}

/// Syntactic shape of a declaration node, closed over the grammar node kinds
/// the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Function,
    Method,
    Constructor,
    Getter,
    Setter,
    Class,
    Interface,
    Variable,
    Property,
    ExportSpecifier,
    Other,
}

impl Shape {
    fn of(node: &TSNode, source: &[u8]) -> Self {
        if !node.is_named() {
            return Shape::Other;
        }

        match node.kind() {
            "function_declaration"
            | "generator_function_declaration"
            | "function_signature"
            | "function"
            | "function_expression"
            | "generator_function" => Shape::Function,
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                Self::of_method(node, source)
            }
            "class_declaration" | "abstract_class_declaration" | "class" => Shape::Class,
            "interface_declaration" => Shape::Interface,
            "variable_declarator" => Shape::Variable,
            "public_field_definition" | "field_definition" => Shape::Property,
            "export_specifier" => Shape::ExportSpecifier,
            _ => Shape::Other,
        }
    }

    fn of_method(node: &TSNode, source: &[u8]) -> Self {
        if has_token(node, "get") {
            Shape::Getter
        } else if has_token(node, "set") {
            Shape::Setter
        } else if node
            .child_by_field_name("name")
            .map(|name| extract_text(&name, source) == "constructor")
            .unwrap_or(false)
        {
            Shape::Constructor
        } else {
            Shape::Method
        }
    }

    fn kind(self) -> SymbolKind {
        match self {
            Shape::Function => SymbolKind::Function,
            Shape::Method => SymbolKind::Method,
            Shape::Constructor => SymbolKind::Constructor,
            Shape::Getter => SymbolKind::Getter,
            Shape::Setter => SymbolKind::Setter,
            Shape::Class => SymbolKind::Class,
            Shape::Interface => SymbolKind::Interface,
            Shape::Variable => SymbolKind::Variable,
            Shape::Property => SymbolKind::Property,
            Shape::ExportSpecifier => SymbolKind::ReExport,
            Shape::Other => SymbolKind::Unknown,
        }
    }

    fn render(self, node: &TSNode, source: &[u8]) -> String {
        match self {
            Shape::Function | Shape::Method | Shape::Constructor => {
                function_signature(self, node, source)
            }
            Shape::Variable | Shape::Property => variable_signature(node, source),
            Shape::Class => node
                .child_by_field_name("name")
                .map(|name| extract_text(&name, source).to_string())
                .unwrap_or_else(|| "(anonymous class)".to_string()),
            Shape::Interface => interface_signature(node, source),
            Shape::Getter | Shape::Setter => field_text(node, "name", source).unwrap_or_default(),
            Shape::ExportSpecifier => exported_name(node, source),
            Shape::Other => fallback_text(node, source),
        }
    }
}

fn field_text(node: &TSNode, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .map(|child| extract_text(&child, source).to_string())
}

/// Type annotation text without its leading colon.
fn annotation_text(node: &TSNode, field: &str, source: &[u8]) -> Option<String> {
    let text = field_text(node, field, source)?;
    Some(collapse_whitespace(text.trim_start_matches(':').trim()))
}

fn fallback_text(node: &TSNode, source: &[u8]) -> String {
    collapse_whitespace(extract_text(node, source)).trim().to_string()
}

fn exceeds(text: &str, limit: usize) -> bool {
    text.contains('\n') || text.chars().count() > limit
}

fn function_signature(shape: Shape, node: &TSNode, source: &[u8]) -> String {
    let name = field_text(node, "name", source).unwrap_or_else(|| {
        if shape == Shape::Constructor {
            "constructor".to_string()
        } else {
            "(anonymous)".to_string()
        }
    });

    let params = node
        .child_by_field_name("parameters")
        .map(|parameters| {
            named_children(&parameters)
                .iter()
                .map(|param| collapse_whitespace(extract_text(param, source)))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    match annotation_text(node, "return_type", source) {
        Some(return_type) => format!("{name}({params}): {return_type}"),
        None => format!("{name}({params})"),
    }
}

fn variable_signature(node: &TSNode, source: &[u8]) -> String {
    let mut signature = field_text(node, "name", source)
        .or_else(|| field_text(node, "property", source))
        .unwrap_or_default();

    if let Some(type_text) = annotation_text(node, "type", source) {
        signature.push_str(": ");
        signature.push_str(&type_text);
    }

    if let Some(value) = node.child_by_field_name("value") {
        let text = extract_text(&value, source);
        if exceeds(text, MAX_INITIALIZER_CHARS) {
            signature.push_str(" = ...");
        } else {
            signature.push_str(" = ");
            signature.push_str(&collapse_whitespace(text));
        }
    }

    signature
}

/// Interfaces render with their `export`/`declare` modifiers.
fn interface_signature(node: &TSNode, source: &[u8]) -> String {
    let mut outer = *node;
    while let Some(parent) = outer.parent() {
        if !matches!(parent.kind(), "export_statement" | "ambient_declaration") {
            break;
        }
        outer = parent;
    }

    let text = extract_text(&outer, source);
    if exceeds(text, MAX_INTERFACE_CHARS) {
        let name = field_text(node, "name", source).unwrap_or_default();
        return format!("interface {name} {{ ... }}");
    }
    collapse_whitespace(text).trim().to_string()
}

fn exported_name(specifier: &TSNode, source: &[u8]) -> String {
    specifier
        .child_by_field_name("alias")
        .or_else(|| specifier.child_by_field_name("name"))
        .map(|name| extract_text(&name, source).to_string())
        .unwrap_or_else(|| fallback_text(specifier, source))
}

fn extract_node(node: &TSNode, source: &[u8]) -> Symbol {
    let shape = Shape::of(node, source);
    let symbol = Symbol::new(shape.render(node, source), shape.kind());

    if shape != Shape::Class {
        return symbol;
    }

    let members = node
        .child_by_field_name("body")
        .map(|body| {
            named_children(&body)
                .iter()
                .filter(|member| member.kind() != "decorator")
                .map(|member| {
                    let member_shape = Shape::of(member, source);
                    Symbol::new(member_shape.render(member, source), member_shape.kind())
                })
                .collect()
        })
        .unwrap_or_default();

    symbol.with_children(members)
}

struct ExportVisitor<'s> {
    source: &'s [u8],
    symbols: Vec<Symbol>,
}

impl<'s> ExportVisitor<'s> {
    fn visit(&mut self, node: &TSNode) {
        match node.kind() {
            "export_statement" => {
                self.export_statement(node);
                return;
            }
            "expression_statement" => {
                if let Some(symbol) = commonjs_assignment(node, self.source) {
                    self.symbols.push(symbol);
                    return;
                }
            }
            _ => {}
        }

        for child in named_children(node) {
            self.visit(&child);
        }
    }

    fn export_statement(&mut self, node: &TSNode) {
        let source = self.source;

        if let Some(value) = node.child_by_field_name("value") {
            self.default_export(&value);
            return;
        }

        // export = value
        if has_token(node, "=") {
            if let Some(value) = named_children(node)
                .into_iter()
                .find(|child| child.kind() != "decorator")
            {
                self.default_export(&value);
            }
            return;
        }

        if let Some(clause) = find_child_by_kind(node, "export_clause") {
            for specifier in named_children(&clause) {
                if specifier.kind() == "export_specifier" {
                    self.symbols
                        .push(Symbol::new(exported_name(&specifier, source), SymbolKind::ReExport));
                }
            }
            return;
        }

        if has_token(node, "*") || find_child_by_kind(node, "namespace_export").is_some() {
            self.symbols.push(Symbol::new(
                extract_text(node, source).to_string(),
                SymbolKind::ReExport,
            ));
            return;
        }

        if let Some(declaration) = node.child_by_field_name("declaration") {
            self.exported_declaration(node, &unwrap_ambient(declaration));
        }
    }

    fn default_export(&mut self, value: &TSNode) {
        let mut symbol = extract_node(value, self.source);
        if !has_name(value) {
            symbol.name = format!("default {}", symbol.name).replacen("default (anonymous)", "default", 1);
        }
        self.symbols.push(symbol);
    }

    fn exported_declaration(&mut self, statement: &TSNode, declaration: &TSNode) {
        match declaration.kind() {
            "lexical_declaration" | "variable_declaration" => {
                for declarator in named_children(declaration) {
                    if declarator.kind() == "variable_declarator" {
                        self.symbols.push(extract_node(&declarator, self.source));
                    }
                }
            }
            _ if Shape::of(declaration, self.source) == Shape::Other => {
                self.symbols.push(Symbol::new(
                    fallback_text(statement, self.source),
                    SymbolKind::Unknown,
                ));
            }
            _ => self.symbols.push(extract_node(declaration, self.source)),
        }
    }
}

/// Named values and property accesses (`a.b`) export under their own name.
fn has_name(value: &TSNode) -> bool {
    value.child_by_field_name("name").is_some()
        || (value.kind() == "member_expression" && value.child_by_field_name("property").is_some())
}

/// `declare const x: T` wraps the real declaration.
fn unwrap_ambient(declaration: TSNode) -> TSNode {
    if declaration.kind() != "ambient_declaration" {
        return declaration;
    }
    named_children(&declaration)
        .into_iter()
        .next()
        .unwrap_or(declaration)
}

fn commonjs_assignment(statement: &TSNode, source: &[u8]) -> Option<Symbol> {
    let assignment = named_children(statement).into_iter().next()?;
    if assignment.kind() != "assignment_expression" {
        return None;
    }

    let left = assignment.child_by_field_name("left")?;
    let right = assignment.child_by_field_name("right")?;
    if left.kind() != "member_expression" {
        return None;
    }

    let object = field_text(&left, "object", source)?;
    let property = field_text(&left, "property", source)?;
    let is_export = (object == "module" && property == "exports") || object == "exports";
    if !is_export {
        return None;
    }

    let right_text = extract_text(&right, source);
    let collapsed = collapse_whitespace(right_text);
    let rendered = if right_text.contains('\n') || collapsed.chars().count() > MAX_INITIALIZER_CHARS {
        "..."
    } else {
        collapsed.as_str()
    };

    Some(Symbol::new(
        format!("{} = {}", extract_text(&left, source), rendered),
        SymbolKind::Variable,
    ))
}

/// Lists the symbols `file_path` exports. Unreadable or unparseable files
/// yield an empty list.
pub fn extract_exports(file_path: &Path) -> Vec<Symbol> {
    let mode = ParserMode::from_path(file_path).unwrap_or(ParserMode::JavaScript);

    let parsed = match TreeSitterParser::new(mode).and_then(|mut parser| parser.parse_file(file_path)) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::debug!("skipping export extraction: {err}");
            return Vec::new();
        }
    };

    let mut visitor = ExportVisitor {
        source: parsed.source_bytes(),
        symbols: Vec::new(),
    };
    visitor.visit(&parsed.root());
    visitor.symbols
}
