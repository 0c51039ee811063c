//! # DEPTREE
//!
//! Dependency trees and export listings for JavaScript and TypeScript projects.
//!
//! Starting from an entry file, deptree follows every `import`, `require`,
//! AMD `define` and re-export it can resolve and reports the result either as
//! a nested tree or as a build-ordered list in which every file comes after
//! all of its dependencies. Cycles terminate and shared dependencies are
//! visited once.
//!
//! Independently, [`parsers::extract_exports`] lists the symbols a single
//! file exposes: exported functions, classes (with their members),
//! interfaces, variables, re-exports and CommonJS assignments.
//!
//! ## Output Formats
//!
//! - **Tree**: JSON object keyed by absolute paths
//! - **List**: build-ordered paths, absolute or relative to the working directory
//! - **Pretty tree**: `tree(1)`-style view, optionally annotated with exports
//! - **Directory view**: the list folded into its directory structure

pub mod core;
pub mod formatters;
pub mod logger;
pub mod parsers;

pub use crate::core::{to_list, traverse, DependencyTree, OutputMode, TraversalConfig};
pub use crate::parsers::{extract_exports, Symbol, SymbolKind};
