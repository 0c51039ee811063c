//! Dependency traversal.
//!
//! A memoized post-order depth-first walk from an entry file. Each file is
//! processed once per top-level call; the memo doubles as the cycle breaker
//! because an empty placeholder is recorded for a file before its
//! dependencies are walked.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, trace};

use super::config::{OutputMode, TraversalConfig};
use super::paths::{is_vendored, package_root_of, relative_to};
use super::resolver::{ModuleResolver, NodeResolver, ResolveRequest};
use crate::parsers::{ImportDetector, TreeSitterDetector};

/// Nested dependencies keyed by absolute path. Subtrees of shared
/// dependencies are shared handles.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependencyTree {
    dependencies: IndexMap<PathBuf, Rc<DependencyTree>>,
}

impl DependencyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&DependencyTree> {
        self.dependencies.get(path).map(Rc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &DependencyTree)> {
        self.dependencies.iter().map(|(path, subtree)| (path, subtree.as_ref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &PathBuf> {
        self.dependencies.keys()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Whether two entries point at the same shared subtree.
    pub fn shares_subtree(&self, path: &Path, other: &DependencyTree, other_path: &Path) -> bool {
        match (self.dependencies.get(path), other.dependencies.get(other_path)) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn insert(&mut self, path: PathBuf, subtree: Rc<DependencyTree>) {
        self.dependencies.insert(path, subtree);
    }
}

impl FromIterator<(PathBuf, DependencyTree)> for DependencyTree {
    fn from_iter<I: IntoIterator<Item = (PathBuf, DependencyTree)>>(iter: I) -> Self {
        Self {
            dependencies: iter
                .into_iter()
                .map(|(path, subtree)| (path, Rc::new(subtree)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DependencyOutput {
    Tree(DependencyTree),
    List(Vec<PathBuf>),
}

impl DependencyOutput {
    fn empty(mode: OutputMode) -> Self {
        if mode.is_list() {
            DependencyOutput::List(Vec::new())
        } else {
            DependencyOutput::Tree(DependencyTree::new())
        }
    }

    pub fn as_tree(&self) -> Option<&DependencyTree> {
        match self {
            DependencyOutput::Tree(tree) => Some(tree),
            DependencyOutput::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PathBuf]> {
        match self {
            DependencyOutput::List(list) => Some(list),
            DependencyOutput::Tree(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DependencyOutput::Tree(tree) => tree.is_empty(),
            DependencyOutput::List(list) => list.is_empty(),
        }
    }
}

/// Result of one top-level traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalReport {
    pub output: DependencyOutput,
    /// Specifiers that resolved to nothing, in first-seen order without repeats.
    pub unresolved: Vec<String>,
}

/// Per-mode accumulation of one file's dependency results.
trait Accumulator: Default {
    type Output: Clone;

    fn placeholder() -> Self::Output;
    fn add(&mut self, dependency: &Path, result: Self::Output);
    fn finish(self, file: &Path) -> Self::Output;
}

#[derive(Default)]
struct TreeAccumulator(DependencyTree);

impl Accumulator for TreeAccumulator {
    type Output = Rc<DependencyTree>;

    fn placeholder() -> Self::Output {
        Rc::new(DependencyTree::new())
    }

    fn add(&mut self, dependency: &Path, result: Self::Output) {
        self.0.insert(dependency.to_path_buf(), result);
    }

    fn finish(self, _file: &Path) -> Self::Output {
        Rc::new(self.0)
    }
}

#[derive(Default)]
struct ListAccumulator(IndexSet<PathBuf>);

impl Accumulator for ListAccumulator {
    type Output = Rc<[PathBuf]>;

    fn placeholder() -> Self::Output {
        Rc::from(Vec::new())
    }

    fn add(&mut self, _dependency: &Path, result: Self::Output) {
        self.0.extend(result.iter().cloned());
    }

    fn finish(mut self, file: &Path) -> Self::Output {
        self.0.insert(file.to_path_buf());
        self.0.into_iter().collect()
    }
}

/// Walk state owned by a single top-level call.
struct Walker<'t, A: Accumulator> {
    traversal: &'t Traversal,
    config: &'t TraversalConfig,
    visited: HashMap<PathBuf, A::Output>,
    unresolved: Vec<String>,
}

impl<'t, A: Accumulator> Walker<'t, A> {
    fn new(traversal: &'t Traversal, config: &'t TraversalConfig) -> Self {
        Self {
            traversal,
            config,
            visited: HashMap::new(),
            unresolved: Vec::new(),
        }
    }

    fn visit(&mut self, file: &Path, directory: &Path) -> A::Output {
        if let Some(done) = self.visited.get(file) {
            trace!("already visited {}", file.display());
            return done.clone();
        }

        debug!("traversing {}", file.display());
        let dependencies = self.dependencies(file, directory);

        // Any path back to `file` from here on sees the placeholder
        self.visited.insert(file.to_path_buf(), A::placeholder());

        let dependencies = self.filter(dependencies, file);

        let mut accumulator = A::default();
        for dependency in &dependencies {
            let dependency_directory = if is_vendored(dependency) {
                package_root_of(dependency).unwrap_or_else(|| directory.to_path_buf())
            } else {
                directory.to_path_buf()
            };

            let result = self.visit(dependency, &dependency_directory);
            accumulator.add(dependency, result);
        }

        let result = accumulator.finish(file);
        self.visited.insert(file.to_path_buf(), result.clone());
        result
    }

    /// Resolved, existing dependencies of `file` in detection order.
    fn dependencies(&mut self, file: &Path, directory: &Path) -> Vec<PathBuf> {
        let specifiers = match self.traversal.detector.detect(file) {
            Ok(specifiers) => specifiers,
            Err(err) => {
                debug!("error getting dependencies of {}: {err}", file.display());
                return Vec::new();
            }
        };
        debug!("extracted {} dependencies from {}", specifiers.len(), file.display());

        let mut resolved = Vec::with_capacity(specifiers.len());
        for specifier in specifiers {
            let request = ResolveRequest {
                specifier: &specifier,
                from_file: file,
                directory,
                build: &self.config.build,
            };

            match self.traversal.resolver.resolve(&request) {
                Some(path) if path.exists() => resolved.push(path),
                Some(path) => {
                    debug!(
                        "skipping non-existent resolution {} for {specifier}",
                        path.display()
                    );
                    self.unresolved.push(specifier);
                }
                None => {
                    debug!("skipping unresolved specifier {specifier}");
                    self.unresolved.push(specifier);
                }
            }
        }

        resolved
    }

    fn filter(&self, mut dependencies: Vec<PathBuf>, file: &Path) -> Vec<PathBuf> {
        let before = dependencies.len();

        if self.config.ignore_node_modules {
            dependencies.retain(|dependency| !is_vendored(dependency));
        }
        if let Some(filter) = &self.config.filter {
            dependencies.retain(|dependency| filter(dependency.as_path(), file));
        }

        if dependencies.len() != before {
            debug!(
                "filtered dependencies of {} from {before} to {}",
                file.display(),
                dependencies.len()
            );
        }
        dependencies
    }

    fn into_unresolved(self) -> Vec<String> {
        let deduped: IndexSet<String> = self.unresolved.into_iter().collect();
        deduped.into_iter().collect()
    }
}

/// The traversal engine, parameterized by its import detector and module
/// resolver.
pub struct Traversal {
    detector: Box<dyn ImportDetector>,
    resolver: Box<dyn ModuleResolver>,
}

impl Default for Traversal {
    fn default() -> Self {
        Self::new()
    }
}

impl Traversal {
    pub fn new() -> Self {
        Self {
            detector: Box::new(TreeSitterDetector::new()),
            resolver: Box::new(NodeResolver::new()),
        }
    }

    pub fn with_detector(mut self, detector: impl ImportDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    pub fn with_resolver(mut self, resolver: impl ModuleResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn run(&self, config: &TraversalConfig) -> TraversalReport {
        let entry = &config.filename;
        if !entry.exists() {
            debug!("entry file {} does not exist", entry.display());
            return TraversalReport {
                output: DependencyOutput::empty(config.output_mode),
                unresolved: Vec::new(),
            };
        }

        match config.output_mode {
            OutputMode::Tree => {
                let mut walker = Walker::<TreeAccumulator>::new(self, config);
                let subtree = walker.visit(entry, &config.directory);

                let mut tree = DependencyTree::new();
                tree.insert(entry.clone(), subtree);
                TraversalReport {
                    output: DependencyOutput::Tree(tree),
                    unresolved: walker.into_unresolved(),
                }
            }
            OutputMode::ListAbsolute | OutputMode::ListRelative => {
                let mut walker = Walker::<ListAccumulator>::new(self, config);
                let mut list = walker.visit(entry, &config.directory).to_vec();

                if config.output_mode == OutputMode::ListRelative {
                    match std::env::current_dir() {
                        Ok(cwd) => {
                            list = list.iter().map(|path| relative_to(path, &cwd)).collect();
                        }
                        Err(err) => debug!("keeping absolute paths, no working directory: {err}"),
                    }
                }

                TraversalReport {
                    output: DependencyOutput::List(list),
                    unresolved: walker.into_unresolved(),
                }
            }
        }
    }
}

/// Traverse with the default detector and resolver.
pub fn traverse(config: &TraversalConfig) -> TraversalReport {
    Traversal::new().run(config)
}

/// Build-ordered list of `config.filename` and everything it depends on.
/// Keeps a relative list mode; any other mode becomes absolute.
pub fn to_list(config: &TraversalConfig) -> Vec<PathBuf> {
    let mut config = config.clone();
    if !config.output_mode.is_list() {
        config.output_mode = OutputMode::ListAbsolute;
    }

    match traverse(&config).output {
        DependencyOutput::List(list) => list,
        DependencyOutput::Tree(_) => Vec::new(),
    }
}
