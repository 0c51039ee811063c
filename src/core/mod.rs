pub mod config;
pub mod paths;
pub mod resolver;
pub mod traversal;

pub use config::{BuildConfig, ConfigError, DependencyFilter, OutputMode, TraversalConfig, TsPaths};
pub use paths::{is_vendored, package_root_of};
pub use resolver::{ModuleResolver, NodeResolver, ResolveRequest};
pub use traversal::{
    to_list, traverse, DependencyOutput, DependencyTree, Traversal, TraversalReport,
};
