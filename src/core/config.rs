use indexmap::IndexMap;
use path_clean::PathClean;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::paths::{absolutize, append_extension, VENDOR_DIR};

/// Predicate over `(resolved_dependency, importing_file)`; `false` prunes the edge.
pub type DependencyFilter = Arc<dyn Fn(&Path, &Path) -> bool + Send + Sync>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("failed to read tsconfig '{}': {source}", path.display())]
    ReadTsConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid tsconfig '{}': {source}", path.display())]
    InvalidTsConfig {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },

    #[error("tsconfig '{}' extends '{extends}', which was not found", path.display())]
    UnresolvedExtends { path: PathBuf, extends: String },

    #[error("tsconfig '{}' extends itself", .0.display())]
    ExtendsCycle(PathBuf),

    #[error("invalid alias '{0}', expected NAME=PATH")]
    InvalidAlias(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Tree,
    ListAbsolute,
    ListRelative,
}

impl OutputMode {
    pub fn is_list(self) -> bool {
        !matches!(self, OutputMode::Tree)
    }
}

/// `compilerOptions.baseUrl` and `compilerOptions.paths` of a tsconfig,
/// after following its `extends` chain.
#[derive(Debug, Clone, Default)]
pub struct TsPaths {
    pub base_url: Option<PathBuf>,
    /// Directory `paths` targets are relative to: `baseUrl` when set,
    /// otherwise the directory of the tsconfig that declared `paths`.
    pub paths_base: PathBuf,
    pub paths: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTsConfig {
    extends: Option<Extends>,
    #[serde(default)]
    compiler_options: RawCompilerOptions,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Extends {
    One(String),
    Many(Vec<String>),
}

impl Extends {
    fn into_vec(self) -> Vec<String> {
        match self {
            Extends::One(parent) => vec![parent],
            Extends::Many(parents) => parents,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    base_url: Option<String>,
    paths: Option<IndexMap<String, Vec<String>>>,
}

/// Options collected along an `extends` chain. Later layers override
/// earlier ones field by field; relative values are already anchored to
/// the file that declared them.
#[derive(Debug, Default)]
struct Inherited {
    base_url: Option<PathBuf>,
    paths: Option<(IndexMap<String, Vec<String>>, PathBuf)>,
}

impl Inherited {
    fn overlay(&mut self, layer: Inherited) {
        if layer.base_url.is_some() {
            self.base_url = layer.base_url;
        }
        if layer.paths.is_some() {
            self.paths = layer.paths;
        }
    }
}

impl TsPaths {
    /// Read a tsconfig (comments and trailing commas allowed) and every
    /// config it extends.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path = path.to_path_buf().clean();
        let config_dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        let inherited = read_layer(&path, &mut Vec::new())?;

        let (paths, declared_in) = inherited.paths.unwrap_or_else(|| (IndexMap::new(), config_dir));
        let paths_base = inherited.base_url.clone().unwrap_or(declared_in);

        Ok(Self {
            base_url: inherited.base_url,
            paths_base,
            paths,
        })
    }
}

fn read_layer(path: &Path, chain: &mut Vec<PathBuf>) -> Result<Inherited, ConfigError> {
    if chain.iter().any(|seen| seen == path) {
        return Err(ConfigError::ExtendsCycle(path.to_path_buf()));
    }

    let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadTsConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawTsConfig = json5::from_str(&text).map_err(|source| ConfigError::InvalidTsConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let config_dir = path.parent().unwrap_or(Path::new("")).to_path_buf();

    chain.push(path.to_path_buf());
    let mut inherited = Inherited::default();
    for parent in raw.extends.map(Extends::into_vec).unwrap_or_default() {
        let parent_path = find_extended(&parent, &config_dir).ok_or_else(|| {
            ConfigError::UnresolvedExtends {
                path: path.to_path_buf(),
                extends: parent.clone(),
            }
        })?;
        tracing::debug!("{} extends {}", path.display(), parent_path.display());
        inherited.overlay(read_layer(&parent_path, chain)?);
    }
    chain.pop();

    let options = raw.compiler_options;
    inherited.overlay(Inherited {
        base_url: options
            .base_url
            .map(|base| absolutize(Path::new(&base), &config_dir)),
        paths: options.paths.map(|paths| (paths, config_dir.clone())),
    });
    Ok(inherited)
}

/// Locate an `extends` target: a path relative to the extending config, or
/// a package config under `node_modules`. The `.json` suffix may be omitted.
fn find_extended(target: &str, config_dir: &Path) -> Option<PathBuf> {
    let is_path = target.starts_with("./") || target.starts_with("../") || Path::new(target).is_absolute();
    let candidates: Vec<PathBuf> = if is_path {
        vec![config_dir.join(target).clean()]
    } else {
        config_dir
            .ancestors()
            .map(|dir| dir.join(VENDOR_DIR).join(target).clean())
            .collect()
    };

    candidates.into_iter().find_map(|candidate| {
        [
            candidate.clone(),
            append_extension(&candidate, "json"),
            candidate.join("tsconfig.json"),
        ]
        .into_iter()
        .find(|file| file.is_file())
    })
}

/// Build-tool configuration handed to the module resolver on every lookup.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Bundler aliases, `name` or `name/...` mapped onto a path.
    pub aliases: IndexMap<String, PathBuf>,
    pub ts_paths: Option<TsPaths>,
    /// Prefer `foo.js` over `foo.d.ts` when both exist.
    pub no_type_definitions: bool,
    /// package.json field naming a package's entry file.
    pub package_entry: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            aliases: IndexMap::new(),
            ts_paths: None,
            no_type_definitions: false,
            package_entry: "main".to_string(),
        }
    }
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alias(mut self, name: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        self.aliases.insert(name.into(), target.into());
        self
    }

    pub fn with_ts_paths(mut self, ts_paths: TsPaths) -> Self {
        self.ts_paths = Some(ts_paths);
        self
    }

    pub fn with_no_type_definitions(mut self, no_type_definitions: bool) -> Self {
        self.no_type_definitions = no_type_definitions;
        self
    }

    pub fn with_package_entry(mut self, field: impl Into<String>) -> Self {
        self.package_entry = field.into();
        self
    }
}

/// Parse a `NAME=PATH` alias argument.
pub fn parse_alias(raw: &str) -> Result<(String, PathBuf), ConfigError> {
    match raw.split_once('=') {
        Some((name, target)) if !name.trim().is_empty() && !target.trim().is_empty() => {
            Ok((name.trim().to_string(), PathBuf::from(target.trim())))
        }
        _ => Err(ConfigError::InvalidAlias(raw.to_string())),
    }
}

/// Everything one top-level traversal needs. Paths are normalized to
/// absolute form on construction.
#[derive(Clone)]
pub struct TraversalConfig {
    pub filename: PathBuf,
    pub directory: PathBuf,
    pub output_mode: OutputMode,
    pub filter: Option<DependencyFilter>,
    pub ignore_node_modules: bool,
    pub build: BuildConfig,
}

impl TraversalConfig {
    pub fn new(filename: impl AsRef<Path>, directory: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        Ok(Self::with_cwd(filename.as_ref(), directory.as_ref(), &cwd))
    }

    /// Like [`TraversalConfig::new`] with an explicit working directory.
    pub fn with_cwd(filename: &Path, directory: &Path, cwd: &Path) -> Self {
        Self {
            filename: absolutize(filename, cwd),
            directory: absolutize(directory, cwd),
            output_mode: OutputMode::Tree,
            filter: None,
            ignore_node_modules: false,
            build: BuildConfig::default(),
        }
    }

    pub fn with_output_mode(mut self, output_mode: OutputMode) -> Self {
        self.output_mode = output_mode;
        self
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Path, &Path) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn with_ignore_node_modules(mut self, ignore: bool) -> Self {
        self.ignore_node_modules = ignore;
        self
    }

    pub fn with_build(mut self, build: BuildConfig) -> Self {
        self.build = build;
        self
    }
}

impl fmt::Debug for TraversalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalConfig")
            .field("filename", &self.filename)
            .field("directory", &self.directory)
            .field("output_mode", &self.output_mode)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .field("ignore_node_modules", &self.ignore_node_modules)
            .field("build", &self.build)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn tsconfig_with_comments_and_trailing_commas() {
        let dir = TempDir::new().unwrap();
        let text = r#"{
            // project options
            "compilerOptions": {
                "baseUrl": "./src", /* resolved against the config */
                "paths": {
                    "@app/*": ["app/*",],
                },
            },
        }"#;
        let ts = TsPaths::load(&write(dir.path(), "tsconfig.json", text)).unwrap();
        assert_eq!(ts.base_url, Some(dir.path().join("src")));
        assert_eq!(ts.paths_base, dir.path().join("src"));
        assert_eq!(ts.paths["@app/*"], vec!["app/*".to_string()]);
    }

    #[test]
    fn comment_markers_inside_strings_survive() {
        let dir = TempDir::new().unwrap();
        let text = r#"{"compilerOptions": {"paths": {"http://x/*": ["a/*"]}}}"#;
        let ts = TsPaths::load(&write(dir.path(), "tsconfig.json", text)).unwrap();
        assert!(ts.paths.contains_key("http://x/*"));
        assert_eq!(ts.paths_base, dir.path());
    }

    #[test]
    fn extended_options_are_overridden_per_field() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "configs/base.json",
            r#"{"compilerOptions": {"baseUrl": "..", "paths": {"@lib/*": ["lib/*"]}}}"#,
        );
        write(
            dir.path(),
            "configs/strict.json",
            r#"{"compilerOptions": {"paths": {"@strict/*": ["strict/*"]}}}"#,
        );
        let config = write(
            dir.path(),
            "tsconfig.json",
            r#"{"extends": ["./configs/strict", "./configs/base.json"]}"#,
        );

        let ts = TsPaths::load(&config).unwrap();
        assert_eq!(ts.base_url, Some(dir.path().to_path_buf()));
        assert_eq!(ts.paths_base, dir.path());
        assert!(ts.paths.contains_key("@lib/*"));
        assert!(!ts.paths.contains_key("@strict/*"));
    }

    #[test]
    fn paths_without_base_url_are_relative_to_their_declaring_config() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "shared/tsconfig.json",
            r#"{"compilerOptions": {"paths": {"~/*": ["src/*"]}}}"#,
        );
        let config = write(dir.path(), "app/tsconfig.json", r#"{"extends": "../shared/tsconfig.json"}"#);

        let ts = TsPaths::load(&config).unwrap();
        assert_eq!(ts.base_url, None);
        assert_eq!(ts.paths_base, dir.path().join("shared"));
    }

    #[test]
    fn extends_from_node_modules_package() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "node_modules/@tsconfig/node20/tsconfig.json",
            r#"{"compilerOptions": {"baseUrl": "."}}"#,
        );
        let config = write(dir.path(), "pkg/tsconfig.json", r#"{"extends": "@tsconfig/node20"}"#);

        let ts = TsPaths::load(&config).unwrap();
        assert_eq!(ts.base_url, Some(dir.path().join("node_modules/@tsconfig/node20")));
    }

    #[test]
    fn broken_extends_chains_are_errors() {
        let dir = TempDir::new().unwrap();
        let missing = write(dir.path(), "missing.json", r#"{"extends": "./nowhere.json"}"#);
        assert!(matches!(
            TsPaths::load(&missing),
            Err(ConfigError::UnresolvedExtends { ref extends, .. }) if extends == "./nowhere.json"
        ));

        write(dir.path(), "a.json", r#"{"extends": "./b.json"}"#);
        let cyclic = write(dir.path(), "b.json", r#"{"extends": "./a.json"}"#);
        let err = TsPaths::load(&cyclic).unwrap_err();
        assert!(matches!(err, ConfigError::ExtendsCycle(_)));
        assert!(err.to_string().contains("b.json"));
    }

    #[test]
    fn alias_arguments() {
        assert_eq!(
            parse_alias("@=./src").unwrap(),
            ("@".to_string(), PathBuf::from("./src"))
        );
        assert!(matches!(parse_alias("nope"), Err(ConfigError::InvalidAlias(_))));
        assert!(matches!(parse_alias("=x"), Err(ConfigError::InvalidAlias(_))));
    }

    #[test]
    fn config_paths_are_absolute() {
        let config = TraversalConfig::with_cwd(Path::new("src/index.js"), Path::new("."), Path::new("/work"));
        assert_eq!(config.filename, PathBuf::from("/work/src/index.js"));
        assert_eq!(config.directory, PathBuf::from("/work"));
        assert!(!config.output_mode.is_list());
    }
}
