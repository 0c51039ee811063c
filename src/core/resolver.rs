use path_clean::PathClean;
use std::fs;
use std::path::{Path, PathBuf};

use super::config::{BuildConfig, TsPaths};
use super::paths::{append_extension, VENDOR_DIR};
use crate::parsers::ParserMode;

const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "json"];
const TYPED_EXTENSIONS: &[&str] = &["ts", "tsx", "d.ts", "js", "jsx", "mjs", "cjs", "json"];
const TYPED_FIELDS: &[&str] = &["types", "typings"];

/// One specifier lookup, with everything a resolver may consult.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub specifier: &'a str,
    pub from_file: &'a Path,
    /// Base for bare and aliased specifiers; the package root for files
    /// inside vendored packages.
    pub directory: &'a Path,
    pub build: &'a BuildConfig,
}

/// Maps a specifier onto an absolute file path, or `None` when it cannot.
pub trait ModuleResolver {
    fn resolve(&self, request: &ResolveRequest<'_>) -> Option<PathBuf>;
}

/// Node and TypeScript style resolution: relative paths with extension and
/// index probing, bundler aliases, tsconfig `paths`/`baseUrl`, and
/// `node_modules` packages.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeResolver;

impl NodeResolver {
    pub fn new() -> Self {
        Self
    }

    fn extensions(typed: bool) -> &'static [&'static str] {
        if typed {
            TYPED_EXTENSIONS
        } else {
            SCRIPT_EXTENSIONS
        }
    }

    fn resolve_path(&self, candidate: &Path, typed: bool, build: &BuildConfig) -> Option<PathBuf> {
        self.resolve_file(candidate, typed).or_else(|| {
            if candidate.is_dir() {
                self.resolve_package_dir(candidate, typed, build)
            } else {
                None
            }
        })
    }

    fn resolve_file(&self, candidate: &Path, typed: bool) -> Option<PathBuf> {
        if candidate.is_file() {
            return Some(candidate.to_path_buf());
        }

        for extension in Self::extensions(typed) {
            let path = append_extension(candidate, extension);
            if path.is_file() {
                return Some(path);
            }
        }

        // TypeScript sources import their siblings by the emitted `.js` name
        if typed {
            if let Some(stem) = strip_suffix(candidate, &[".js", ".jsx", ".mjs", ".cjs"]) {
                for extension in ["ts", "tsx", "d.ts"] {
                    let path = append_extension(&stem, extension);
                    if path.is_file() {
                        return Some(path);
                    }
                }
            }
        }

        None
    }

    fn resolve_index(&self, dir: &Path, typed: bool) -> Option<PathBuf> {
        self.resolve_file(&dir.join("index"), typed)
    }

    fn resolve_package_dir(&self, dir: &Path, typed: bool, build: &BuildConfig) -> Option<PathBuf> {
        if let Some(manifest) = read_manifest(dir) {
            let typed_fields: &[&str] = if typed { TYPED_FIELDS } else { &[] };
            let fields = typed_fields
                .iter()
                .copied()
                .chain([build.package_entry.as_str(), "main"]);

            for field in fields {
                let Some(entry) = manifest.get(field).and_then(|value| value.as_str()) else {
                    continue;
                };
                let candidate = dir.join(entry).clean();
                if let Some(found) = self
                    .resolve_file(&candidate, typed)
                    .or_else(|| self.resolve_index(&candidate, typed))
                {
                    return Some(found);
                }
            }
        }

        self.resolve_index(dir, typed)
    }

    fn resolve_alias(&self, request: &ResolveRequest<'_>, typed: bool) -> Option<PathBuf> {
        let specifier = request.specifier;
        for (name, target) in &request.build.aliases {
            let rest = if specifier == name.as_str() {
                ""
            } else if let Some(rest) = specifier
                .strip_prefix(name.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
            {
                rest
            } else {
                continue;
            };

            let base = request.directory.join(target);
            let candidate = if rest.is_empty() { base } else { base.join(rest) };
            return self.resolve_path(&candidate.clean(), typed, request.build);
        }
        None
    }

    fn resolve_ts_paths(&self, request: &ResolveRequest<'_>, typed: bool) -> Option<PathBuf> {
        let ts = request.build.ts_paths.as_ref()?;
        let specifier = request.specifier;

        if let Some((captured, targets)) = best_path_match(ts, specifier) {
            for target in targets {
                let candidate = ts.paths_base.join(target.replacen('*', captured, 1)).clean();
                if let Some(found) = self.resolve_path(&candidate, typed, request.build) {
                    return Some(found);
                }
            }
        }

        let base_url = ts.base_url.as_ref()?;
        self.resolve_path(&base_url.join(specifier).clean(), typed, request.build)
    }

    fn resolve_package(&self, request: &ResolveRequest<'_>, typed: bool) -> Option<PathBuf> {
        let (package, subpath) = split_package_specifier(request.specifier)?;

        for dir in request.directory.ancestors() {
            let modules = dir.join(VENDOR_DIR);
            if !modules.is_dir() {
                continue;
            }

            let mut roots = vec![modules.join(package)];
            if typed {
                roots.push(modules.join("@types").join(types_package_name(package)));
            }

            for root in roots {
                if !root.is_dir() {
                    continue;
                }
                let found = match subpath {
                    Some(subpath) => self.resolve_path(&root.join(subpath).clean(), typed, request.build),
                    None => self.resolve_package_dir(&root, typed, request.build),
                };
                if found.is_some() {
                    return found;
                }
            }
        }

        None
    }

    fn prefer_javascript(&self, resolved: PathBuf, build: &BuildConfig) -> PathBuf {
        if !build.no_type_definitions {
            return resolved;
        }
        match strip_suffix(&resolved, &[".d.ts"]) {
            Some(stem) => {
                let javascript = append_extension(&stem, "js");
                if javascript.is_file() {
                    javascript
                } else {
                    resolved
                }
            }
            None => resolved,
        }
    }
}

impl ModuleResolver for NodeResolver {
    fn resolve(&self, request: &ResolveRequest<'_>) -> Option<PathBuf> {
        let specifier = request.specifier;
        if specifier.is_empty() {
            return None;
        }

        let typed = ParserMode::from_path(request.from_file)
            .map(ParserMode::is_typed)
            .unwrap_or(false);

        let resolved = if is_relative(specifier) || Path::new(specifier).is_absolute() {
            let base = request.from_file.parent()?;
            self.resolve_path(&base.join(specifier).clean(), typed, request.build)
        } else {
            self.resolve_alias(request, typed)
                .or_else(|| self.resolve_ts_paths(request, typed))
                .or_else(|| self.resolve_package(request, typed))
        }?;

        Some(self.prefer_javascript(resolved, request.build))
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

fn strip_suffix(path: &Path, suffixes: &[&str]) -> Option<PathBuf> {
    let raw = path.to_str()?;
    suffixes
        .iter()
        .find_map(|suffix| raw.strip_suffix(suffix))
        .map(PathBuf::from)
}

fn read_manifest(dir: &Path) -> Option<serde_json::Value> {
    let text = fs::read_to_string(dir.join("package.json")).ok()?;
    match serde_json::from_str(&text) {
        Ok(manifest) => Some(manifest),
        Err(err) => {
            tracing::debug!("ignoring malformed package.json in {}: {err}", dir.display());
            None
        }
    }
}

/// `lodash/fp` -> (`lodash`, `fp`), `@babel/core` -> (`@babel/core`, none).
fn split_package_specifier(specifier: &str) -> Option<(&str, Option<&str>)> {
    let split_at = if specifier.starts_with('@') {
        let scope_end = specifier.find('/')?;
        specifier[scope_end + 1..]
            .find('/')
            .map(|offset| scope_end + 1 + offset)
    } else {
        specifier.find('/')
    };

    match split_at {
        Some(index) => Some((&specifier[..index], Some(&specifier[index + 1..]))),
        None => Some((specifier, None)),
    }
}

/// `@scope/name` is published under `@types/scope__name`.
fn types_package_name(package: &str) -> String {
    match package.strip_prefix('@') {
        Some(scoped) => scoped.replacen('/', "__", 1),
        None => package.to_string(),
    }
}

/// The `paths` pattern with the longest literal prefix matching `specifier`,
/// along with the text its `*` captured.
fn best_path_match<'a>(ts: &'a TsPaths, specifier: &'a str) -> Option<(&'a str, &'a [String])> {
    let mut best: Option<(usize, &str, &[String])> = None;

    for (pattern, targets) in &ts.paths {
        let matched = match pattern.split_once('*') {
            Some((prefix, suffix)) => {
                if specifier.len() >= prefix.len() + suffix.len()
                    && specifier.starts_with(prefix)
                    && specifier.ends_with(suffix)
                {
                    Some((prefix.len(), &specifier[prefix.len()..specifier.len() - suffix.len()]))
                } else {
                    None
                }
            }
            None if pattern == specifier => Some((usize::MAX, "")),
            None => None,
        };

        if let Some((rank, captured)) = matched {
            if best.map_or(true, |(best_rank, _, _)| rank > best_rank) {
                best = Some((rank, captured, targets.as_slice()));
            }
        }
    }

    best.map(|(_, captured, targets)| (captured, targets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_specifiers_split_scope_and_subpath() {
        assert_eq!(split_package_specifier("lodash"), Some(("lodash", None)));
        assert_eq!(split_package_specifier("lodash/fp/map"), Some(("lodash", Some("fp/map"))));
        assert_eq!(split_package_specifier("@babel/core"), Some(("@babel/core", None)));
        assert_eq!(
            split_package_specifier("@babel/core/lib/index"),
            Some(("@babel/core", Some("lib/index")))
        );
        assert_eq!(split_package_specifier("@broken"), None);
    }

    #[test]
    fn longest_prefix_pattern_wins() {
        let mut ts = TsPaths::default();
        ts.paths.insert("@app/*".to_string(), vec!["app/*".to_string()]);
        ts.paths.insert("@app/ui/*".to_string(), vec!["ui/*".to_string()]);
        ts.paths.insert("config".to_string(), vec!["config/index".to_string()]);

        let (captured, targets) = best_path_match(&ts, "@app/ui/button").unwrap();
        assert_eq!(captured, "button");
        assert_eq!(targets, ["ui/*".to_string()]);

        let (captured, _) = best_path_match(&ts, "config").unwrap();
        assert_eq!(captured, "");
        assert!(best_path_match(&ts, "react").is_none());
    }

    #[test]
    fn types_packages_mangle_scopes() {
        assert_eq!(types_package_name("node"), "node");
        assert_eq!(types_package_name("@babel/core"), "babel__core");
    }
}
