use path_clean::PathClean;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

pub const VENDOR_DIR: &str = "node_modules";

/// Absolute, lexically normalized form of `path`.
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf().clean()
    } else {
        cwd.join(path).clean()
    }
}

/// Whether `path` lives somewhere under a `node_modules` directory.
pub fn is_vendored(path: &Path) -> bool {
    path.components()
        .any(|component| component.as_os_str() == OsStr::new(VENDOR_DIR))
}

/// Root directory of the vendored package containing `file`.
///
/// Uses the innermost `node_modules` segment of the file's directory; the
/// package name is the next segment, or the next two for `@scope/name`.
pub fn package_root_of(file: &Path) -> Option<PathBuf> {
    let components: Vec<Component> = file.parent()?.components().collect();
    let marker = components
        .iter()
        .rposition(|component| component.as_os_str() == OsStr::new(VENDOR_DIR))?;

    let name = components.get(marker + 1)?;
    let scoped = name.as_os_str().to_string_lossy().starts_with('@');
    let end = if scoped { marker + 3 } else { marker + 2 };
    if end > components.len() {
        return None;
    }

    Some(components[..end].iter().collect::<PathBuf>().clean())
}

/// `path` with `.{extension}` appended to its file name.
pub fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

/// `path` expressed relative to `base`, climbing with `..` where needed.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let shared = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in shared..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[shared..] {
        relative.push(part.as_os_str());
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_root_for_plain_and_scoped_packages() {
        assert_eq!(
            package_root_of(Path::new("/app/node_modules/lodash/fp/map.js")),
            Some(PathBuf::from("/app/node_modules/lodash"))
        );
        assert_eq!(
            package_root_of(Path::new("/app/node_modules/@babel/core/lib/index.js")),
            Some(PathBuf::from("/app/node_modules/@babel/core"))
        );
    }

    #[test]
    fn package_root_uses_innermost_vendor_dir() {
        assert_eq!(
            package_root_of(Path::new("/app/node_modules/a/node_modules/b/index.js")),
            Some(PathBuf::from("/app/node_modules/a/node_modules/b"))
        );
    }

    #[test]
    fn package_root_missing_name() {
        assert_eq!(package_root_of(Path::new("/app/node_modules/loose.js")), None);
        assert_eq!(package_root_of(Path::new("/app/src/index.js")), None);
        assert_eq!(package_root_of(Path::new("/app/node_modules/@scope/x.js")), None);
    }

    #[test]
    fn vendored_detection_is_per_segment() {
        assert!(is_vendored(Path::new("/app/node_modules/react/index.js")));
        assert!(!is_vendored(Path::new("/app/src/my_node_modules_helper.js")));
    }

    #[test]
    fn relative_paths_climb_out_of_base() {
        assert_eq!(
            relative_to(Path::new("/work/src/a.js"), Path::new("/work")),
            PathBuf::from("src/a.js")
        );
        assert_eq!(
            relative_to(Path::new("/other/b.js"), Path::new("/work/app")),
            PathBuf::from("../../other/b.js")
        );
    }

    #[test]
    fn absolutize_cleans_dot_segments() {
        assert_eq!(
            absolutize(Path::new("./src/../lib/x.js"), Path::new("/work")),
            PathBuf::from("/work/lib/x.js")
        );
    }
}
