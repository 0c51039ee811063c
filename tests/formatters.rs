use deptree::core::{traverse, DependencyOutput, OutputMode, TraversalConfig};
use deptree::formatters::{DirectoryView, FormatError, JsonFormatter, PrettyTreeFormatter};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, name: &str, content: &str) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn project(root: &Path) -> PathBuf {
    write(root, "src/lib/util.js", "export function util() {}\n");
    write(
        root,
        "src/app.js",
        "import { util } from './lib/util';\nexport class App {}\n",
    );
    write(root, "index.js", "import './src/app';\nmodule.exports = 1;\n")
}

#[test]
fn json_tree_is_keyed_by_absolute_path() {
    let dir = TempDir::new().unwrap();
    let entry = project(dir.path());
    let app = dir.path().join("src/app.js");
    let util = dir.path().join("src/lib/util.js");

    let report = traverse(&TraversalConfig::with_cwd(&entry, dir.path(), dir.path()));
    let text = JsonFormatter::new().format(&report.output).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();

    let expected = serde_json::json!({
        entry.to_str().unwrap(): {
            app.to_str().unwrap(): {
                util.to_str().unwrap(): {}
            }
        }
    });
    assert_eq!(json, expected);
}

#[test]
fn compact_json_list() {
    let output = DependencyOutput::List(vec![PathBuf::from("/p/b.js"), PathBuf::from("/p/a.js")]);
    assert_eq!(
        JsonFormatter::compact().format(&output).unwrap(),
        r#"["/p/b.js","/p/a.js"]"#
    );
}

#[test]
fn json_written_to_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("tree.json");
    let output = DependencyOutput::List(vec![PathBuf::from("/p/a.js")]);

    JsonFormatter::new().format_to_file(&output, &out).unwrap();
    let written: Vec<String> = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written, vec!["/p/a.js".to_string()]);
}

#[test]
fn pretty_tree_with_exports() {
    let dir = TempDir::new().unwrap();
    let entry = project(dir.path());

    let report = traverse(&TraversalConfig::with_cwd(&entry, dir.path(), dir.path()));
    let tree = report.output.as_tree().unwrap();

    assert_eq!(
        PrettyTreeFormatter::new().format(tree),
        "index.js\n└── app.js\n    └── util.js"
    );
    assert_eq!(
        PrettyTreeFormatter::new().with_symbols(true).format(tree),
        "index.js\n  * module.exports = 1 (variable)\n└── app.js\n    * App (class)\n    └── util.js\n        * util() (function)"
    );
}

#[test]
fn directory_view_of_relative_list() {
    let dir = TempDir::new().unwrap();
    let entry = project(dir.path());

    let config = TraversalConfig::with_cwd(&entry, dir.path(), dir.path())
        .with_output_mode(OutputMode::ListAbsolute);
    let list = traverse(&config).output.as_list().unwrap().to_vec();
    let relative: Vec<PathBuf> = list
        .iter()
        .map(|path| path.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();

    let view = DirectoryView::build(&relative).unwrap();
    assert_eq!(view.render(), "src/\n  lib/\n    util.js\n  app.js\nindex.js");

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "src": { "lib": { "util.js": null }, "app.js": null },
            "index.js": null
        })
    );
}

#[test]
fn directory_view_rejects_file_used_as_directory() {
    let err = DirectoryView::build(&["lib/util.js", "lib/util.js/extra.js"]).unwrap_err();
    assert!(matches!(err, FormatError::PathConflict { ref path } if path == Path::new("lib/util.js")));
    assert!(err.to_string().contains("lib/util.js"));
}
