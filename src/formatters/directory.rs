use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use super::FormatError;

/// A file list folded into the directory structure it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DirectoryNode {
    File,
    Dir(IndexMap<String, DirectoryNode>),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DirectoryView {
    roots: IndexMap<String, DirectoryNode>,
}

fn segment(component: &Component) -> String {
    match component {
        Component::RootDir => "/".to_string(),
        other => other.as_os_str().to_string_lossy().into_owned(),
    }
}

impl DirectoryView {
    /// Fails when one path is used both as a file and as a directory.
    pub fn build<P: AsRef<Path>>(paths: &[P]) -> Result<Self, FormatError> {
        let mut view = DirectoryView::default();
        for path in paths {
            view.insert(path.as_ref())?;
        }
        Ok(view)
    }

    fn insert(&mut self, path: &Path) -> Result<(), FormatError> {
        let components: Vec<Component> = path.components().collect();
        let Some((file, dirs)) = components.split_last() else {
            return Ok(());
        };

        let mut walked = PathBuf::new();
        let mut level = &mut self.roots;
        for dir in dirs {
            walked.push(dir.as_os_str());
            let node = level
                .entry(segment(dir))
                .or_insert_with(|| DirectoryNode::Dir(IndexMap::new()));
            level = match node {
                DirectoryNode::Dir(children) => children,
                DirectoryNode::File => return Err(FormatError::PathConflict { path: walked }),
            };
        }

        walked.push(file.as_os_str());
        match level.entry(segment(file)).or_insert(DirectoryNode::File) {
            DirectoryNode::File => Ok(()),
            DirectoryNode::Dir(_) => Err(FormatError::PathConflict { path: walked }),
        }
    }

    pub fn roots(&self) -> &IndexMap<String, DirectoryNode> {
        &self.roots
    }

    /// Indented listing, directories suffixed with `/`.
    pub fn render(&self) -> String {
        let mut output = String::new();
        write_level(&self.roots, 0, &mut output);
        output.trim_end().to_string()
    }
}

fn write_level(level: &IndexMap<String, DirectoryNode>, depth: usize, output: &mut String) {
    let indent = "  ".repeat(depth);
    for (name, node) in level {
        match node {
            DirectoryNode::File => output.push_str(&format!("{indent}{name}\n")),
            DirectoryNode::Dir(children) => {
                let label = if name.ends_with('/') {
                    name.clone()
                } else {
                    format!("{name}/")
                };
                output.push_str(&format!("{indent}{label}\n"));
                write_level(children, depth + 1, output);
            }
        }
    }
}
