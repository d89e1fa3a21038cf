#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use oxide_dialect_fs::prelude::*;
use tempfile::TempDir;

/// Writes `files` (relative path, contents) under a fresh temporary directory.
pub fn disk_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for (path, contents) in files {
        write(dir.path(), path, contents);
    }
    dir
}

pub fn write(root: &Path, path: &str, contents: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create fixture dir");
    }
    std::fs::write(full, contents).expect("Failed to write fixture");
}

pub fn mem_tree(files: &[(&str, &str)]) -> Arc<dyn SourceFs> {
    Arc::new(files.iter().copied().collect::<MemFs>())
}

pub fn registration(root: Arc<dyn SourceFs>, options: DialectOptions) -> DialectRegistration {
    DialectRegistration::new(root, options)
}

/// Lists a build as `dir/path` strings in application order.
pub fn listing(result: &DialectBuildResult) -> Vec<String> {
    result
        .files()
        .map(|f| format!("{}/{}", f.dir, f.path))
        .collect()
}

pub struct Conn(pub &'static str);

impl DialectConnection for Conn {
    fn dialect_name(&self) -> &str {
        self.0
    }
}
