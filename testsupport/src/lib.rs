// Copyright 2026 xfercore contributors.

//! Fixture helpers shared by `xfercore`'s test suites: a disposable tree
//! on disk, built up file by file, with a known layout to assert
//! traversal output against.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory tree for exercising [`xfercore::traverser`]
/// against a real filesystem. Disposed automatically when dropped.
pub struct TreeFixture {
    pub root: PathBuf,
    _tempdir: TempDir,
}

impl TreeFixture {
    pub fn new() -> TreeFixture {
        let tempdir = TempDir::new().expect("create tempdir");
        let root = tempdir.path().to_path_buf();
        TreeFixture {
            _tempdir: tempdir,
            root,
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn create_file(&self, relative_path: &str) -> &Self {
        self.create_file_with_contents(relative_path, b"contents")
    }

    pub fn create_file_with_contents(&self, relative_path: &str, contents: &[u8]) -> &Self {
        let full_path = self.root.join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&full_path, contents).expect("write fixture file");
        self
    }

    pub fn create_dir(&self, relative_path: &str) -> &Self {
        fs::create_dir_all(self.root.join(relative_path)).expect("create fixture dir");
        self
    }

    #[cfg(unix)]
    pub fn create_symlink(&self, relative_path: &str, target: &str) -> &Self {
        use std::os::unix::fs as unix_fs;
        unix_fs::symlink(target, self.root.join(relative_path)).expect("create fixture symlink");
        self
    }

    pub fn root_str(&self) -> &str {
        self.root.to_str().expect("fixture path is valid utf-8")
    }
}

impl Default for TreeFixture {
    fn default() -> Self {
        Self::new()
    }
}
