// Copyright 2026 xfercore contributors.

//! Walks a local directory tree.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use tracing::warn;

use crate::error::{Error, Result};
use crate::filter::FilterChain;
use crate::stored_object::{EntityType, StoredObject};

use super::{drive_one, EnumerationCounter, Morpher, Processor, SymlinkMode, Traverser};

pub struct LocalTraverser {
    /// The longest directory prefix without a wildcard, anchoring
    /// relative paths.
    root: PathBuf,
    /// Concrete roots to walk: one, unless the original root contained a
    /// wildcard that expanded to several matches.
    entry_points: Vec<PathBuf>,
    symlink_mode: SymlinkMode,
    recursive: bool,
}

impl LocalTraverser {
    /// Build a traverser for `root_spec`, expanding any wildcard against
    /// the filesystem.
    pub fn new(root_spec: &str, symlink_mode: SymlinkMode, recursive: bool) -> Result<Self> {
        if has_wildcard(root_spec) {
            let anchor = longest_non_wildcard_prefix(root_spec);
            let mut entry_points: Vec<PathBuf> = glob(root_spec)
                .map_err(|e| Error::invalid_url(root_spec, e.to_string()))?
                .filter_map(|r| r.ok())
                .collect();
            entry_points.sort();
            Ok(LocalTraverser {
                root: anchor,
                entry_points,
                symlink_mode,
                recursive,
            })
        } else {
            let root = PathBuf::from(root_spec);
            Ok(LocalTraverser {
                root: root.clone(),
                entry_points: vec![root],
                symlink_mode,
                recursive,
            })
        }
    }

    fn relative_path(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        normalize_separators(rel)
    }
}

impl Traverser for LocalTraverser {
    fn is_directory(&self, _is_source: bool) -> bool {
        self.entry_points.len() > 1
            || self
                .entry_points
                .first()
                .map(|p| p.is_dir())
                .unwrap_or(false)
    }

    fn traverse(
        &self,
        preprocess: Option<&Morpher<'_>>,
        process: &mut Processor<'_>,
        filters: &FilterChain,
        counter: Option<&EnumerationCounter<'_>>,
    ) -> Result<()> {
        let mut visited_real_paths: HashSet<PathBuf> = HashSet::new();
        for entry_point in &self.entry_points {
            if entry_point.is_dir() {
                self.walk_dir(entry_point, preprocess, process, filters, counter, &mut visited_real_paths)?;
            } else if entry_point.is_file() || entry_point.symlink_metadata().is_ok() {
                if let Some(obj) = self.stat_one(entry_point)? {
                    drive_one(obj, preprocess, process, filters, counter)?;
                }
            }
        }
        Ok(())
    }
}

impl LocalTraverser {
    fn stat_one(&self, path: &Path) -> Result<Option<StoredObject>> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(_) => return Ok(None),
        };
        let relative_path = self.relative_path(path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if metadata.file_type().is_symlink() {
            return match self.symlink_mode {
                SymlinkMode::Skip => Ok(None),
                SymlinkMode::Preserve => {
                    let mut obj = StoredObject::file(relative_path, 0);
                    obj.name = name;
                    obj.entity_type = EntityType::Symlink;
                    Ok(Some(obj))
                }
                SymlinkMode::Follow => {
                    let target_meta = fs::metadata(path).map_err(|e| Error::listing_failed(path.display().to_string(), e))?;
                    Ok(Some(self.object_from_metadata(path, &relative_path, &name, &target_meta)))
                }
            };
        }

        if metadata.is_dir() {
            let mut obj = StoredObject::folder(relative_path);
            obj.name = name;
            return Ok(Some(obj));
        }
        if metadata.is_file() {
            return Ok(Some(self.object_from_metadata(path, &relative_path, &name, &metadata)));
        }
        // Devices, sockets, and other non-regular entries are skipped
        // silently.
        Ok(None)
    }

    fn object_from_metadata(&self, _path: &Path, relative_path: &str, name: &str, metadata: &fs::Metadata) -> StoredObject {
        let mut obj = StoredObject::file(relative_path.to_string(), metadata.len());
        obj.name = name.to_string();
        obj.last_modified = metadata.modified().ok().map(time::OffsetDateTime::from);
        obj
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_dir(
        &self,
        dir: &Path,
        preprocess: Option<&Morpher<'_>>,
        process: &mut Processor<'_>,
        filters: &FilterChain,
        counter: Option<&EnumerationCounter<'_>>,
        visited_real_paths: &mut HashSet<PathBuf>,
    ) -> Result<()> {
        if let SymlinkMode::Follow = self.symlink_mode {
            if let Ok(canonical) = dir.canonicalize() {
                if !visited_real_paths.insert(canonical.clone()) {
                    warn!(path = %dir.display(), "symlink cycle detected; skipping subtree");
                    return Err(Error::SymlinkCycle { path: dir.to_path_buf() });
                }
            }
        }

        let mut dir_queue: VecDeque<PathBuf> = VecDeque::new();
        dir_queue.push_back(dir.to_path_buf());

        while let Some(current) = dir_queue.pop_front() {
            let mut entries: Vec<_> = match fs::read_dir(&current) {
                Ok(iter) => iter.filter_map(|e| e.ok()).collect(),
                Err(e) => return Err(Error::listing_failed(current.display().to_string(), e)),
            };
            entries.sort_by_key(|e| e.file_name());

            for entry in entries {
                let path = entry.path();
                let obj = match self.stat_one(&path) {
                    Ok(Some(obj)) => obj,
                    Ok(None) => continue,
                    Err(err) if matches!(err, Error::SymlinkCycle { .. }) => {
                        continue;
                    }
                    Err(err) => return Err(err),
                };

                let is_dir_entry = obj.entity_type == EntityType::Folder;
                let is_symlink_to_dir = obj.entity_type == EntityType::File
                    && entry.file_type().map(|t| t.is_symlink()).unwrap_or(false)
                    && matches!(self.symlink_mode, SymlinkMode::Follow)
                    && path.is_dir();

                drive_one(obj, preprocess, process, filters, counter)?;

                if self.recursive {
                    if is_dir_entry {
                        dir_queue.push_back(path);
                    } else if is_symlink_to_dir {
                        match self.walk_dir(&path, preprocess, process, filters, counter, visited_real_paths) {
                            Ok(()) => {}
                            Err(Error::SymlinkCycle { .. }) => {
                                warn!(path = %path.display(), "symlink cycle; subtree skipped");
                            }
                            Err(e) => return Err(e),
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn has_wildcard(s: &str) -> bool {
    s.contains('*') || s.contains('?')
}

fn longest_non_wildcard_prefix(spec: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in Path::new(spec).components() {
        let s = component.as_os_str().to_string_lossy();
        if has_wildcard(&s) {
            break;
        }
        prefix.push(component);
    }
    prefix
}

/// Windows extended-length paths (`\\?\...`) are preserved as-is;
/// everything else has its separators normalized to `/`.
fn normalize_separators(path: &Path) -> String {
    let s = path.to_string_lossy();
    if s.starts_with(r"\\?\") {
        return s.into_owned();
    }
    s.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    fn collect(traverser: &LocalTraverser) -> Vec<String> {
        let mut out = Vec::new();
        let mut process = |obj: StoredObject| {
            out.push(obj.relative_path);
            Ok(())
        };
        traverser
            .traverse(None, &mut process, &FilterChain::new(), None)
            .unwrap();
        out.sort();
        out
    }

    #[test]
    fn walks_nested_directories_in_order() {
        let tmp = TempDir::new().unwrap();
        tmp.child("a.txt").write_str("x").unwrap();
        tmp.child("sub/b.txt").write_str("y").unwrap();
        let traverser = LocalTraverser::new(
            tmp.path().to_str().unwrap(),
            SymlinkMode::Skip,
            true,
        )
        .unwrap();
        let paths = collect(&traverser);
        assert!(paths.contains(&"a.txt".to_string()));
        assert!(paths.contains(&"sub".to_string()));
        assert!(paths.contains(&"sub/b.txt".to_string()));
    }

    #[test]
    fn non_recursive_skips_nested_files() {
        let tmp = TempDir::new().unwrap();
        tmp.child("a.txt").write_str("x").unwrap();
        tmp.child("sub/b.txt").write_str("y").unwrap();
        let traverser = LocalTraverser::new(tmp.path().to_str().unwrap(), SymlinkMode::Skip, false).unwrap();
        let paths = collect(&traverser);
        assert!(paths.contains(&"a.txt".to_string()));
        assert!(!paths.contains(&"sub/b.txt".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_skip_mode_omits_links() {
        let tmp = TempDir::new().unwrap();
        tmp.child("a.txt").write_str("x").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("a.txt"), tmp.path().join("link")).unwrap();
        let traverser = LocalTraverser::new(tmp.path().to_str().unwrap(), SymlinkMode::Skip, true).unwrap();
        let paths = collect(&traverser);
        assert!(!paths.contains(&"link".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_preserve_mode_emits_symlink_entity() {
        let tmp = TempDir::new().unwrap();
        tmp.child("a.txt").write_str("x").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("a.txt"), tmp.path().join("link")).unwrap();
        let traverser = LocalTraverser::new(tmp.path().to_str().unwrap(), SymlinkMode::Preserve, true).unwrap();
        let mut kinds = Vec::new();
        let mut process = |obj: StoredObject| {
            kinds.push((obj.relative_path, obj.entity_type));
            Ok(())
        };
        traverser.traverse(None, &mut process, &FilterChain::new(), None).unwrap();
        assert!(kinds.contains(&("link".to_string(), EntityType::Symlink)));
    }
}
