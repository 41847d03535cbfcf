// Copyright 2026 xfercore contributors.

//! Lists an Azure Files share or directory. Directories are first-class
//! on this backend, unlike Blob's folder-stub convention.

use std::sync::Arc;

use azure_storage_files_shares::prelude::*;
use futures::StreamExt;
use tokio::runtime::Runtime;

use crate::error::{Error, Result};
use crate::filter::FilterChain;
use crate::stored_object::StoredObject;

use super::{drive_one, EnumerationCounter, Morpher, Processor, Traverser};

pub struct FileTraverser {
    runtime: Arc<Runtime>,
    share_client: ShareClient,
    share_name: String,
    /// Directory path under the share root; empty means the share root.
    root_path: String,
    recursive: bool,
}

impl FileTraverser {
    pub fn new(
        runtime: Arc<Runtime>,
        share_client: ShareClient,
        share_name: String,
        root_path: Option<&str>,
        recursive: bool,
    ) -> Self {
        FileTraverser {
            runtime,
            share_client,
            share_name,
            root_path: root_path.unwrap_or("").trim_matches('/').to_string(),
            recursive,
        }
    }

    fn directory_client(&self, path: &str) -> ShareDirectoryClient {
        if path.is_empty() {
            self.share_client.root_directory_client()
        } else {
            self.share_client.directory_client(path)
        }
    }

    fn list_one_level(
        &self,
        dir_path: &str,
        preprocess: Option<&Morpher<'_>>,
        process: &mut Processor<'_>,
        filters: &FilterChain,
        counter: Option<&EnumerationCounter<'_>>,
    ) -> Result<()> {
        let dir_client = self.directory_client(dir_path);
        let mut stream = dir_client.list_files_and_directories().into_stream();
        let mut subdirs = Vec::new();
        loop {
            let next = self.runtime.block_on(stream.next());
            let page = match next {
                Some(Ok(page)) => page,
                Some(Err(err)) => {
                    return Err(Error::listing_failed(
                        format!("{}/{}", self.share_name, dir_path),
                        err,
                    ));
                }
                None => break,
            };
            for directory in &page.directories {
                let relative = join(dir_path, &directory.name);
                let mut obj = StoredObject::folder(strip_root(&relative, &self.root_path));
                obj.container_name = Some(self.share_name.clone());
                obj.name = directory.name.clone();
                if !obj.relative_path.is_empty() {
                    drive_one(obj, preprocess, process, filters, counter)?;
                }
                subdirs.push(relative);
            }
            for file in &page.files {
                let relative = join(dir_path, &file.name);
                let mut obj = StoredObject::file(strip_root(&relative, &self.root_path), file.properties.content_length);
                obj.container_name = Some(self.share_name.clone());
                obj.name = file.name.clone();
                drive_one(obj, preprocess, process, filters, counter)?;
            }
        }
        if self.recursive {
            for subdir in subdirs {
                self.list_one_level(&subdir, preprocess, process, filters, counter)?;
            }
        }
        Ok(())
    }
}

impl Traverser for FileTraverser {
    fn is_directory(&self, _is_source: bool) -> bool {
        self.root_path.is_empty()
            || self
                .runtime
                .block_on(async { self.directory_client(&self.root_path).get_properties().into_future().await })
                .is_ok()
    }

    fn traverse(
        &self,
        preprocess: Option<&Morpher<'_>>,
        process: &mut Processor<'_>,
        filters: &FilterChain,
        counter: Option<&EnumerationCounter<'_>>,
    ) -> Result<()> {
        self.list_one_level(&self.root_path, preprocess, process, filters, counter)
    }
}

fn join(dir_path: &str, name: &str) -> String {
    if dir_path.is_empty() {
        name.to_string()
    } else {
        format!("{dir_path}/{name}")
    }
}

fn strip_root(path: &str, root: &str) -> String {
    if root.is_empty() {
        path.to_string()
    } else {
        path.strip_prefix(root)
            .unwrap_or(path)
            .trim_start_matches('/')
            .to_string()
    }
}
