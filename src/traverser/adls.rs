// Copyright 2026 xfercore contributors.

//! Lists an ADLS Gen2 filesystem. Unlike Blob, directories are a native
//! concept here — no folder-stub convention needed.

use std::sync::Arc;

use azure_storage_datalake::clients::FileSystemClient;
use futures::StreamExt;
use tokio::runtime::Runtime;

use crate::error::{Error, Result};
use crate::filter::FilterChain;
use crate::stored_object::{EntityType, StoredObject};

use super::{drive_one, EnumerationCounter, Morpher, Processor, Traverser};

pub struct BlobFSTraverser {
    runtime: Arc<Runtime>,
    filesystem_client: FileSystemClient,
    filesystem_name: String,
    /// Path under the filesystem root; empty means the root.
    directory: String,
    recursive: bool,
}

impl BlobFSTraverser {
    pub fn new(
        runtime: Arc<Runtime>,
        filesystem_client: FileSystemClient,
        filesystem_name: String,
        directory: Option<&str>,
        recursive: bool,
    ) -> Self {
        BlobFSTraverser {
            runtime,
            filesystem_client,
            filesystem_name,
            directory: directory.unwrap_or("").trim_matches('/').to_string(),
            recursive,
        }
    }
}

impl Traverser for BlobFSTraverser {
    fn is_directory(&self, _is_source: bool) -> bool {
        if self.directory.is_empty() {
            return true;
        }
        self.runtime
            .block_on(async {
                self.filesystem_client
                    .get_directory_client(self.directory.clone())
                    .get_properties()
                    .into_future()
                    .await
            })
            .is_ok()
    }

    fn traverse(
        &self,
        preprocess: Option<&Morpher<'_>>,
        process: &mut Processor<'_>,
        filters: &FilterChain,
        counter: Option<&EnumerationCounter<'_>>,
    ) -> Result<()> {
        let mut list_builder = self.filesystem_client.list_paths().recursive(self.recursive);
        if !self.directory.is_empty() {
            list_builder = list_builder.directory(self.directory.clone());
        }
        let mut stream = list_builder.into_stream();
        loop {
            let next = self.runtime.block_on(stream.next());
            let page = match next {
                Some(Ok(page)) => page,
                Some(Err(err)) => {
                    return Err(Error::listing_failed(
                        format!("{}/{}", self.filesystem_name, self.directory),
                        err,
                    ));
                }
                None => break,
            };
            for path in page.paths {
                let relative = strip_root(&path.name, &self.directory);
                if relative.is_empty() {
                    continue;
                }
                if !self.recursive && relative.contains('/') {
                    continue;
                }
                let mut obj = if path.is_directory {
                    let mut o = StoredObject::folder(relative.clone());
                    o.entity_type = EntityType::Folder;
                    o
                } else {
                    StoredObject::file(relative.clone(), path.content_length.try_into().unwrap())
                };
                obj.container_name = Some(self.filesystem_name.clone());
                obj.name = relative.rsplit('/').next().unwrap_or(&relative).to_string();
                obj.last_modified = Some(path.last_modified);
                drive_one(obj, preprocess, process, filters, counter)?;
            }
        }
        Ok(())
    }
}

fn strip_root(path: &str, root: &str) -> String {
    if root.is_empty() {
        path.trim_start_matches('/').to_string()
    } else {
        path.strip_prefix(root)
            .unwrap_or(path)
            .trim_start_matches('/')
            .to_string()
    }
}
