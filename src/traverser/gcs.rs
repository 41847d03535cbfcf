// Copyright 2026 xfercore contributors.

//! Lists a GCS bucket by prefix, with delimiter empty for recursive
//! traversal and `/` for non-recursive.

use std::sync::Arc;

use google_cloud_storage::client::Client;
use google_cloud_storage::http::objects::list::ListObjectsRequest;
use tokio::runtime::Runtime;

use crate::error::{Error, Result};
use crate::filter::FilterChain;
use crate::stored_object::StoredObject;

use super::{drive_one, EnumerationCounter, Morpher, Processor, Traverser};

pub struct GCSTraverser {
    runtime: Arc<Runtime>,
    client: Client,
    bucket: String,
    prefix: String,
    recursive: bool,
    destination_is_dfs: bool,
}

impl GCSTraverser {
    pub fn new(
        runtime: Arc<Runtime>,
        client: Client,
        bucket: String,
        object_key: Option<&str>,
        recursive: bool,
        destination_is_dfs: bool,
    ) -> Self {
        let prefix = object_key.unwrap_or("").to_string();
        GCSTraverser {
            runtime,
            client,
            bucket,
            prefix,
            recursive,
            destination_is_dfs,
        }
    }
}

impl Traverser for GCSTraverser {
    fn is_directory(&self, _is_source: bool) -> bool {
        self.prefix.is_empty() || self.prefix.ends_with('/')
    }

    fn traverse(
        &self,
        preprocess: Option<&Morpher<'_>>,
        process: &mut Processor<'_>,
        filters: &FilterChain,
        counter: Option<&EnumerationCounter<'_>>,
    ) -> Result<()> {
        let delimiter = if self.recursive { None } else { Some("/".to_string()) };
        let mut page_token: Option<String> = None;
        loop {
            let request = ListObjectsRequest {
                bucket: self.bucket.clone(),
                prefix: if self.prefix.is_empty() {
                    None
                } else {
                    Some(self.prefix.clone())
                },
                delimiter: delimiter.clone(),
                page_token: page_token.clone(),
                ..Default::default()
            };
            let response = self
                .runtime
                .block_on(self.client.list_objects(&request))
                .map_err(|err| Error::listing_failed(format!("gs://{}/{}", self.bucket, self.prefix), err))?;

            for object in response.items.unwrap_or_default() {
                let key = object.name.clone();
                if key.ends_with('/') && !self.destination_is_dfs {
                    continue;
                }
                let relative_path = key
                    .strip_prefix(&self.prefix)
                    .unwrap_or(&key)
                    .trim_start_matches('/')
                    .to_string();
                if relative_path.is_empty() {
                    continue;
                }
                if !self.recursive && relative_path.contains('/') {
                    continue;
                }
                let mut obj = StoredObject::file(relative_path, object.size.try_into().unwrap_or(0));
                obj.container_name = Some(self.bucket.clone());
                obj.content_type = object.content_type.clone();
                obj.content_encoding = object.content_encoding.clone();
                obj.content_disposition = object.content_disposition.clone();
                obj.content_language = object.content_language.clone();
                obj.cache_control = object.cache_control.clone();
                for (k, v) in object.metadata.unwrap_or_default() {
                    obj.metadata.insert(k, v);
                }
                drive_one(obj, preprocess, process, filters, counter)?;
            }

            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        Ok(())
    }
}
