// Copyright 2026 xfercore contributors.

//! Lists an Azure Blob container or virtual directory by prefix.

use std::sync::Arc;

use azure_core::error::ErrorKind as AzureErrorKind;
use azure_storage::prelude::*;
use azure_storage_blobs::prelude::*;
use futures::StreamExt;
use tokio::runtime::Runtime;

use crate::error::{Error, Result};
use crate::filter::FilterChain;
use crate::stored_object::{BlobAccessTier, BlobType, StoredObject};

use super::{drive_one, EnumerationCounter, Morpher, Processor, Traverser};

pub struct BlobTraverser {
    runtime: Arc<Runtime>,
    container_client: ContainerClient,
    container_name: String,
    /// Blob-name portion of the root, with a trailing `/` appended when
    /// not already present and not empty.
    prefix: String,
    recursive: bool,
    /// Whether the destination understands folders natively (ADLS
    /// Gen2); controls whether folder stubs are emitted or skipped.
    destination_is_dfs: bool,
    /// Forbid CPK fallback: fail rather than emit a single blob with nil
    /// properties when `GetProperties` reports
    /// `BlobUsesCustomerSpecifiedEncryption`.
    cpk_forbidden: bool,
}

impl BlobTraverser {
    pub fn new(
        runtime: Arc<Runtime>,
        container_client: ContainerClient,
        container_name: String,
        object_key: Option<&str>,
        recursive: bool,
        destination_is_dfs: bool,
        cpk_forbidden: bool,
    ) -> Self {
        let prefix = match object_key {
            None | Some("") => String::new(),
            Some(k) if k.ends_with('/') => k.to_string(),
            Some(k) => format!("{k}/"),
        };
        BlobTraverser {
            runtime,
            container_client,
            container_name,
            prefix,
            recursive,
            destination_is_dfs,
            cpk_forbidden,
        }
    }

    fn single_blob_probe(&self, object_key: &str) -> Result<Option<StoredObject>> {
        let blob_client = self.container_client.blob_client(object_key);
        let result = self.runtime.block_on(async {
            blob_client.get_properties().into_future().await
        });
        match result {
            Ok(resp) => {
                let obj = object_from_properties(&self.container_name, object_key, &resp.blob);
                if obj.is_folder_stub() {
                    Ok(None)
                } else {
                    Ok(Some(obj))
                }
            }
            Err(err) => {
                if is_customer_specified_encryption(&err) {
                    if self.cpk_forbidden {
                        return Err(Error::CpkNotSupported {
                            path: format!("{}/{}", self.container_name, object_key),
                        });
                    }
                    let mut obj = StoredObject::file(object_key.to_string(), 0);
                    obj.container_name = Some(self.container_name.clone());
                    return Ok(Some(obj));
                }
                if is_not_found(&err) {
                    Ok(None)
                } else {
                    Err(Error::listing_failed(
                        format!("{}/{}", self.container_name, object_key),
                        err,
                    ))
                }
            }
        }
    }
}

impl Traverser for BlobTraverser {
    fn is_directory(&self, is_source: bool) -> bool {
        if self.prefix.is_empty() || self.prefix.ends_with('/') {
            return true;
        }
        // A source that resolves to exactly one existing, non-folder
        // blob is treated as an object, not a directory.
        if is_source {
            return self
                .single_blob_probe(self.prefix.trim_end_matches('/'))
                .ok()
                .flatten()
                .is_none();
        }
        false
    }

    fn traverse(
        &self,
        preprocess: Option<&Morpher<'_>>,
        process: &mut Processor<'_>,
        filters: &FilterChain,
        counter: Option<&EnumerationCounter<'_>>,
    ) -> Result<()> {
        // Folder/service roots always end with `/` (or are empty); a
        // root that doesn't is a candidate single-blob probe.
        if !self.prefix.is_empty() && !self.prefix.ends_with('/') {
            if let Some(obj) = self.single_blob_probe(&self.prefix)? {
                return drive_one(obj, preprocess, process, filters, counter);
            }
        }

        let delimiter = if self.recursive { None } else { Some("/".to_string()) };
        let container = self.container_name.clone();
        let prefix = self.prefix.clone();
        let mut builder = self.container_client.list_blobs();
        if !prefix.is_empty() {
            builder = builder.prefix(prefix.clone());
        }
        if let Some(d) = &delimiter {
            builder = builder.delimiter(d.clone());
        }
        let mut stream = builder.into_stream();

        loop {
            let next = self.runtime.block_on(stream.next());
            let page = match next {
                Some(Ok(page)) => page,
                Some(Err(err)) => {
                    return Err(Error::listing_failed(format!("{container}/{prefix}"), err));
                }
                None => break,
            };
            for blob in page.blobs.blobs() {
                let obj = object_from_properties(&container, &blob.name, blob);
                if obj.is_folder_stub() {
                    if !self.destination_is_dfs {
                        continue;
                    }
                }
                let relative = obj
                    .relative_path
                    .strip_prefix(&prefix)
                    .unwrap_or(&obj.relative_path)
                    .to_string();
                let mut obj = obj;
                obj.relative_path = relative;
                obj.name = obj
                    .relative_path
                    .rsplit('/')
                    .next()
                    .unwrap_or(&obj.relative_path)
                    .to_string();
                if obj.relative_path.is_empty() {
                    continue;
                }
                if !self.recursive && obj.relative_path.contains('/') {
                    continue;
                }
                drive_one(obj, preprocess, process, filters, counter)?;
            }
        }
        Ok(())
    }
}

fn object_from_properties(container: &str, name: &str, blob: &Blob) -> StoredObject {
    let mut obj = StoredObject::file(name.to_string(), blob.properties.content_length);
    obj.container_name = Some(container.to_string());
    obj.last_modified = Some(time::OffsetDateTime::from(blob.properties.last_modified));
    obj.content_type = Some(blob.properties.content_type.clone());
    obj.content_encoding = blob.properties.content_encoding.clone();
    obj.content_disposition = blob.properties.content_disposition.clone();
    obj.content_language = blob.properties.content_language.clone();
    obj.cache_control = blob.properties.cache_control.clone();
    obj.blob_type = match blob.properties.blob_type {
        azure_storage_blobs::blob::BlobType::BlockBlob => BlobType::BlockBlob,
        azure_storage_blobs::blob::BlobType::AppendBlob => BlobType::AppendBlob,
        azure_storage_blobs::blob::BlobType::PageBlob => BlobType::PageBlob,
    };
    obj.blob_access_tier = blob
        .properties
        .access_tier
        .as_ref()
        .map(|t| match t.to_string().to_lowercase().as_str() {
            "hot" => BlobAccessTier::Hot,
            "cool" => BlobAccessTier::Cool,
            "cold" => BlobAccessTier::Cold,
            "archive" => BlobAccessTier::Archive,
            _ => BlobAccessTier::NA,
        })
        .unwrap_or(BlobAccessTier::NA);
    if let Some(metadata) = &blob.metadata {
        for (k, v) in metadata.iter() {
            obj.metadata.insert(k.clone(), v.clone());
        }
    }
    obj
}

fn is_customer_specified_encryption(err: &azure_core::Error) -> bool {
    matches!(err.kind(), AzureErrorKind::HttpResponse { .. })
        && err.to_string().contains("BlobUsesCustomerSpecifiedEncryption")
}

fn is_not_found(err: &azure_core::Error) -> bool {
    err.to_string().contains("BlobNotFound") || err.to_string().contains("404")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_gets_trailing_slash_appended() {
        // Exercise the pure prefix-normalization path without a real
        // client; BlobTraverser::new only derives `prefix`.
        let rt = Arc::new(tokio::runtime::Runtime::new().unwrap());
        let client = StorageCredentials::anonymous();
        let container_client = ClientBuilder::new("acct", client).container_client("c");
        let t = BlobTraverser::new(rt, container_client, "c".to_string(), Some("dir"), true, false, false);
        assert_eq!(t.prefix, "dir/");
    }

    #[test]
    fn empty_object_key_gives_empty_prefix() {
        let rt = Arc::new(tokio::runtime::Runtime::new().unwrap());
        let client = StorageCredentials::anonymous();
        let container_client = ClientBuilder::new("acct", client).container_client("c");
        let t = BlobTraverser::new(rt, container_client, "c".to_string(), None, true, false, false);
        assert!(t.prefix.is_empty());
    }
}
