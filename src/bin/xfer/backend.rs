// Copyright 2026 xfercore contributors.

//! Turns a parsed endpoint plus resolved credentials into the concrete
//! [`Traverser`] for its backend. Kept out of the library proper since
//! wiring a real SDK client is a CLI concern, not a core one.
//!
//! Account/service-level roots (no container named) are out of scope
//! for this entry point; [`xfercore::traverser::account::AccountTraverser`]
//! is reachable from library code for callers that need the fan-out.

use std::sync::Arc;

use azure_storage::prelude::*;
use azure_storage_blobs::prelude::ClientBuilder as BlobClientBuilder;
use azure_storage_datalake::clients::DataLakeClient;
use azure_storage_files_shares::prelude::ClientBuilder as ShareClientBuilder;
use google_cloud_storage::client::{Client as GcsClient, ClientConfig as GcsClientConfig};
use tokio::runtime::Runtime;

use xfercore::credential::CredentialInfo;
use xfercore::error::{Error, Result};
use xfercore::location::Location;
use xfercore::locator::ResourceLocator;
use xfercore::traverser::{
    adls::BlobFSTraverser, blob::BlobTraverser, file::FileTraverser, gcs::GCSTraverser, local::LocalTraverser, s3::S3Traverser,
    SymlinkMode, Traverser,
};

/// Resolve an endpoint's [`Location`] from its scheme and host, the same
/// per-backend shapes [`ResourceLocator::parse`] itself expects.
pub fn infer_location(raw: &str) -> Result<Location> {
    if !raw.contains("://") {
        return Ok(Location::Local);
    }
    let url = url::Url::parse(raw).map_err(|e| Error::invalid_url(raw, e.to_string()))?;
    let host = url.host_str().unwrap_or_default();
    if host.contains(".blob.core.windows.net") {
        Ok(Location::Blob)
    } else if host.contains(".file.core.windows.net") {
        Ok(Location::File)
    } else if host.contains(".dfs.core.windows.net") {
        Ok(Location::BlobFS)
    } else if host.contains("amazonaws.com") {
        Ok(Location::S3)
    } else if host.contains("storage.googleapis.com") {
        Ok(Location::GCS)
    } else {
        Err(Error::invalid_url(raw, "endpoint host does not match a known backend"))
    }
}

fn azure_account_from_host(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}

fn blob_storage_credentials(account: &str, credential: &CredentialInfo) -> StorageCredentials {
    match credential {
        CredentialInfo::Sas(sas) => StorageCredentials::sas_token(sas.clone()).unwrap_or_else(|_| StorageCredentials::anonymous()),
        CredentialInfo::SharedKey { account, key } => StorageCredentials::access_key(account.clone(), key.clone()),
        CredentialInfo::OAuth(token) => StorageCredentials::bearer_token(token.access_token.clone()),
        CredentialInfo::Anonymous => StorageCredentials::anonymous(),
        other => {
            tracing::warn!(?other, account, "credential kind not usable against Azure Storage, falling back to anonymous");
            StorageCredentials::anonymous()
        }
    }
}

/// Build the [`Traverser`] for `locator`. Fails with [`Error::InvalidUrl`]
/// when the root names no container/bucket/share/filesystem, since
/// account-level fan-out is not wired into this entry point.
pub fn build_traverser(
    runtime: Arc<Runtime>,
    location: Location,
    locator: &ResourceLocator,
    credential: &CredentialInfo,
    recursive: bool,
    destination_is_dfs: bool,
) -> Result<Box<dyn Traverser>> {
    match location {
        Location::Local | Location::None => {
            let root = locator.object_key.clone().unwrap_or_default();
            Ok(Box::new(LocalTraverser::new(&root, SymlinkMode::Skip, recursive)?))
        }
        Location::S3 => {
            let bucket = require_container(locator, "S3 bucket")?;
            let client = S3Traverser::client_for(&runtime, credential, locator.region.as_deref());
            Ok(Box::new(S3Traverser::new(
                runtime,
                client,
                bucket,
                locator.object_key.clone().unwrap_or_default(),
                recursive,
                destination_is_dfs,
            )))
        }
        Location::Blob => {
            let container = require_container(locator, "Blob container")?;
            let account = azure_account_from_host(&locator.host);
            let storage_credentials = blob_storage_credentials(account, credential);
            let container_client = BlobClientBuilder::new(account, storage_credentials).container_client(&container);
            Ok(Box::new(BlobTraverser::new(
                runtime,
                container_client,
                container,
                locator.object_key.as_deref(),
                recursive,
                destination_is_dfs,
                false,
            )))
        }
        Location::File => {
            let share = require_container(locator, "Azure Files share")?;
            let account = azure_account_from_host(&locator.host);
            let storage_credentials = blob_storage_credentials(account, credential);
            let share_client = ShareClientBuilder::new(account, storage_credentials).share_client(&share);
            Ok(Box::new(FileTraverser::new(
                runtime,
                share_client,
                share,
                locator.object_key.as_deref(),
                recursive,
            )))
        }
        Location::BlobFS => {
            let filesystem = require_container(locator, "ADLS Gen2 filesystem")?;
            let account = azure_account_from_host(&locator.host);
            let storage_credentials = blob_storage_credentials(account, credential);
            let data_lake_client = DataLakeClient::new(account.to_string(), storage_credentials);
            let filesystem_client = data_lake_client.file_system_client(filesystem.clone());
            Ok(Box::new(BlobFSTraverser::new(
                runtime,
                filesystem_client,
                filesystem,
                locator.object_key.as_deref(),
                recursive,
            )))
        }
        Location::GCS => {
            let bucket = require_container(locator, "GCS bucket")?;
            let config = runtime.block_on(GcsClientConfig::default().with_auth()).unwrap_or_default();
            let client = GcsClient::new(config);
            Ok(Box::new(GCSTraverser::new(
                runtime,
                client,
                bucket,
                locator.object_key.as_deref(),
                recursive,
                destination_is_dfs,
            )))
        }
        Location::Pipe | Location::Benchmark => Err(Error::invalid_url(&locator.raw_url, "backend not reachable from the CLI entry point")),
    }
}

fn require_container(locator: &ResourceLocator, what: &str) -> Result<String> {
    locator
        .container_name
        .clone()
        .ok_or_else(|| Error::invalid_url(&locator.raw_url, format!("account-level root has no {what}; name one explicitly")))
}
