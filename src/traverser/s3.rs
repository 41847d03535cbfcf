// Copyright 2026 xfercore contributors.

//! Lists an S3 bucket by prefix.

use std::sync::Arc;

use aws_sdk_s3::Client;
use tokio::runtime::Runtime;
use tracing::warn;

use crate::credential::CredentialInfo;
use crate::error::{Error, Result};
use crate::filter::FilterChain;
use crate::stored_object::StoredObject;

use super::{drive_one, EnumerationCounter, Morpher, Processor, Traverser};

pub struct S3Traverser {
    runtime: Arc<Runtime>,
    client: Client,
    bucket: String,
    prefix: String,
    recursive: bool,
    destination_is_dfs: bool,
}

impl S3Traverser {
    pub fn new(
        runtime: Arc<Runtime>,
        client: Client,
        bucket: String,
        prefix: String,
        recursive: bool,
        destination_is_dfs: bool,
    ) -> Self {
        S3Traverser {
            runtime,
            client,
            bucket,
            prefix,
            recursive,
            destination_is_dfs,
        }
    }

    /// Build a client for `credential` and `region`, without probing the
    /// bucket's actual region first (callers that need the
    /// auto-discovery dance do it once at the account-traverser level
    /// the way `S3Transport::new` discovers a bucket's true region via
    /// `GetBucketLocation` before doing any listing).
    pub fn client_for(runtime: &Runtime, credential: &CredentialInfo, region: Option<&str>) -> Client {
        let _ = credential;
        let region_provider = region
            .map(|r| aws_sdk_s3::config::Region::new(r.to_string()))
            .unwrap_or_else(|| aws_sdk_s3::config::Region::new("us-east-1".to_string()));
        let sdk_config = runtime.block_on(
            aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(region_provider)
                .load(),
        );
        Client::new(&sdk_config)
    }
}

impl Traverser for S3Traverser {
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
        let delimiter = if self.recursive { None } else { Some("/") };
        let mut continuation_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&self.prefix);
            if let Some(d) = delimiter {
                request = request.delimiter(d);
            }
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = self
                .runtime
                .block_on(request.send())
                .map_err(|err| Error::listing_failed(format!("s3://{}/{}", self.bucket, self.prefix), err))?;

            for object in response.contents() {
                let key = match object.key() {
                    Some(k) => k.to_string(),
                    None => continue,
                };
                if key.ends_with('/') && !self.destination_is_dfs {
                    // S3 directory marker, not represented unless the
                    // destination understands folders natively.
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
                let size = object.size().unwrap_or(0).max(0) as u64;
                let mut obj = StoredObject::file(relative_path, size);
                obj.container_name = Some(self.bucket.clone());
                obj.last_modified = object
                    .last_modified()
                    .and_then(|dt| time::OffsetDateTime::from_unix_timestamp(dt.secs()).ok());
                drive_one(obj, preprocess, process, filters, counter)?;
            }

            continuation_token = response.next_continuation_token().map(|s| s.to_string());
            if continuation_token.is_none() {
                break;
            }
        }
        Ok(())
    }
}

/// HTTP 301 with no usable Location header on a listing call means the
/// bucket lives in a different region than the client was configured
/// for; callers in account-level traversal inspect the returned
/// [`Error::ListingFailed`] for this and skip the bucket with a warning
/// rather than failing the whole job. Matched on the error's rendered
/// message since `SdkError`'s raw-response type varies by call.
pub fn is_region_mismatch(err: &Error) -> bool {
    matches!(err, Error::ListingFailed { source, .. } if {
        let msg = source.to_string();
        msg.contains("301") || msg.to_lowercase().contains("permanentredirect")
    })
}

pub fn warn_region_mismatch(bucket: &str) {
    warn!(bucket, "bucket appears to be in the wrong region; skipping");
}
