// Copyright 2026 xfercore contributors.

//! The planned-transfer types handed to the execution engine:
//! [`CopyTransfer`] (one object) and [`JobPartOrderRequest`] (a batch).

use crate::credential::CredentialInfo;
use crate::location::FromTo;
use crate::stored_object::{BlobAccessTier, BlobType, EntityType, Metadata};
use time::OffsetDateTime;

/// One planned object transfer, with paths already URL-escaped per
/// backend rules (see [`crate::path_encoding`]).
#[derive(Clone, Debug)]
pub struct CopyTransfer {
    pub source_path: String,
    pub destination_path: String,
    pub last_modified: Option<OffsetDateTime>,
    pub source_size: u64,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub content_disposition: Option<String>,
    pub content_language: Option<String>,
    pub cache_control: Option<String>,
    pub md5: Option<[u8; 16]>,
    pub metadata: Metadata,
    pub blob_type: BlobType,
    pub access_tier: BlobAccessTier,
    pub entity_type: EntityType,
}

/// Options threaded through to the execution engine that affect how a
/// transfer is carried out but are opaque to the core's own logic.
#[derive(Clone, Debug, Default)]
pub struct TransferOptions {
    pub s2s_preserve_access_tier: bool,
    pub s2s_preserve_properties: bool,
}

/// A batch of [`CopyTransfer`]s submitted as one unit to the execution
/// engine. A job is an ordered sequence of parts numbered from 0; exactly
/// one part is flagged `is_final_part`.
#[derive(Clone, Debug)]
pub struct JobPartOrderRequest {
    pub job_id: String,
    pub part_number: u32,
    pub from_to: FromTo,
    pub source_root: String,
    pub destination_root: String,
    pub credentials_src: CredentialInfo,
    pub credentials_dst: CredentialInfo,
    pub transfers: Vec<CopyTransfer>,
    pub is_final_part: bool,
    pub options: TransferOptions,
}
