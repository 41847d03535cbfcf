// Copyright 2026 xfercore contributors.

//! The closed error set produced by the planning core.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Kinds of failure the core can produce, matching the recovery policy
/// described for each: some abort the whole job, some are logged and
/// skip just the affected bucket or container.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("no usable credential for {endpoint}")]
    NoCredential { endpoint: String },

    #[error("service-to-service copy from {source} requires a SAS token")]
    S2SRequiresSas { source: String },

    #[error("source {root} not found")]
    SourceNotFound { root: String },

    #[error("{path} requires a customer-provided encryption key")]
    CpkNotSupported { path: String },

    #[error("name {name:?} could not be made Azure-valid")]
    NameUnresolvable { name: String },

    #[error("container {name} could not be created: {source}")]
    ContainerCreateFailed {
        name: String,
        #[source]
        source: BackendError,
    },

    #[error("listing {root} failed: {source}")]
    ListingFailed {
        root: String,
        #[source]
        source: BackendError,
    },

    #[error("symlink cycle detected at {path}")]
    SymlinkCycle { path: PathBuf },

    #[error("execution engine rejected part {part_number} of job {job_id}: {source}")]
    DispatchFailed {
        job_id: String,
        part_number: u32,
        #[source]
        source: BackendError,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("sync does not support a wildcard root: {root}")]
    SyncNoWildcard { root: String },
}

impl Error {
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn listing_failed(root: impl Into<String>, source: impl Into<BackendError>) -> Self {
        Error::ListingFailed {
            root: root.into(),
            source: source.into(),
        }
    }

    pub fn container_create_failed(
        name: impl Into<String>,
        source: impl Into<BackendError>,
    ) -> Self {
        Error::ContainerCreateFailed {
            name: name.into(),
            source: source.into(),
        }
    }

    /// True for the categories that, in account-level traversal, are
    /// logged and skip just the affected bucket/container rather than
    /// aborting the whole job.
    pub fn is_skippable_per_container(&self) -> bool {
        matches!(
            self,
            Error::NameUnresolvable { .. } | Error::ContainerCreateFailed { .. }
        ) || crate::traverser::s3::is_region_mismatch(self)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
