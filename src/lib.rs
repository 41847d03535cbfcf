// Copyright 2026 xfercore contributors.

//! Traversal, enumeration and credential core for a cross-cloud bulk
//! data-movement tool.
//!
//! This crate turns a `(source, destination, options)` tuple into an
//! ordered stream of transfer work items: URL classification, credential
//! resolution, per-backend object traversal, filtering, S3-to-Azure name
//! resolution, and job-part batching for an external execution engine.
//! It never opens a data-plane byte stream itself; the engine that does
//! is reached only through [`engine::ExecutionEngine`].

pub mod config;
pub mod container_factory;
pub mod credential;
pub mod engine;
pub mod enumerator;
pub mod error;
pub mod filter;
pub mod job_part_batcher;
pub mod location;
pub mod locator;
pub mod logging;
pub mod monitor;
pub mod name_resolver;
pub mod path_encoding;
pub mod stats_monitor;
pub mod stored_object;
pub mod transfer;
pub mod traverser;

pub use config::Config;
pub use credential::{CredentialInfo, CredentialResolver};
pub use error::{Error, Result};
pub use location::{FromTo, Location};
pub use locator::{Level, ResourceLocator};
pub use stored_object::{BlobAccessTier, BlobType, EntityType, StoredObject};
pub use transfer::{CopyTransfer, JobPartOrderRequest};

/// Crate version, embedded in job-part requests and lease-style metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
