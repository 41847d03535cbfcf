// Copyright 2026 xfercore contributors.

//! Subcommand bodies: each builds a `FromTo`, resolves credentials for
//! both ends, builds the traverser(s), and drives the matching
//! enumerator against a [`NullExecutionEngine`].

use std::sync::Arc;

use clap::Args;
use tokio::runtime::Runtime;
use tracing::info;

use xfercore::config::Config;
use xfercore::credential::{CredentialResolver, NeverPublic, ProcessEnv, StaticTokenManager};
use xfercore::engine::NullExecutionEngine;
use xfercore::enumerator::{CopyEnumerator, CopyEnumeratorOptions, SyncEnumerator, SyncEnumeratorOptions};
use xfercore::error::{Error, Result};
use xfercore::filter::{ExcludePattern, FilterChain, IncludePattern};
use xfercore::job_part_batcher::JobPartBatcher;
use xfercore::location::{FromTo, Location};
use xfercore::locator::{Level, ResourceLocator};
use xfercore::monitor::{Counter, StandardMonitor};
use xfercore::transfer::TransferOptions;

use crate::backend;

#[derive(Debug, Args)]
pub struct CopyArgs {
    pub source: String,
    pub destination: String,
    #[clap(long, short)]
    pub recursive: bool,
    #[clap(long, number_of_values = 1)]
    pub include_pattern: Vec<String>,
    #[clap(long, number_of_values = 1)]
    pub exclude_pattern: Vec<String>,
    #[clap(long)]
    pub s2s_preserve_properties: bool,
    #[clap(long)]
    pub s2s_preserve_access_tier: bool,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    pub source: String,
    pub destination: String,
    #[clap(long)]
    pub delete_destination: bool,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    pub target: String,
}

fn credential_resolver() -> CredentialResolver {
    CredentialResolver::new(Arc::new(ProcessEnv), Arc::new(StaticTokenManager::empty()), Arc::new(NeverPublic))
}

fn has_wildcard(s: &str) -> bool {
    s.contains('*') || s.contains('?')
}

/// Resolve an endpoint string into its location, locator, and credential.
fn resolve_endpoint(raw: &str, resolver: &CredentialResolver, is_source: bool) -> Result<(Location, ResourceLocator, xfercore::credential::CredentialInfo)> {
    let location = backend::infer_location(raw)?;
    let locator = ResourceLocator::parse(raw, location)?;
    let (credential, _is_public) = resolver.resolve(location, &locator, is_source)?;
    Ok((location, locator, credential))
}

fn build_filters(include: &[String], exclude: &[String]) -> Result<FilterChain> {
    let mut chain = FilterChain::new();
    if !include.is_empty() {
        chain = chain.push(IncludePattern::new(include.to_vec()).map_err(|e| Error::invalid_url("--include-pattern", e.to_string()))?);
    }
    if !exclude.is_empty() {
        chain = chain.push(ExcludePattern::new(exclude.to_vec(), false).map_err(|e| Error::invalid_url("--exclude-pattern", e.to_string()))?);
    }
    Ok(chain)
}

pub fn run_copy(args: &CopyArgs) -> Result<()> {
    let runtime = Arc::new(Runtime::new().expect("build tokio runtime"));
    let resolver = credential_resolver();
    let config = Config::from_env();
    let monitor = Arc::new(StandardMonitor::default());

    let (src_location, src_locator, src_credential) = resolve_endpoint(&args.source, &resolver, true)?;
    let (dst_location, dst_locator, dst_credential) = resolve_endpoint(&args.destination, &resolver, false)?;
    let from_to = FromTo::new(src_location, dst_location)?;
    let destination_is_dfs = dst_location == Location::BlobFS;

    let traverser = backend::build_traverser(runtime.clone(), src_location, &src_locator, &src_credential, args.recursive, destination_is_dfs)?;
    let source_is_object = src_locator.level == Level::Object;
    let filters = build_filters(&args.include_pattern, &args.exclude_pattern)?;

    let engine = Arc::new(NullExecutionEngine);
    let options = TransferOptions {
        s2s_preserve_access_tier: args.s2s_preserve_access_tier,
        s2s_preserve_properties: args.s2s_preserve_properties,
    };
    let batcher = Arc::new(JobPartBatcher::new(
        uuid::Uuid::new_v4().to_string(),
        from_to,
        src_locator.raw_url.clone(),
        dst_locator.raw_url.clone(),
        src_credential,
        dst_credential,
        options,
        config.job_part_size,
        engine,
    ));

    let enumerator_options = CopyEnumeratorOptions {
        from_to,
        recursive: args.recursive,
        strip_top_dir: src_locator.strip_top_dir,
        source_is_object,
        source_root: src_locator.raw_url.clone(),
        destination_container_name: dst_locator.container_name.clone(),
        windows_local: cfg!(windows),
        s2s_preserve_properties: args.s2s_preserve_properties,
        s2s_preserve_access_tier: args.s2s_preserve_access_tier,
    };
    let enumerator = CopyEnumerator::new(traverser, filters, batcher, None, None, enumerator_options, monitor.clone());
    enumerator.enumerate()?;

    info!(
        scanned = monitor.counters().get(Counter::ObjectsScanned),
        queued = monitor.counters().get(Counter::TransfersQueued),
        "copy enumeration complete"
    );
    Ok(())
}

pub fn run_sync(args: &SyncArgs) -> Result<()> {
    if !args.delete_destination {
        tracing::debug!("--delete-destination not set; destination-only objects will be reported but not removed");
    }
    let runtime = Arc::new(Runtime::new().expect("build tokio runtime"));
    let resolver = credential_resolver();
    let config = Config::from_env();
    let monitor = Arc::new(StandardMonitor::default());

    let (src_location, src_locator, src_credential) = resolve_endpoint(&args.source, &resolver, true)?;
    let (dst_location, dst_locator, dst_credential) = resolve_endpoint(&args.destination, &resolver, false)?;
    let from_to = FromTo::new(src_location, dst_location)?;

    let source_traverser = backend::build_traverser(runtime.clone(), src_location, &src_locator, &src_credential, true, false)?;
    let destination_traverser = backend::build_traverser(runtime.clone(), dst_location, &dst_locator, &dst_credential, true, false)?;

    let engine = Arc::new(NullExecutionEngine);
    let batcher = Arc::new(JobPartBatcher::new(
        uuid::Uuid::new_v4().to_string(),
        from_to,
        src_locator.raw_url.clone(),
        dst_locator.raw_url.clone(),
        src_credential,
        dst_credential,
        TransferOptions::default(),
        config.job_part_size,
        engine,
    ));

    let enumerator_options = SyncEnumeratorOptions {
        source_has_wildcard: has_wildcard(&args.source),
        destination_has_wildcard: has_wildcard(&args.destination),
        source_root: src_locator.raw_url.clone(),
        destination_root: dst_locator.raw_url.clone(),
        destination: dst_location,
        windows_local: cfg!(windows),
    };
    let enumerator = SyncEnumerator::new(
        source_traverser,
        destination_traverser,
        FilterChain::new(),
        batcher,
        enumerator_options,
        monitor.clone(),
    );
    let deletions = enumerator.enumerate()?;

    info!(
        queued = monitor.counters().get(Counter::TransfersQueued),
        destination_only = deletions.len(),
        "sync enumeration complete"
    );
    if args.delete_destination {
        for object in &deletions {
            info!(path = %object.relative_path, "would delete (no execution engine wired)");
        }
    }
    Ok(())
}

pub fn run_remove(args: &RemoveArgs) -> Result<()> {
    let runtime = Arc::new(Runtime::new().expect("build tokio runtime"));
    let resolver = credential_resolver();
    let (location, locator, credential) = resolve_endpoint(&args.target, &resolver, true)?;
    let traverser = backend::build_traverser(runtime, location, &locator, &credential, true, false)?;

    let mut count = 0usize;
    let mut process = |_object: xfercore::StoredObject| {
        count += 1;
        Ok(())
    };
    traverser.traverse(None, &mut process, &FilterChain::new(), None)?;
    info!(target = %args.target, matched = count, "remove is plan-only in this build (no execution engine wired)");
    Ok(())
}
