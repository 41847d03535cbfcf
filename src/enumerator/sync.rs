// Copyright 2026 xfercore contributors.

//! `SyncEnumerator`: runs source and destination traversers, indexes
//! the destination by relative path, and produces both update transfers
//! and destination-only deletions.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::filter::FilterChain;
use crate::job_part_batcher::JobPartBatcher;
use crate::monitor::{Counter, Monitor};
use crate::path_encoding;
use crate::stored_object::StoredObject;
use crate::transfer::CopyTransfer;
use crate::traverser::Traverser;

pub struct SyncEnumeratorOptions {
    pub source_has_wildcard: bool,
    pub destination_has_wildcard: bool,
    pub source_root: String,
    pub destination_root: String,
    pub destination: crate::location::Location,
    pub windows_local: bool,
}

/// A snapshot of destination objects keyed by relative path, shared
/// between the source-staleness check and the destination-only
/// deletion pass so both decisions use the same point-in-time listing.
struct SyncIndex {
    by_relative_path: HashMap<String, StoredObject>,
}

impl SyncIndex {
    fn build(traverser: &dyn Traverser, filters: &FilterChain) -> Result<Self> {
        let mut by_relative_path = HashMap::new();
        let mut process = |object: StoredObject| -> Result<()> {
            by_relative_path.insert(object.relative_path.clone(), object);
            Ok(())
        };
        traverser.traverse(None, &mut process, filters, None)?;
        Ok(SyncIndex { by_relative_path })
    }
}

pub struct SyncEnumerator {
    source_traverser: Box<dyn Traverser>,
    destination_traverser: Box<dyn Traverser>,
    filters: FilterChain,
    batcher: Arc<JobPartBatcher>,
    options: SyncEnumeratorOptions,
    monitor: Arc<dyn Monitor>,
}

impl SyncEnumerator {
    pub fn new(
        source_traverser: Box<dyn Traverser>,
        destination_traverser: Box<dyn Traverser>,
        filters: FilterChain,
        batcher: Arc<JobPartBatcher>,
        options: SyncEnumeratorOptions,
        monitor: Arc<dyn Monitor>,
    ) -> Self {
        SyncEnumerator {
            source_traverser,
            destination_traverser,
            filters,
            batcher,
            options,
            monitor,
        }
    }

    /// Run the sync: build the destination index, stream source objects
    /// that are new or stale into transfers, then return every
    /// destination object with no source counterpart for the caller to
    /// route to its deletion processor — the core does not issue
    /// deletes itself.
    ///
    /// The enumeration counter (invoked once per emitted source object,
    /// regardless of what the filter chain decides) populates
    /// `seen_at_source`, so the destination-only set is exactly `index`
    /// minus `seen_at_source` once the source pass completes.
    pub fn enumerate(&self) -> Result<Vec<StoredObject>> {
        if self.options.source_has_wildcard {
            return Err(Error::SyncNoWildcard {
                root: self.options.source_root.clone(),
            });
        }
        if self.options.destination_has_wildcard {
            return Err(Error::SyncNoWildcard {
                root: self.options.destination_root.clone(),
            });
        }

        let index = SyncIndex::build(self.destination_traverser.as_ref(), &self.filters)?;
        let seen_at_source: Mutex<HashSet<String>> = Mutex::new(HashSet::new());

        let transferred = AtomicUsize::new(0);
        let mut process = |object: StoredObject| -> Result<()> {
            let is_stale_or_new = match index.by_relative_path.get(&object.relative_path) {
                None => true,
                Some(destination_object) => object.last_modified_or_epoch() > destination_object.last_modified_or_epoch(),
            };
            if is_stale_or_new {
                self.queue_transfer(object, &transferred)?;
            }
            Ok(())
        };
        let counter = |object: &StoredObject| {
            self.monitor.count(Counter::ObjectsScanned, 1);
            seen_at_source.lock().unwrap().insert(object.relative_path.clone());
        };

        self.source_traverser
            .traverse(None, &mut process, &self.filters, Some(&counter))?;
        self.batcher.dispatch_final_part()?;
        self.monitor.count(Counter::PartsDispatched, 1);

        let seen = seen_at_source.lock().unwrap();
        let deletions: Vec<StoredObject> = index
            .by_relative_path
            .into_iter()
            .filter(|(path, _)| !seen.contains(path))
            .map(|(_, object)| object)
            .collect();
        self.monitor.count(Counter::DeletionsQueued, deletions.len());
        Ok(deletions)
    }

    fn queue_transfer(&self, object: StoredObject, transferred: &AtomicUsize) -> Result<()> {
        let destination_path =
            path_encoding::encode_for_destination(&object.relative_path, self.options.destination, self.options.windows_local);
        let transfer = CopyTransfer {
            source_path: object.relative_path.clone(),
            destination_path,
            last_modified: object.last_modified,
            source_size: object.size,
            content_type: object.content_type.clone(),
            content_encoding: object.content_encoding.clone(),
            content_disposition: object.content_disposition.clone(),
            content_language: object.content_language.clone(),
            cache_control: object.cache_control.clone(),
            md5: object.content_md5,
            metadata: object.metadata.clone(),
            blob_type: object.blob_type,
            access_tier: object.blob_access_tier.clone(),
            entity_type: object.entity_type,
        };
        self.monitor.count(Counter::TransfersQueued, 1);
        transferred.fetch_add(1, Ordering::Relaxed);
        self.batcher.add_transfer(transfer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::CredentialInfo;
    use crate::engine::RecordingExecutionEngine;
    use crate::location::{FromTo, Location};
    use crate::monitor::NullMonitor;
    use crate::transfer::TransferOptions;
    use crate::traverser::{local::LocalTraverser, SymlinkMode};
    use filetime::FileTime;

    fn batcher(engine: Arc<RecordingExecutionEngine>) -> Arc<JobPartBatcher> {
        Arc::new(JobPartBatcher::new(
            "job-1".to_string(),
            FromTo::new(Location::Local, Location::Blob).unwrap(),
            "/d".to_string(),
            "https://acct.blob.core.windows.net/c".to_string(),
            CredentialInfo::Anonymous,
            CredentialInfo::Anonymous,
            TransferOptions::default(),
            10_000,
            engine,
        ))
    }

    fn options(src: &str, dst: &str) -> SyncEnumeratorOptions {
        SyncEnumeratorOptions {
            source_has_wildcard: false,
            destination_has_wildcard: false,
            source_root: src.to_string(),
            destination_root: dst.to_string(),
            destination: Location::Blob,
            windows_local: false,
        }
    }

    fn set_mtime(path: &std::path::Path, epoch_seconds: i64) {
        filetime::set_file_mtime(path, FileTime::from_unix_time(epoch_seconds, 0)).unwrap();
    }

    #[test]
    fn stale_destination_file_is_transferred_and_missing_one_deleted() {
        let source = testsupport::TreeFixture::new();
        source.create_file("a");
        source.create_file("b");
        set_mtime(&source.root.join("a"), 100);
        set_mtime(&source.root.join("b"), 100);

        let destination = testsupport::TreeFixture::new();
        destination.create_file("a");
        destination.create_file("b");
        destination.create_file("c");
        set_mtime(&destination.root.join("a"), 100);
        set_mtime(&destination.root.join("b"), 50);
        set_mtime(&destination.root.join("c"), 90);

        let source_traverser = LocalTraverser::new(source.root_str(), SymlinkMode::Skip, true).unwrap();
        let destination_traverser = LocalTraverser::new(destination.root_str(), SymlinkMode::Skip, true).unwrap();
        let engine = Arc::new(RecordingExecutionEngine::default());
        let enumerator = SyncEnumerator::new(
            Box::new(source_traverser),
            Box::new(destination_traverser),
            FilterChain::new(),
            batcher(engine.clone()),
            options(source.root_str(), destination.root_str()),
            Arc::new(NullMonitor),
        );
        let deletions = enumerator.enumerate().unwrap();

        let transfers: Vec<_> = engine
            .parts()
            .into_iter()
            .flat_map(|p| p.transfers)
            .map(|t| t.destination_path)
            .collect();
        assert_eq!(transfers, vec!["b".to_string()]);
        assert_eq!(deletions.len(), 1);
        assert_eq!(deletions[0].relative_path, "c");
    }

    #[test]
    fn wildcard_root_is_rejected() {
        let source = testsupport::TreeFixture::new();
        let destination = testsupport::TreeFixture::new();
        let source_traverser = LocalTraverser::new(source.root_str(), SymlinkMode::Skip, true).unwrap();
        let destination_traverser = LocalTraverser::new(destination.root_str(), SymlinkMode::Skip, true).unwrap();
        let engine = Arc::new(RecordingExecutionEngine::default());
        let mut opts = options(source.root_str(), destination.root_str());
        opts.source_has_wildcard = true;
        let enumerator = SyncEnumerator::new(
            Box::new(source_traverser),
            Box::new(destination_traverser),
            FilterChain::new(),
            batcher(engine),
            opts,
            Arc::new(NullMonitor),
        );
        let err = enumerator.enumerate().unwrap_err();
        assert!(matches!(err, Error::SyncNoWildcard { .. }));
    }
}
