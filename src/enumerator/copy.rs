// Copyright 2026 xfercore contributors.

//! `CopyEnumerator`: composes a traverser, a filter chain, a per-object
//! processor and a finalizer into one job plan.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::container_factory::ContainerFactory;
use crate::error::{Error, Result};
use crate::filter::FilterChain;
use crate::job_part_batcher::JobPartBatcher;
use crate::location::FromTo;
use crate::monitor::{Counter, Monitor};
use crate::name_resolver::NameResolver;
use crate::path_encoding;
use crate::stored_object::StoredObject;
use crate::transfer::CopyTransfer;
use crate::traverser::Traverser;

/// Per-job knobs that shape how a traversed [`StoredObject`] turns into
/// a [`CopyTransfer`], independent of which backend produced it.
pub struct CopyEnumeratorOptions {
    pub from_to: FromTo,
    /// Whether the caller passed `--recursive` (or the root ended in
    /// `/*`, captured separately in `strip_top_dir`).
    pub recursive: bool,
    pub strip_top_dir: bool,
    /// Whether the source root names a single object with no wildcard
    /// or trailing slash — the empty-job policy differs for this case.
    pub source_is_object: bool,
    pub source_root: String,
    /// Explicit destination container name, when the destination URL
    /// named one; `None` for a service-level destination resolved
    /// per-object via a [`NameResolver`].
    pub destination_container_name: Option<String>,
    pub windows_local: bool,
    pub s2s_preserve_properties: bool,
    pub s2s_preserve_access_tier: bool,
}

/// Composes a traverser, filter chain, per-object processor and
/// finalizer into one job plan.
pub struct CopyEnumerator {
    traverser: Box<dyn Traverser>,
    filters: FilterChain,
    batcher: Arc<JobPartBatcher>,
    container_factory: Option<Arc<ContainerFactory>>,
    name_resolver: Option<Mutex<NameResolver>>,
    options: CopyEnumeratorOptions,
    monitor: Arc<dyn Monitor>,
}

impl CopyEnumerator {
    pub fn new(
        traverser: Box<dyn Traverser>,
        filters: FilterChain,
        batcher: Arc<JobPartBatcher>,
        container_factory: Option<Arc<ContainerFactory>>,
        name_resolver: Option<NameResolver>,
        options: CopyEnumeratorOptions,
        monitor: Arc<dyn Monitor>,
    ) -> Self {
        CopyEnumerator {
            traverser,
            filters,
            batcher,
            container_factory,
            name_resolver: name_resolver.map(Mutex::new),
            options,
            monitor,
        }
    }

    /// Run the job plan: validate, pre-create the destination container
    /// if named explicitly, traverse, and dispatch the final part.
    pub fn enumerate(&self) -> Result<()> {
        if self.traverser.is_directory(true) && !self.options.recursive && !self.options.strip_top_dir {
            return Err(Error::invalid_url(
                &self.options.source_root,
                "directory source requires --recursive or a trailing /*",
            ));
        }

        if let (Some(name), Some(factory)) = (&self.options.destination_container_name, &self.container_factory) {
            factory.ensure_created(name);
            self.monitor.count(Counter::ContainersCreated, 1);
        }

        let transferred = AtomicUsize::new(0);
        let mut process = |object: StoredObject| -> Result<()> { self.process_object(object, &transferred) };
        let counter = |object: &StoredObject| {
            self.monitor.count(Counter::ObjectsScanned, 1);
            let _ = object;
        };
        self.traverser.traverse(None, &mut process, &self.filters, Some(&counter))?;
        self.batcher.dispatch_final_part()?;
        self.monitor.count(Counter::PartsDispatched, 1);

        if transferred.load(Ordering::Relaxed) == 0 && self.options.source_is_object {
            return Err(Error::SourceNotFound {
                root: self.options.source_root.clone(),
            });
        }
        Ok(())
    }

    fn process_object(&self, mut object: StoredObject, transferred: &AtomicUsize) -> Result<()> {
        if object.dst_container_name.is_none() {
            if let Some(resolver) = &self.name_resolver {
                if let Some(source_container) = object.container_name.clone() {
                    let mut resolver = resolver.lock().unwrap();
                    object.dst_container_name = Some(resolver.add(source_container)?);
                }
            } else if let Some(explicit) = &self.options.destination_container_name {
                object.dst_container_name = Some(explicit.clone());
            }
        }

        let destination_path =
            path_encoding::encode_for_destination(&object.relative_path, self.options.from_to.to, self.options.windows_local);

        let transfer = CopyTransfer {
            source_path: object.relative_path.clone(),
            destination_path,
            last_modified: object.last_modified,
            source_size: object.size,
            content_type: if self.options.s2s_preserve_properties {
                object.content_type.clone()
            } else {
                None
            },
            content_encoding: if self.options.s2s_preserve_properties {
                object.content_encoding.clone()
            } else {
                None
            },
            content_disposition: if self.options.s2s_preserve_properties {
                object.content_disposition.clone()
            } else {
                None
            },
            content_language: if self.options.s2s_preserve_properties {
                object.content_language.clone()
            } else {
                None
            },
            cache_control: if self.options.s2s_preserve_properties {
                object.cache_control.clone()
            } else {
                None
            },
            md5: object.content_md5,
            metadata: object.metadata.clone(),
            blob_type: object.blob_type,
            access_tier: if self.options.s2s_preserve_access_tier {
                object.blob_access_tier.clone()
            } else {
                crate::stored_object::BlobAccessTier::NA
            },
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
    use crate::location::Location;
    use crate::monitor::NullMonitor;
    use crate::transfer::TransferOptions;
    use crate::traverser::{local::LocalTraverser, SymlinkMode};

    fn batcher(engine: Arc<RecordingExecutionEngine>) -> Arc<JobPartBatcher> {
        Arc::new(JobPartBatcher::new(
            "job-1".to_string(),
            FromTo::new(Location::Local, Location::Blob).unwrap(),
            "/data".to_string(),
            "https://acct.blob.core.windows.net/c".to_string(),
            CredentialInfo::Anonymous,
            CredentialInfo::Anonymous,
            TransferOptions::default(),
            10_000,
            engine,
        ))
    }

    fn options(root: &str, recursive: bool, source_is_object: bool) -> CopyEnumeratorOptions {
        CopyEnumeratorOptions {
            from_to: FromTo::new(Location::Local, Location::Blob).unwrap(),
            recursive,
            strip_top_dir: false,
            source_is_object,
            source_root: root.to_string(),
            destination_container_name: Some("c".to_string()),
            windows_local: false,
            s2s_preserve_properties: false,
            s2s_preserve_access_tier: false,
        }
    }

    #[test]
    fn local_directory_recursive_upload_produces_two_transfers() {
        let tmp = testsupport::TreeFixture::new();
        tmp.create_file("a.txt");
        tmp.create_file("sub/b.txt");
        let traverser = LocalTraverser::new(tmp.root_str(), SymlinkMode::Skip, true).unwrap();
        let engine = Arc::new(RecordingExecutionEngine::default());
        let enumerator = CopyEnumerator::new(
            Box::new(traverser),
            FilterChain::new(),
            batcher(engine.clone()),
            None,
            None,
            options(tmp.root_str(), true, false),
            Arc::new(NullMonitor),
        );
        enumerator.enumerate().unwrap();
        let mut paths: Vec<_> = engine
            .parts()
            .into_iter()
            .flat_map(|p| p.transfers)
            .map(|t| t.destination_path)
            .collect();
        paths.sort();
        assert_eq!(paths, vec!["a.txt".to_string(), "sub/b.txt".to_string()]);
    }

    #[test]
    fn directory_source_without_recursive_is_rejected() {
        let tmp = testsupport::TreeFixture::new();
        tmp.create_file("a.txt");
        let traverser = LocalTraverser::new(tmp.root_str(), SymlinkMode::Skip, false).unwrap();
        let engine = Arc::new(RecordingExecutionEngine::default());
        let enumerator = CopyEnumerator::new(
            Box::new(traverser),
            FilterChain::new(),
            batcher(engine),
            None,
            None,
            options(tmp.root_str(), false, false),
            Arc::new(NullMonitor),
        );
        let err = enumerator.enumerate().unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn empty_directory_source_still_dispatches_final_part() {
        let tmp = testsupport::TreeFixture::new();
        let traverser = LocalTraverser::new(tmp.root_str(), SymlinkMode::Skip, true).unwrap();
        let engine = Arc::new(RecordingExecutionEngine::default());
        let enumerator = CopyEnumerator::new(
            Box::new(traverser),
            FilterChain::new(),
            batcher(engine.clone()),
            None,
            None,
            options(tmp.root_str(), true, false),
            Arc::new(NullMonitor),
        );
        enumerator.enumerate().unwrap();
        assert_eq!(engine.parts().len(), 1);
        assert!(engine.parts()[0].is_final_part);
    }

    #[test]
    fn missing_single_object_source_is_source_not_found() {
        let tmp = testsupport::TreeFixture::new();
        let missing = tmp.root.join("missing.txt");
        let traverser = LocalTraverser::new(missing.to_str().unwrap(), SymlinkMode::Skip, false).unwrap();
        let engine = Arc::new(RecordingExecutionEngine::default());
        let enumerator = CopyEnumerator::new(
            Box::new(traverser),
            FilterChain::new(),
            batcher(engine),
            None,
            None,
            options(missing.to_str().unwrap(), false, true),
            Arc::new(NullMonitor),
        );
        let err = enumerator.enumerate().unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));
    }
}
