// Copyright 2026 xfercore contributors.

//! Idempotent, per-job destination container creation.

use std::collections::HashSet;
use std::sync::Mutex;

use tracing::warn;

use crate::error::{Error, Result};

/// Backend-specific container/share/filesystem creation. Each
/// implementation is responsible for treating "already exists" as
/// success.
pub trait ContainerCreator: Send + Sync {
    fn create(&self, name: &str) -> Result<()>;
}

/// `mkdir -p` with mode 0755; tolerates an already-existing directory.
pub struct LocalContainerCreator {
    pub root: std::path::PathBuf,
}

impl ContainerCreator for LocalContainerCreator {
    fn create(&self, name: &str) -> Result<()> {
        let path = self.root.join(name);
        match std::fs::create_dir_all(&path) {
            Ok(()) => {
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let _ = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755));
                }
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(Error::container_create_failed(name, e)),
        }
    }
}

/// A creator built from a closure, for backends whose SDK call is a
/// simple "create, tolerate already-exists" round trip: Azure Blob
/// `ContainerCreate`/`ContainerAlreadyExists`, Azure Files
/// `ShareCreate`/`ShareAlreadyExists`, ADLS Gen2
/// `FilesystemCreate`/`FilesystemAlreadyExists`. The closure receives the
/// name and returns whether the service reported "already exists".
pub struct RemoteContainerCreator<F> {
    create: F,
}

impl<F> RemoteContainerCreator<F>
where
    F: Fn(&str) -> std::result::Result<(), RemoteCreateError> + Send + Sync,
{
    pub fn new(create: F) -> Self {
        RemoteContainerCreator { create }
    }
}

/// Outcome of a remote create call, distinguishing the
/// already-exists case (success) from a genuine failure.
#[derive(Debug)]
pub struct RemoteCreateError {
    pub already_exists: bool,
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl<F> ContainerCreator for RemoteContainerCreator<F>
where
    F: Fn(&str) -> std::result::Result<(), RemoteCreateError> + Send + Sync,
{
    fn create(&self, name: &str) -> Result<()> {
        match (self.create)(name) {
            Ok(()) => Ok(()),
            Err(e) if e.already_exists => Ok(()),
            Err(e) => Err(Error::container_create_failed(name, e.source)),
        }
    }
}

/// S3 and GCS only support container (bucket) creation when the
/// destination account maps a source bucket 1:1; any other request must
/// not be issued by callers.
pub struct RefusingContainerCreator;

impl ContainerCreator for RefusingContainerCreator {
    fn create(&self, name: &str) -> Result<()> {
        Err(Error::container_create_failed(
            name,
            std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "bucket creation is only supported for a 1:1 source mapping",
            ),
        ))
    }
}

/// Creates destination containers at most once per name per job. A
/// failure is logged and does not abort enumeration — individual
/// transfers into a missing container will fail with a clearer
/// per-object error.
pub struct ContainerFactory {
    creator: Box<dyn ContainerCreator>,
    attempted: Mutex<HashSet<String>>,
}

impl ContainerFactory {
    pub fn new(creator: Box<dyn ContainerCreator>) -> Self {
        ContainerFactory {
            creator,
            attempted: Mutex::new(HashSet::new()),
        }
    }

    /// Ensure `name` has been created, issuing at most one create call
    /// per job regardless of how many times this is called.
    pub fn ensure_created(&self, name: &str) {
        {
            let mut attempted = self.attempted.lock().unwrap();
            if attempted.contains(name) {
                return;
            }
            attempted.insert(name.to_string());
        }
        if let Err(err) = self.creator.create(name) {
            warn!(container = name, error = %err, "container create failed; transfers will proceed");
        }
    }

    pub fn attempt_count(&self) -> usize {
        self.attempted.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingCreator(Arc<AtomicUsize>);

    impl ContainerCreator for CountingCreator {
        fn create(&self, _name: &str) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn local_creator_tolerates_existing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let creator = LocalContainerCreator { root: tmp.path().to_path_buf() };
        creator.create("sub").unwrap();
        creator.create("sub").unwrap();
        assert!(tmp.path().join("sub").is_dir());
    }

    #[test]
    fn ensure_created_issues_at_most_one_network_call_per_name() {
        let calls = Arc::new(AtomicUsize::new(0));
        let factory = ContainerFactory::new(Box::new(CountingCreator(calls.clone())));
        factory.ensure_created("c");
        factory.ensure_created("c");
        factory.ensure_created("other");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(factory.attempt_count(), 2);
    }

    #[test]
    fn refusing_creator_always_fails() {
        let creator = RefusingContainerCreator;
        assert!(creator.create("bucket").is_err());
    }
}
