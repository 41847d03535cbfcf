// Copyright 2026 xfercore contributors.

//! The [`Traverser`] capability and its per-backend implementations.
//!
//! Every concrete traverser produces [`StoredObject`]s in deterministic
//! lexicographic order of `(container_name, relative_path)`, passes them
//! through an optional morpher and then the filter chain, and invokes a
//! processor for each survivor.

pub mod account;
pub mod adls;
pub mod blob;
pub mod file;
pub mod gcs;
pub mod local;
pub mod s3;

use crate::error::Result;
use crate::filter::FilterChain;
use crate::stored_object::StoredObject;

/// What a [`Morpher`] decides to do with an object before it reaches the
/// filter chain.
pub enum MorphOutcome {
    Keep(StoredObject),
    Drop,
}

/// An optional per-object transform run before filtering, e.g. resolving
/// the destination container name.
pub type Morpher<'a> = dyn Fn(StoredObject) -> MorphOutcome + 'a;

/// Called once per emitted object, regardless of filter outcome; reports
/// scan progress rather than transfer progress.
pub type EnumerationCounter<'a> = dyn Fn(&StoredObject) + 'a;

/// Called for each object that survives the filter chain. Returning an
/// error stops traversal.
pub type Processor<'a> = dyn FnMut(StoredObject) -> Result<()> + 'a;

/// Symlink handling policy for local traversal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymlinkMode {
    Skip,
    Follow,
    Preserve,
}

/// The capability implemented once per backend: local filesystem, Blob
/// container, File share, ADLS Gen2 filesystem, S3 bucket, GCS bucket,
/// and the account/service-level variants that fan out across many
/// containers.
pub trait Traverser: Send + Sync {
    /// Whether the rooted resource is a directory/container-like root
    /// rather than a single object. `is_source` distinguishes a source
    /// probe (which may resolve a single-object root) from a destination
    /// probe (which typically cannot).
    fn is_directory(&self, is_source: bool) -> bool;

    /// Enumerate the rooted resource, threading every object through
    /// `preprocess`, the filter chain, and then `process`.
    fn traverse(
        &self,
        preprocess: Option<&Morpher<'_>>,
        process: &mut Processor<'_>,
        filters: &FilterChain,
        counter: Option<&EnumerationCounter<'_>>,
    ) -> Result<()>;
}

/// Drive a traversal step for one already-produced object: apply the
/// morpher, the filter chain, and invoke the counter and processor in
/// the order the contract requires. Shared by every concrete traverser
/// so the morph/filter/count/process sequence can't drift between
/// backends.
pub(crate) fn drive_one(
    object: StoredObject,
    preprocess: Option<&Morpher<'_>>,
    process: &mut Processor<'_>,
    filters: &FilterChain,
    counter: Option<&EnumerationCounter<'_>>,
) -> Result<()> {
    let object = match preprocess {
        Some(morph) => match morph(object) {
            MorphOutcome::Keep(obj) => obj,
            MorphOutcome::Drop => return Ok(()),
        },
        None => object,
    };
    if let Some(counter) = counter {
        counter(&object);
    }
    if filters.keep(&object) {
        process(object)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_one_drops_on_morph() {
        let mut seen = Vec::new();
        let morph: &Morpher<'_> = &|_obj| MorphOutcome::Drop;
        let mut process = |obj: StoredObject| {
            seen.push(obj.relative_path);
            Ok(())
        };
        drive_one(
            StoredObject::file("a", 1),
            Some(morph),
            &mut process,
            &FilterChain::new(),
            None,
        )
        .unwrap();
        assert!(seen.is_empty());
    }

    #[test]
    fn drive_one_counts_even_when_filtered() {
        let count = std::cell::Cell::new(0);
        let counter: &EnumerationCounter<'_> = &|_obj| count.set(count.get() + 1);
        let mut seen = Vec::new();
        let mut process = |obj: StoredObject| {
            seen.push(obj.relative_path);
            Ok(())
        };
        let filters = FilterChain::new().push(crate::filter::IncludePattern::new(vec!["*.txt".to_string()]).unwrap());
        drive_one(
            StoredObject::file("a.png", 1),
            None,
            &mut process,
            &filters,
            Some(counter),
        )
        .unwrap();
        assert_eq!(count.get(), 1);
        assert!(seen.is_empty());
    }
}
