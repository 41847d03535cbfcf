// Copyright 2026 xfercore contributors.

//! The account/service-level traverser: lists containers/buckets/shares
//! matching an optional prefix-or-wildcard, then concatenates each
//! surviving container's own traversal.
//!
//! Per-container fan-out could run concurrently, but the sequential
//! implementation here already satisfies the ordering guarantee callers
//! rely on — each container's objects are emitted in full, in
//! container-name order, before the next begins.

use globset::GlobBuilder;
use tracing::warn;

use crate::error::Result;
use crate::filter::FilterChain;
use crate::monitor::{Counter, Monitor};

use super::{EnumerationCounter, Morpher, Processor, Traverser};

/// Lists the containers/buckets/shares visible at an account, optionally
/// restricted by a literal prefix or glob pattern.
pub trait ContainerLister: Send + Sync {
    fn list_containers(&self, pattern: Option<&str>) -> Result<Vec<String>>;
}

/// Builds the per-container child traverser for one surviving name.
pub type ChildFactory<'a> = dyn Fn(&str) -> Result<Box<dyn Traverser>> + Send + Sync + 'a;

pub struct AccountTraverser<'a> {
    lister: Box<dyn ContainerLister + 'a>,
    child_factory: Box<ChildFactory<'a>>,
    pattern: Option<String>,
    monitor: Option<&'a dyn Monitor>,
}

impl<'a> AccountTraverser<'a> {
    pub fn new(
        lister: Box<dyn ContainerLister + 'a>,
        child_factory: Box<ChildFactory<'a>>,
        pattern: Option<String>,
        monitor: Option<&'a dyn Monitor>,
    ) -> Self {
        AccountTraverser {
            lister,
            child_factory,
            pattern,
            monitor,
        }
    }

    /// The container names this account traverser will actually visit,
    /// in lexicographic order — used by callers (the enumerator) that
    /// need the full bucket list up front, e.g. to build an
    /// [`crate::name_resolver::NameResolver`] before any transfer is
    /// planned.
    pub fn container_names(&self) -> Result<Vec<String>> {
        let mut names = self.lister.list_containers(self.pattern.as_deref())?;
        if let Some(pattern) = &self.pattern {
            if pattern.contains('*') || pattern.contains('?') {
                let glob = GlobBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|g| g.compile_matcher());
                if let Ok(matcher) = glob {
                    names.retain(|n| matcher.is_match(n));
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn warn_skip(&self, container: &str, err: &crate::error::Error) {
        if super::s3::is_region_mismatch(err) {
            super::s3::warn_region_mismatch(container);
        } else {
            warn!(container = %container, error = %err, "skipping container");
        }
        if let Some(monitor) = self.monitor {
            monitor.count(Counter::ContainersSkipped, 1);
        }
    }
}

impl<'a> Traverser for AccountTraverser<'a> {
    fn is_directory(&self, _is_source: bool) -> bool {
        true
    }

    fn traverse(
        &self,
        preprocess: Option<&Morpher<'_>>,
        process: &mut Processor<'_>,
        filters: &FilterChain,
        counter: Option<&EnumerationCounter<'_>>,
    ) -> Result<()> {
        for container in self.container_names()? {
            let child = match (self.child_factory)(&container) {
                Ok(child) => child,
                Err(err) if err.is_skippable_per_container() => {
                    self.warn_skip(&container, &err);
                    continue;
                }
                Err(err) => return Err(err),
            };
            match child.traverse(preprocess, process, filters, counter) {
                Ok(()) => {}
                Err(err) if err.is_skippable_per_container() => {
                    self.warn_skip(&container, &err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::stored_object::StoredObject;

    struct FixedLister(Vec<String>);

    impl ContainerLister for FixedLister {
        fn list_containers(&self, _pattern: Option<&str>) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    struct OneObjectTraverser(String);

    impl Traverser for OneObjectTraverser {
        fn is_directory(&self, _is_source: bool) -> bool {
            true
        }
        fn traverse(
            &self,
            _preprocess: Option<&Morpher<'_>>,
            process: &mut Processor<'_>,
            _filters: &FilterChain,
            _counter: Option<&EnumerationCounter<'_>>,
        ) -> Result<()> {
            let mut obj = StoredObject::file("a.txt", 1);
            obj.container_name = Some(self.0.clone());
            process(obj)
        }
    }

    #[test]
    fn concatenates_containers_in_lex_order() {
        let lister = FixedLister(vec!["b".to_string(), "a".to_string()]);
        let traverser = AccountTraverser::new(
            Box::new(lister),
            Box::new(|name: &str| Ok(Box::new(OneObjectTraverser(name.to_string())) as Box<dyn Traverser>)),
            None,
            None,
        );
        let mut seen = Vec::new();
        let mut process = |obj: StoredObject| {
            seen.push(obj.container_name.unwrap());
            Ok(())
        };
        traverser.traverse(None, &mut process, &FilterChain::new(), None).unwrap();
        assert_eq!(seen, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn skippable_error_skips_container_and_continues() {
        let lister = FixedLister(vec!["bad".to_string(), "good".to_string()]);
        let traverser = AccountTraverser::new(
            Box::new(lister),
            Box::new(|name: &str| {
                if name == "bad" {
                    Err(Error::NameUnresolvable { name: name.to_string() })
                } else {
                    Ok(Box::new(OneObjectTraverser(name.to_string())) as Box<dyn Traverser>)
                }
            }),
            None,
            None,
        );
        let mut seen = Vec::new();
        let mut process = |obj: StoredObject| {
            seen.push(obj.container_name.unwrap());
            Ok(())
        };
        traverser.traverse(None, &mut process, &FilterChain::new(), None).unwrap();
        assert_eq!(seen, vec!["good".to_string()]);
    }
}
