// Copyright 2026 xfercore contributors.

//! The [`ObjectFilter`] chain: pure, AND-combined predicates over a
//! [`StoredObject`].

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::stored_object::{BlobType, StoredObject};

/// A pure predicate over a [`StoredObject`]. `true` keeps the object;
/// `false` drops it.
pub trait ObjectFilter: Send + Sync {
    fn keep(&self, object: &StoredObject) -> bool;

    /// A short name for debugging/logging which filter dropped an
    /// object.
    fn name(&self) -> &str;
}

fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(false)
            .build()
            .expect("pattern already validated by caller");
        builder.add(glob);
    }
    builder.build().expect("globset built from valid globs")
}

/// Object's `name` must match at least one glob pattern.
pub struct IncludePattern {
    patterns: Vec<String>,
    set: GlobSet,
}

impl IncludePattern {
    pub fn new(patterns: Vec<String>) -> Result<Self, globset::Error> {
        for p in &patterns {
            GlobBuilder::new(p).case_insensitive(true).build()?;
        }
        let set = build_globset(&patterns);
        Ok(IncludePattern { patterns, set })
    }
}

impl ObjectFilter for IncludePattern {
    fn keep(&self, object: &StoredObject) -> bool {
        self.patterns.is_empty() || self.set.is_match(&object.name)
    }

    fn name(&self) -> &str {
        "IncludePattern"
    }
}

/// If `targets_path`, match against `relative_path`; otherwise against
/// `name`. Any match drops the object.
pub struct ExcludePattern {
    set: GlobSet,
    targets_path: bool,
}

impl ExcludePattern {
    pub fn new(patterns: Vec<String>, targets_path: bool) -> Result<Self, globset::Error> {
        for p in &patterns {
            GlobBuilder::new(p).case_insensitive(true).build()?;
        }
        Ok(ExcludePattern {
            set: build_globset(&patterns),
            targets_path,
        })
    }
}

impl ObjectFilter for ExcludePattern {
    fn keep(&self, object: &StoredObject) -> bool {
        let subject = if self.targets_path {
            &object.relative_path
        } else {
            &object.name
        };
        !self.set.is_match(subject)
    }

    fn name(&self) -> &str {
        "ExcludePattern"
    }
}

/// Drop objects whose `blob_type` is in the given set.
pub struct ExcludeBlobType {
    excluded: Vec<BlobType>,
}

impl ExcludeBlobType {
    pub fn new(excluded: Vec<BlobType>) -> Self {
        ExcludeBlobType { excluded }
    }
}

impl ObjectFilter for ExcludeBlobType {
    fn keep(&self, object: &StoredObject) -> bool {
        !self.excluded.contains(&object.blob_type)
    }

    fn name(&self) -> &str {
        "ExcludeBlobType"
    }
}

bitflags::bitflags! {
    /// OS-filesystem attributes, local-source only.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Attributes: u8 {
        const HIDDEN = 0b0000_0001;
        const READ_ONLY = 0b0000_0010;
        const SYSTEM = 0b0000_0100;
        const ARCHIVE = 0b0000_1000;
    }
}

/// Whether `AttributeFilter` keeps objects matching `mask` or objects
/// that don't.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IncludeMode {
    Include,
    Exclude,
}

/// OS-filesystem-attribute match; only meaningful when the source is
/// local. The attributes of an object are supplied by the caller (the
/// local traverser), not derived here.
pub struct AttributeFilter {
    mask: Attributes,
    mode: IncludeMode,
    attributes_of: Box<dyn Fn(&StoredObject) -> Attributes + Send + Sync>,
}

impl AttributeFilter {
    pub fn new(
        mask: Attributes,
        mode: IncludeMode,
        attributes_of: impl Fn(&StoredObject) -> Attributes + Send + Sync + 'static,
    ) -> Self {
        AttributeFilter {
            mask,
            mode,
            attributes_of: Box::new(attributes_of),
        }
    }
}

impl ObjectFilter for AttributeFilter {
    fn keep(&self, object: &StoredObject) -> bool {
        let matches = (self.attributes_of)(object).intersects(self.mask);
        match self.mode {
            IncludeMode::Include => matches,
            IncludeMode::Exclude => !matches,
        }
    }

    fn name(&self) -> &str {
        "AttributeFilter"
    }
}

/// An ordered, AND-combined chain of [`ObjectFilter`]s. Order does not
/// affect the result (pure AND) but is preserved for debuggability:
/// [`FilterChain::first_rejecting`] reports which filter short-circuited.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn ObjectFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        FilterChain { filters: Vec::new() }
    }

    pub fn push(mut self, filter: impl ObjectFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn keep(&self, object: &StoredObject) -> bool {
        self.filters.iter().all(|f| f.keep(object))
    }

    pub fn first_rejecting(&self, object: &StoredObject) -> Option<&str> {
        self.filters
            .iter()
            .find(|f| !f.keep(object))
            .map(|f| f.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_pattern_requires_a_match() {
        let filter = IncludePattern::new(vec!["*.txt".to_string()]).unwrap();
        assert!(filter.keep(&StoredObject::file("a.txt", 1)));
        assert!(!filter.keep(&StoredObject::file("a.png", 1)));
    }

    #[test]
    fn empty_include_pattern_keeps_everything() {
        let filter = IncludePattern::new(vec![]).unwrap();
        assert!(filter.keep(&StoredObject::file("a.png", 1)));
    }

    #[test]
    fn exclude_pattern_targets_path_when_requested() {
        let filter = ExcludePattern::new(vec!["sub/*".to_string()], true).unwrap();
        assert!(!filter.keep(&StoredObject::file("sub/a.txt", 1)));
        assert!(filter.keep(&StoredObject::file("a.txt", 1)));
    }

    #[test]
    fn exclude_blob_type_drops_matching() {
        let filter = ExcludeBlobType::new(vec![BlobType::PageBlob]);
        let mut page = StoredObject::file("a", 1);
        page.blob_type = BlobType::PageBlob;
        assert!(!filter.keep(&page));
        let mut block = StoredObject::file("b", 1);
        block.blob_type = BlobType::BlockBlob;
        assert!(filter.keep(&block));
    }

    #[test]
    fn chain_is_and_combined() {
        let chain = FilterChain::new()
            .push(IncludePattern::new(vec!["*.txt".to_string()]).unwrap())
            .push(ExcludePattern::new(vec!["secret*".to_string()], false).unwrap());
        assert!(chain.keep(&StoredObject::file("a.txt", 1)));
        assert!(!chain.keep(&StoredObject::file("secret.txt", 1)));
        assert!(!chain.keep(&StoredObject::file("a.png", 1)));
    }

    #[test]
    fn first_rejecting_reports_filter_name() {
        let chain = FilterChain::new().push(IncludePattern::new(vec!["*.txt".to_string()]).unwrap());
        assert_eq!(
            chain.first_rejecting(&StoredObject::file("a.png", 1)),
            Some("IncludePattern")
        );
    }
}
