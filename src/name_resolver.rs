// Copyright 2026 xfercore contributors.

//! Deterministic S3-to-Azure container name resolution.
//!
//! Azure containers/shares/filesystems must be 3-63 chars, lowercase
//! alphanumeric, hyphen-separated, with no consecutive hyphens and no
//! leading/trailing hyphen. S3 bucket names permit periods and
//! consecutive hyphens; this resolver maps the latter onto the former.

use std::collections::HashSet;

use tracing::info;

use crate::error::{Error, Result};

const MAX_LENGTH: usize = 63;
const MAX_SUFFIX: u32 = 999;

/// Maps S3 bucket names to valid, collision-free Azure container names.
pub struct NameResolver {
    /// Every name handed to the resolver so far, original or resolved,
    /// used to detect collisions.
    known: HashSet<String>,
    resolved: Vec<(String, String)>,
}

impl NameResolver {
    /// Accepts the full list of source bucket names up front, so
    /// collisions across the whole set are detected deterministically.
    pub fn new(initial_names: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut resolver = NameResolver {
            known: HashSet::new(),
            resolved: Vec::new(),
        };
        for name in initial_names {
            resolver.add(name)?;
        }
        Ok(resolver)
    }

    /// Resolve one more name, checking for collisions against both the
    /// original and already-resolved sets. Safe to call after
    /// construction; uses the same rules.
    pub fn add(&mut self, name: String) -> Result<String> {
        if let Some((_, existing)) = self.resolved.iter().find(|(orig, _)| orig == &name) {
            return Ok(existing.clone());
        }
        let mut candidate = rewrite(&name);
        let mut suffix = 1u32;
        while self.known.contains(&candidate) && candidate != name {
            suffix += 1;
            if suffix > MAX_SUFFIX {
                return Err(Error::NameUnresolvable { name });
            }
            candidate = format!("{}-{}", rewrite(&name), suffix);
        }
        // An identity mapping (no dots, no hyphen runs) can still collide
        // with another bucket's mapped name; keep incrementing.
        while self.known.contains(&candidate) {
            suffix += 1;
            if suffix > MAX_SUFFIX {
                return Err(Error::NameUnresolvable { name });
            }
            candidate = format!("{}-{}", rewrite(&name), suffix);
        }
        if candidate.len() > MAX_LENGTH {
            return Err(Error::NameUnresolvable { name });
        }
        self.known.insert(name.clone());
        self.known.insert(candidate.clone());
        if candidate != name {
            info!(from = %name, to = %candidate, "renamed bucket for Azure compatibility");
        }
        self.resolved.push((name, candidate.clone()));
        Ok(candidate)
    }

    /// Look up a name already resolved by this resolver.
    pub fn resolved_name(&self, original: &str) -> Option<&str> {
        self.resolved
            .iter()
            .find(|(orig, _)| orig == original)
            .map(|(_, resolved)| resolved.as_str())
    }
}

/// Replace `.` with `-`, then collapse hyphen runs of length >= 2 into
/// `-N-` where N is the run length.
fn rewrite(name: &str) -> String {
    let dotted = name.replace('.', "-");
    let mut out = String::with_capacity(dotted.len());
    let chars: Vec<char> = dotted.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '-' {
            let mut run = 0;
            while i < chars.len() && chars[i] == '-' {
                run += 1;
                i += 1;
            }
            if run >= 2 {
                out.push_str(&format!("-{}-", run));
            } else {
                out.push('-');
            }
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dots_become_hyphens() {
        let mut r = NameResolver::new(Vec::new()).unwrap();
        assert_eq!(r.add("bucket.name.1".to_string()).unwrap(), "bucket-name-1");
    }

    #[test]
    fn hyphen_runs_are_expanded_with_their_length() {
        let mut r = NameResolver::new(Vec::new()).unwrap();
        assert_eq!(r.add("bucket--name".to_string()).unwrap(), "bucket-2-name");
        assert_eq!(r.add("b---c".to_string()).unwrap(), "b-3-c");
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let mut r = NameResolver::new(Vec::new()).unwrap();
        let a = r.add("my.bucket".to_string()).unwrap();
        let b = r.add("my-bucket".to_string()).unwrap();
        assert_eq!(a, "my-bucket");
        assert_ne!(b, a);
        assert!(b.starts_with("my-bucket-"));
    }

    #[test]
    fn repeated_resolve_of_same_name_is_stable() {
        let mut r = NameResolver::new(Vec::new()).unwrap();
        let first = r.add("my.bucket".to_string()).unwrap();
        let second = r.add("my.bucket".to_string()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn too_long_after_resolution_fails() {
        let long_name = "a".repeat(60) + "...." + "b";
        let mut r = NameResolver::new(Vec::new()).unwrap();
        let result = r.add(long_name);
        assert!(result.is_err());
    }

    #[test]
    fn resolved_names_are_unique_for_a_whole_set() {
        let names = vec![
            "bucket.name".to_string(),
            "bucket-name".to_string(),
            "bucket--name".to_string(),
        ];
        let r = NameResolver::new(names.clone()).unwrap();
        let resolved: HashSet<_> = names
            .iter()
            .map(|n| r.resolved_name(n).unwrap().to_string())
            .collect();
        assert_eq!(resolved.len(), names.len());
        for name in resolved {
            assert!(name.len() <= MAX_LENGTH);
        }
    }
}
