// Copyright 2026 xfercore contributors.

//! The composition point: a traverser, a filter chain, a per-object
//! processor and a finalizer, wired into one job plan.

pub mod copy;
pub mod sync;

pub use copy::{CopyEnumerator, CopyEnumeratorOptions};
pub use sync::{SyncEnumerator, SyncEnumeratorOptions};
