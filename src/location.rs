// Copyright 2026 xfercore contributors.

//! The [`Location`] tag every endpoint carries, and the [`FromTo`] pair
//! that pins down transfer direction.

use crate::error::{Error, Result};

/// Which backend an endpoint belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Location {
    Local,
    Blob,
    File,
    BlobFS,
    S3,
    GCS,
    Pipe,
    Benchmark,
    None,
}

impl Location {
    pub fn is_remote(self) -> bool {
        matches!(
            self,
            Location::Blob | Location::File | Location::BlobFS | Location::S3 | Location::GCS
        )
    }
}

/// An ordered `(from, to)` pair, validated against the closed set of
/// directions the core supports: upload, download, service-to-service,
/// and delete-to-trash.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FromTo {
    pub from: Location,
    pub to: Location,
}

impl FromTo {
    /// Build a `FromTo`, failing the job at planning time for any pair
    /// outside the small closed set this core understands.
    pub fn new(from: Location, to: Location) -> Result<Self> {
        if VALID_PAIRS.contains(&(from, to)) {
            Ok(FromTo { from, to })
        } else {
            Err(Error::invalid_url(
                format!("{from:?}->{to:?}"),
                "unsupported source/destination combination",
            ))
        }
    }

    pub fn is_upload(&self) -> bool {
        self.from == Location::Local && self.to.is_remote()
    }

    pub fn is_download(&self) -> bool {
        self.from.is_remote() && self.to == Location::Local
    }

    /// Service-to-service: both ends are remote and the execution engine
    /// is expected to issue server-side copies rather than round-trip
    /// bytes through the client.
    pub fn is_s2s(&self) -> bool {
        self.from.is_remote() && self.to.is_remote()
    }

    pub fn is_delete(&self) -> bool {
        self.to == Location::None
    }
}

const VALID_PAIRS: &[(Location, Location)] = &[
    (Location::Local, Location::Blob),
    (Location::Local, Location::File),
    (Location::Local, Location::BlobFS),
    (Location::Local, Location::S3),
    (Location::Local, Location::GCS),
    (Location::Blob, Location::Local),
    (Location::File, Location::Local),
    (Location::BlobFS, Location::Local),
    (Location::S3, Location::Local),
    (Location::GCS, Location::Local),
    (Location::Blob, Location::Blob),
    (Location::Blob, Location::BlobFS),
    (Location::BlobFS, Location::Blob),
    (Location::S3, Location::Blob),
    (Location::GCS, Location::Blob),
    (Location::Blob, Location::None),
    (Location::File, Location::None),
    (Location::BlobFS, Location::None),
    (Location::S3, Location::None),
    (Location::GCS, Location::None),
    (Location::Local, Location::None),
    (Location::Local, Location::Pipe),
    (Location::Pipe, Location::Local),
    (Location::Local, Location::Benchmark),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_pair_is_valid() {
        let ft = FromTo::new(Location::Local, Location::Blob).unwrap();
        assert!(ft.is_upload());
        assert!(!ft.is_download());
        assert!(!ft.is_s2s());
    }

    #[test]
    fn s2s_pair_is_valid() {
        let ft = FromTo::new(Location::S3, Location::Blob).unwrap();
        assert!(ft.is_s2s());
    }

    #[test]
    fn unknown_pair_fails_at_planning_time() {
        let err = FromTo::new(Location::Pipe, Location::S3).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn delete_pair() {
        let ft = FromTo::new(Location::Blob, Location::None).unwrap();
        assert!(ft.is_delete());
    }
}
