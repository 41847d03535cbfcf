// Copyright 2026 xfercore contributors.

//! [`StoredObject`]: the unit every traverser emits.

use std::collections::BTreeMap;

use time::OffsetDateTime;

/// What kind of entity a [`StoredObject`] represents.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EntityType {
    File,
    Folder,
    Symlink,
}

/// Azure Blob storage tier of the underlying blob; `NA` for non-blob
/// backends and for append/page blobs where tiering does not apply.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BlobType {
    BlockBlob,
    AppendBlob,
    PageBlob,
    NA,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum BlobAccessTier {
    Hot,
    Cool,
    Cold,
    Archive,
    NA,
}

/// Metadata keys are case-insensitive on the wire (Azure); the map keeps
/// the original case but lookups here are case-insensitive.
pub type Metadata = BTreeMap<String, String>;

/// A single object (file, folder stub, or symlink) surfaced by a
/// traverser, ready to be turned into a [`crate::transfer::CopyTransfer`].
#[derive(Clone, Debug)]
pub struct StoredObject {
    /// Leaf basename, e.g. `b.txt` for `sub/b.txt`.
    pub name: String,
    /// Path from the traversal root, `/`-separated, never starting with
    /// `/`. Empty means "the root object itself".
    pub relative_path: String,
    pub container_name: Option<String>,
    /// Set by the enumerator after S3-to-Azure name resolution, if the
    /// destination container name differs from `container_name`.
    pub dst_container_name: Option<String>,
    pub entity_type: EntityType,
    pub size: u64,
    pub last_modified: Option<OffsetDateTime>,
    pub content_md5: Option<[u8; 16]>,
    pub metadata: Metadata,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub content_disposition: Option<String>,
    pub content_language: Option<String>,
    pub cache_control: Option<String>,
    pub blob_type: BlobType,
    pub blob_access_tier: BlobAccessTier,
    pub version_id: Option<String>,
    pub copy_id: Option<String>,
    pub copy_status: Option<String>,
}

impl StoredObject {
    /// A minimal file object, useful as a builder base in traversers and
    /// tests.
    pub fn file(relative_path: impl Into<String>, size: u64) -> Self {
        let relative_path = relative_path.into();
        let name = relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&relative_path)
            .to_string();
        StoredObject {
            name,
            relative_path,
            container_name: None,
            dst_container_name: None,
            entity_type: EntityType::File,
            size,
            last_modified: None,
            content_md5: None,
            metadata: Metadata::new(),
            content_type: None,
            content_encoding: None,
            content_disposition: None,
            content_language: None,
            cache_control: None,
            blob_type: BlobType::NA,
            blob_access_tier: BlobAccessTier::NA,
            version_id: None,
            copy_id: None,
            copy_status: None,
        }
    }

    pub fn folder(relative_path: impl Into<String>) -> Self {
        let mut obj = Self::file(relative_path, 0);
        obj.entity_type = EntityType::Folder;
        obj
    }

    pub fn effective_container_name(&self) -> Option<&str> {
        self.dst_container_name
            .as_deref()
            .or(self.container_name.as_deref())
    }

    /// Case-insensitive lookup, per the Azure metadata convention.
    pub fn metadata_get(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// A directory stub in Azure Blob: metadata key `hdi_isfolder=true`.
    pub fn is_folder_stub(&self) -> bool {
        self.metadata_get("hdi_isfolder")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// A symlink blob: metadata key `is_symlink=true`.
    pub fn is_symlink_marker(&self) -> bool {
        self.metadata_get("is_symlink")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Missing `last_modified` (the managed-disk/page-blob pattern) is
    /// treated as epoch zero for comparison purposes.
    pub fn last_modified_or_epoch(&self) -> OffsetDateTime {
        self.last_modified.unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_constructor_derives_name() {
        let obj = StoredObject::file("sub/b.txt", 20);
        assert_eq!(obj.name, "b.txt");
        assert_eq!(obj.relative_path, "sub/b.txt");
    }

    #[test]
    fn folder_has_zero_size() {
        let obj = StoredObject::folder("sub");
        assert_eq!(obj.size, 0);
        assert_eq!(obj.entity_type, EntityType::Folder);
    }

    #[test]
    fn metadata_lookup_is_case_insensitive() {
        let mut obj = StoredObject::folder("sub");
        obj.metadata.insert("Hdi_IsFolder".to_string(), "true".to_string());
        assert!(obj.is_folder_stub());
    }

    #[test]
    fn missing_last_modified_is_epoch_zero() {
        let obj = StoredObject::file("a", 1);
        assert_eq!(obj.last_modified_or_epoch(), OffsetDateTime::UNIX_EPOCH);
    }

    #[test]
    fn effective_container_prefers_destination_name() {
        let mut obj = StoredObject::file("a", 1);
        obj.container_name = Some("src".to_string());
        assert_eq!(obj.effective_container_name(), Some("src"));
        obj.dst_container_name = Some("dst".to_string());
        assert_eq!(obj.effective_container_name(), Some("dst"));
    }
}
