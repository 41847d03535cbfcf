// Copyright 2026 xfercore contributors.

//! [`ResourceLocator`]: classification of a user-supplied endpoint into
//! structured fields, per the rules each backend's URL shape implies.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::error::{Error, Result};
use crate::location::Location;

lazy_static! {
    static ref S3_VHOST_RE: Regex =
        Regex::new(r"^(?P<bucket>[A-Za-z0-9.\-]+)\.s3(?:[.-](?P<region>[a-z0-9-]+))?\.amazonaws\.com$")
            .unwrap();
    static ref S3_PATH_STYLE_RE: Regex =
        Regex::new(r"^s3(?:[.-](?P<region>[a-z0-9-]+))?\.amazonaws\.com$").unwrap();
    static ref GCS_VHOST_RE: Regex =
        Regex::new(r"^(?P<bucket>[a-z0-9.\-_]+)\.storage\.googleapis\.com$").unwrap();
}

/// How much of the resource hierarchy a locator names.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    /// No container/bucket named: the account or service root.
    Service,
    /// A container/bucket/share/filesystem, nothing below it.
    Container,
    /// A single object with no wildcard or trailing slash.
    Object,
    /// A prefix, trailing slash, or wildcard: more than one object may
    /// match.
    Folder,
}

/// A parsed, structured view of a source or destination endpoint.
#[derive(Clone, Debug)]
pub struct ResourceLocator {
    pub raw_url: String,
    pub scheme: String,
    pub host: String,
    pub container_name: Option<String>,
    pub object_key: Option<String>,
    pub version_id: Option<String>,
    pub sas_signature: Option<String>,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub level: Level,
    /// Set when the path ends exactly with `/*`.
    pub strip_top_dir: bool,
}

impl ResourceLocator {
    /// Parse `raw` as an endpoint of the given [`Location`].
    ///
    /// Fails with [`Error::InvalidUrl`] for shapes that don't match the
    /// backend's known URL forms.
    pub fn parse(raw: &str, location: Location) -> Result<Self> {
        match location {
            Location::Local | Location::Pipe | Location::Benchmark | Location::None => {
                Self::parse_local_like(raw, location)
            }
            Location::S3 => Self::parse_s3(raw),
            Location::GCS => Self::parse_gcs(raw),
            Location::Blob | Location::File | Location::BlobFS => Self::parse_azure(raw, location),
        }
    }

    fn parse_local_like(raw: &str, location: Location) -> Result<Self> {
        let (path, strip_top_dir) = strip_wildcard_suffix(raw);
        let level = if path.is_empty() {
            Level::Service
        } else if strip_top_dir || path.ends_with('/') || has_wildcard(&path) {
            Level::Folder
        } else {
            Level::Object
        };
        Ok(ResourceLocator {
            raw_url: raw.to_string(),
            scheme: "file".to_string(),
            host: String::new(),
            container_name: None,
            object_key: Some(path),
            version_id: None,
            sas_signature: None,
            endpoint: None,
            region: None,
            level: if matches!(location, Location::None) {
                Level::Object
            } else {
                level
            },
            strip_top_dir,
        })
    }

    fn parse_s3(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| Error::invalid_url(raw, e.to_string()))?;
        let host = url.host_str().unwrap_or_default().to_string();
        let mut segments: Vec<String> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).map(decode_plus).collect())
            .unwrap_or_default();

        let (bucket, region, object_key) = if let Some(caps) = S3_VHOST_RE.captures(&host) {
            let bucket = caps.name("bucket").unwrap().as_str().to_string();
            let region = caps.name("region").map(|m| m.as_str().to_string());
            let key = if segments.is_empty() {
                None
            } else {
                Some(segments.join("/"))
            };
            (Some(bucket), region, key)
        } else if S3_PATH_STYLE_RE.is_match(&host) {
            let region = S3_PATH_STYLE_RE
                .captures(&host)
                .and_then(|c| c.name("region"))
                .map(|m| m.as_str().to_string());
            if segments.is_empty() {
                (None, region, None)
            } else {
                let bucket = segments.remove(0);
                let key = if segments.is_empty() {
                    None
                } else {
                    Some(segments.join("/"))
                };
                (Some(bucket), region, key)
            }
        } else {
            return Err(Error::invalid_url(
                raw,
                "host does not match an S3 bucket or endpoint form",
            ));
        };

        let (object_key, strip_top_dir) = match object_key {
            Some(k) => {
                let (k, strip) = strip_wildcard_suffix(&k);
                (Some(k), strip)
            }
            None => (None, false),
        };

        let level = match (&bucket, &object_key) {
            (None, _) => Level::Service,
            (Some(_), None) => Level::Container,
            (Some(_), Some(k)) => {
                if strip_top_dir || k.ends_with('/') || (bucket.is_none() && has_wildcard(k)) {
                    Level::Folder
                } else if has_wildcard(k) && bucket.is_some() {
                    // Wildcards are only honored in the object-key portion at
                    // container level; bucket-name wildcards are a service-level
                    // concept handled above.
                    Level::Folder
                } else {
                    Level::Object
                }
            }
        };

        Ok(ResourceLocator {
            raw_url: raw.to_string(),
            scheme: url.scheme().to_string(),
            host,
            container_name: bucket,
            object_key,
            version_id: url
                .query_pairs()
                .find(|(k, _)| k == "versionId")
                .map(|(_, v)| v.into_owned()),
            sas_signature: None,
            endpoint: None,
            region,
            level,
            strip_top_dir,
        })
    }

    fn parse_gcs(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| Error::invalid_url(raw, e.to_string()))?;
        let host = url.host_str().unwrap_or_default().to_string();
        let mut segments: Vec<String> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).map(|s| s.to_string()).collect())
            .unwrap_or_default();

        let bucket = if let Some(caps) = GCS_VHOST_RE.captures(&host) {
            Some(caps.name("bucket").unwrap().as_str().to_string())
        } else if host == "storage.googleapis.com" {
            if segments.is_empty() {
                None
            } else {
                Some(segments.remove(0))
            }
        } else {
            return Err(Error::invalid_url(
                raw,
                "host does not match a GCS bucket or endpoint form",
            ));
        };

        let object_key = if segments.is_empty() {
            None
        } else {
            Some(segments.join("/"))
        };
        let (object_key, strip_top_dir) = match object_key {
            Some(k) => {
                let (k, strip) = strip_wildcard_suffix(&k);
                (Some(k), strip)
            }
            None => (None, false),
        };

        let level = match (&bucket, &object_key) {
            (None, _) => Level::Service,
            (Some(_), None) => Level::Container,
            (Some(_), Some(k)) => {
                if strip_top_dir || k.ends_with('/') {
                    Level::Folder
                } else {
                    Level::Object
                }
            }
        };

        Ok(ResourceLocator {
            raw_url: raw.to_string(),
            scheme: url.scheme().to_string(),
            host,
            container_name: bucket,
            object_key,
            version_id: None,
            sas_signature: None,
            endpoint: None,
            region: None,
            level,
            strip_top_dir,
        })
    }

    fn parse_azure(raw: &str, location: Location) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| Error::invalid_url(raw, e.to_string()))?;
        let host = url.host_str().unwrap_or_default().to_string();
        let sas_signature = if url.query().is_some() {
            Some(url.query().unwrap().to_string())
        } else {
            None
        };
        // Azure container/share/filesystem names do not honor wildcards; the
        // first path segment is always the literal container name.
        let mut segments: Vec<String> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).map(|s| s.to_string()).collect())
            .unwrap_or_default();

        let container = if segments.is_empty() {
            None
        } else {
            Some(segments.remove(0))
        };
        let object_key = if segments.is_empty() {
            None
        } else {
            Some(segments.join("/"))
        };
        let (object_key, strip_top_dir) = match object_key {
            Some(k) => {
                let (k, strip) = strip_wildcard_suffix(&k);
                (Some(k), strip)
            }
            None => (None, false),
        };

        if location == Location::BlobFS && host.is_empty() {
            return Err(Error::invalid_url(raw, "missing ADLS Gen2 account host"));
        }

        let level = match (&container, &object_key) {
            (None, _) => Level::Service,
            (Some(_), None) => Level::Container,
            (Some(_), Some(k)) => {
                if strip_top_dir || k.ends_with('/') {
                    Level::Folder
                } else {
                    Level::Object
                }
            }
        };

        Ok(ResourceLocator {
            raw_url: display_form(raw),
            scheme: url.scheme().to_string(),
            host,
            container_name: container,
            object_key,
            version_id: url
                .query_pairs()
                .find(|(k, _)| k == "versionid")
                .map(|(_, v)| v.into_owned()),
            sas_signature,
            endpoint: None,
            region: None,
            level,
            strip_top_dir,
        })
    }
}

/// The raw URL with its query string (SAS) redacted, for display/log
/// purposes: the signature itself is kept only in [`ResourceLocator::sas_signature`].
fn display_form(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.query().is_some() => {
            url.set_query(None);
            url.to_string()
        }
        _ => raw.to_string(),
    }
}

fn has_wildcard(s: &str) -> bool {
    s.contains('*') || s.contains('?')
}

/// Strip a trailing `/*` (setting `strip_top_dir`), returning the
/// remaining path unchanged otherwise.
fn strip_wildcard_suffix(path: &str) -> (String, bool) {
    if let Some(stripped) = path.strip_suffix("/*") {
        (stripped.to_string(), true)
    } else {
        (path.to_string(), false)
    }
}

/// S3 management console quirk: `+` in an object key means space.
fn decode_plus(segment: &str) -> String {
    segment.replace('+', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_s3_vhost_object() {
        let loc = ResourceLocator::parse("https://my-bucket.s3.amazonaws.com/a/b.txt", Location::S3).unwrap();
        assert_eq!(loc.container_name.as_deref(), Some("my-bucket"));
        assert_eq!(loc.object_key.as_deref(), Some("a/b.txt"));
        assert_eq!(loc.level, Level::Object);
    }

    #[test]
    fn parse_s3_path_style_with_region() {
        let loc =
            ResourceLocator::parse("https://s3-us-west-2.amazonaws.com/my-bucket/k", Location::S3).unwrap();
        assert_eq!(loc.container_name.as_deref(), Some("my-bucket"));
        assert_eq!(loc.region.as_deref(), Some("us-west-2"));
    }

    #[test]
    fn parse_s3_service_level() {
        let loc = ResourceLocator::parse("https://s3.amazonaws.com/", Location::S3).unwrap();
        assert_eq!(loc.level, Level::Service);
        assert!(loc.container_name.is_none());
    }

    #[test]
    fn parse_s3_rejects_bad_host() {
        let err = ResourceLocator::parse("https://example.com/bucket/key", Location::S3).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn s3_plus_decodes_to_space() {
        let loc = ResourceLocator::parse("https://b.s3.amazonaws.com/a+b.txt", Location::S3).unwrap();
        assert_eq!(loc.object_key.as_deref(), Some("a b.txt"));
    }

    #[test]
    fn parse_blob_container_level() {
        let loc = ResourceLocator::parse("https://acct.blob.core.windows.net/c", Location::Blob).unwrap();
        assert_eq!(loc.container_name.as_deref(), Some("c"));
        assert_eq!(loc.level, Level::Container);
    }

    #[test]
    fn parse_blob_captures_sas_and_redacts_display_form() {
        let loc = ResourceLocator::parse(
            "https://acct.blob.core.windows.net/c/file.txt?sv=2020-01-01&sig=abc",
            Location::Blob,
        )
        .unwrap();
        assert!(loc.sas_signature.unwrap().contains("sig=abc"));
        assert!(!loc.raw_url.contains("sig="));
    }

    #[test]
    fn folder_level_on_trailing_slash() {
        let loc = ResourceLocator::parse("https://acct.blob.core.windows.net/c/dir/", Location::Blob).unwrap();
        assert_eq!(loc.level, Level::Folder);
    }

    #[test]
    fn strip_top_dir_on_trailing_star() {
        let loc = ResourceLocator::parse("/data/*", Location::Local).unwrap();
        assert!(loc.strip_top_dir);
        assert_eq!(loc.object_key.as_deref(), Some("/data"));
    }

    #[test]
    fn parse_gcs_vhost() {
        let loc = ResourceLocator::parse("https://my-bucket.storage.googleapis.com/k", Location::GCS).unwrap();
        assert_eq!(loc.container_name.as_deref(), Some("my-bucket"));
        assert_eq!(loc.object_key.as_deref(), Some("k"));
    }
}
