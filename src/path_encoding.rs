// Copyright 2026 xfercore contributors.

//! URL and path escaping rules applied to destination paths before they
//! are handed to the execution engine.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::location::Location;

/// Characters illegal in NTFS/SMB file names, beyond what a generic
/// URL-path escape already covers.
const WINDOWS_ILLEGAL: &[char] = &['<', '>', '\\', '/', ':', '"', '|', '?', '*', '\0'];

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%');

/// `+` in an S3 object key means space; apply before any other
/// processing.
pub fn decode_s3_plus(key: &str) -> String {
    key.replace('+', " ")
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Windows/Azure Files additionally forbid a handful of characters that a
/// generic URL-path escape leaves untouched when they appear as literal
/// bytes in a single segment (e.g. `:` is valid in a URL path).
fn escape_windows_illegal(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for ch in segment.chars() {
        if WINDOWS_ILLEGAL.contains(&ch) && ch != '/' {
            out.push_str(&utf8_percent_encode(&ch.to_string(), PATH_SEGMENT).to_string());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Encode a `/`-joined relative path for the given destination location,
/// per-segment.
///
/// - Any remote destination gets every segment URL-path-escaped.
/// - Local-on-Windows or remote Azure Files additionally escape the
///   NTFS/SMB-illegal character set.
pub fn encode_for_destination(relative_path: &str, destination: Location, windows_local: bool) -> String {
    let remote = destination.is_remote();
    let azure_files = destination == Location::File;
    if !remote && !windows_local {
        return relative_path.to_string();
    }
    relative_path
        .split('/')
        .map(|segment| {
            let escaped = if remote {
                encode_segment(segment)
            } else {
                segment.to_string()
            };
            if windows_local || azure_files {
                escape_windows_illegal(&escaped)
            } else {
                escaped
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Reverse the escaping applied by [`encode_for_destination`], used when
/// the *source* was Azure Files or Windows-local and the *target* is
/// non-remote (so the original literal characters should be restored).
pub fn decode_from_source(relative_path: &str) -> String {
    relative_path
        .split('/')
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_plus_decodes_to_space() {
        assert_eq!(decode_s3_plus("a+b"), "a b");
    }

    #[test]
    fn local_non_windows_target_is_untouched() {
        let out = encode_for_destination("a b/c?.txt", Location::Local, false);
        assert_eq!(out, "a b/c?.txt");
    }

    #[test]
    fn remote_target_escapes_each_segment() {
        let out = encode_for_destination("a b/c.txt", Location::Blob, false);
        assert_eq!(out, "a%20b/c.txt");
    }

    #[test]
    fn windows_local_escapes_illegal_chars() {
        let out = encode_for_destination("a:b/c*.txt", Location::Local, true);
        assert!(out.contains("%3A") || out.contains("%3a"));
        assert!(out.contains("%2A") || out.contains("%2a"));
    }

    #[test]
    fn round_trip_through_decode() {
        let encoded = encode_for_destination("a b.txt", Location::Blob, false);
        let decoded = decode_from_source(&encoded);
        assert_eq!(decoded, "a b.txt");
    }
}
