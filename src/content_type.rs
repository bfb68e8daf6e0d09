//! Content-type resolution for uploads
//!
//! Two stages: an explicit suffix override table (longest matching suffix
//! wins, so `js.map` beats `js`), then a byte-sniffing fallback over the
//! file's leading bytes for anything the table does not cover.

use crate::error::LongshoreResult;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How many leading bytes the sniffer looks at.
const SNIFF_LEN: usize = 512;

/// Fallback when nothing matches and the content is not recognizable text.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type for `path`, suffix table first, sniffed bytes second.
///
/// The table maps bare suffixes (`css`, `js.map`) to content types; a file
/// matches a suffix when its name ends with `.<suffix>`. Only the fallback
/// stage touches the file.
pub fn resolve(path: &Path, overrides: &BTreeMap<String, String>) -> LongshoreResult<String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Some(content_type) = from_suffix(&name, overrides) {
        return Ok(content_type);
    }

    let mut head = [0u8; SNIFF_LEN];
    let mut file = File::open(path)?;
    let read = file.read(&mut head)?;
    Ok(sniff_bytes(&head[..read]).to_string())
}

/// Longest-suffix lookup against the override table.
pub fn from_suffix(file_name: &str, overrides: &BTreeMap<String, String>) -> Option<String> {
    overrides
        .iter()
        .filter(|(suffix, _)| {
            file_name.len() >= suffix.len() + 1
                && file_name.ends_with(suffix.as_str())
                && file_name.as_bytes()[file_name.len() - suffix.len() - 1] == b'.'
        })
        .max_by_key(|(suffix, _)| suffix.len())
        .map(|(_, content_type)| content_type.clone())
}

/// Classify content by magic numbers, falling back to a UTF-8 probe.
pub fn sniff_bytes(head: &[u8]) -> &'static str {
    if head.starts_with(b"\x89PNG\r\n\x1a\n") {
        return "image/png";
    }
    if head.starts_with(b"\xFF\xD8\xFF") {
        return "image/jpeg";
    }
    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return "image/gif";
    }
    if head.len() >= 12 && head.starts_with(b"RIFF") && &head[8..12] == b"WEBP" {
        return "image/webp";
    }
    if head.starts_with(b"%PDF") {
        return "application/pdf";
    }
    if head.starts_with(b"\x1f\x8b") {
        return "application/gzip";
    }
    if head.starts_with(b"PK\x03\x04") {
        return "application/zip";
    }
    if let Ok(text) = std::str::from_utf8(head) {
        let lead = text.trim_start().as_bytes();
        if (lead.len() >= 5 && lead[..5].eq_ignore_ascii_case(b"<html"))
            || (lead.len() >= 9 && lead[..9].eq_ignore_ascii_case(b"<!doctype"))
        {
            return "text/html";
        }
        return "text/plain";
    }
    OCTET_STREAM
}
