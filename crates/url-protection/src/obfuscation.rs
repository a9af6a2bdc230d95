//! Base64 concealment of a path and query inside a single path segment.
//!
//! This is NOT encryption: anyone can decode the segment. It only keeps the
//! digest and parameters out of sight of casual readers.

use base64::{engine::general_purpose::STANDARD, Engine};

pub(crate) fn obfuscate(path_and_query: &str) -> String {
    STANDARD.encode(path_and_query.as_bytes())
}

/// Returns `None` for malformed base64 or non UTF-8 content.
pub(crate) fn unobfuscate(segment: &str) -> Option<String> {
    let bytes = STANDARD.decode(segment).ok()?;
    String::from_utf8(bytes).ok()
}
