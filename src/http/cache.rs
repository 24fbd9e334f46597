//! HTTP cache validation module
//!
//! `ETag` generation and `If-None-Match` handling for the dataset and static assets.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Generate a strong `ETag` from the exact response bytes
///
/// Returns a quoted string, e.g. `"abc123def"`.
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Accepts a single tag, a comma separated list, weak tags (`W/"..."`) and `*`.
/// Returns true when a 304 should be sent.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').map(str::trim).any(|e| {
            e == "*" || e.strip_prefix("W/").unwrap_or(e) == etag
        })
    })
}
