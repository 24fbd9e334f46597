//! Static file serving module
//!
//! Handles static file loading, MIME type detection, and response building.

use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Whether `path` lies strictly below the mount `prefix` (e.g. `/static/app.js` under `/static`)
pub fn is_under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.len() > 1 && rest.starts_with('/'))
}

/// Serve static files from a directory
pub async fn serve_directory(
    ctx: &RequestContext<'_>,
    dir: &Path,
    route_prefix: &str,
) -> Response<Full<Bytes>> {
    match load_from_directory(dir, ctx.path, route_prefix).await {
        Some((content, content_type)) => {
            build_static_file_response(content, content_type, ctx.if_none_match, ctx.is_head)
        }
        None => http::build_404_response(),
    }
}

/// Resolve `path` below `static_dir` and read it, refusing anything outside the directory
pub async fn load_from_directory(
    static_dir: &Path,
    path: &str,
    route_prefix: &str,
) -> Option<(Vec<u8>, &'static str)> {
    let relative_path = path
        .strip_prefix(route_prefix.trim_end_matches('/'))
        .unwrap_or(path)
        .trim_start_matches('/');
    if relative_path.is_empty() {
        return None;
    }

    let static_dir_canonical = match fs::canonicalize(static_dir).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{}': {e}",
                static_dir.display()
            ));
            return None;
        }
    };

    // File not found is common (404), no need to log at warning level
    let file_path: PathBuf = static_dir.join(relative_path);
    let file_path_canonical = fs::canonicalize(&file_path).await.ok()?;
    if !file_path_canonical.starts_with(&static_dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }
    if !file_path_canonical.is_file() {
        return None;
    }

    let content = match fs::read(&file_path_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path_canonical.display(),
                e
            ));
            return None;
        }
    };

    let content_type =
        mime::get_content_type(file_path_canonical.extension().and_then(|e| e.to_str()));

    Some((content, content_type))
}

/// Build static file response with `ETag` support
fn build_static_file_response(
    data: Vec<u8>,
    content_type: &str,
    if_none_match: Option<&str>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(&data);

    // Check if client has cached version
    if cache::check_etag_match(if_none_match, &etag) {
        return http::build_304_response(&etag);
    }

    http::build_cached_response(Bytes::from(data), content_type, &etag, is_head)
}
