//! MIME type detection module
//!
//! Returns the corresponding Content-Type based on file extension.

/// Get MIME Content-Type based on file extension
///
/// Unknown or missing extensions fall back to `application/octet-stream`.
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    match extension {
        // Text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",

        // Scripts and data
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("csv") => "text/csv; charset=utf-8",
        Some("geojson") => "application/geo+json",

        // Default
        _ => "application/octet-stream",
    }
}
