//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the dataset and routing.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use response::{
    build_304_response, build_404_response, build_405_response, build_413_response,
    build_cached_response, build_html_response, build_json_response, build_options_response,
    with_server_header,
};
