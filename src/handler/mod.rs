//! Request handler module
//!
//! Responsible for request routing dispatch: the index page, the dataset endpoint and static assets.

pub mod page;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
