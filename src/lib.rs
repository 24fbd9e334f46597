//! lakecast
//!
//! Loads the actual and forecast CSV files once at startup, merges them into
//! one provenance-tagged dataset and serves it over HTTP next to an index page.

pub mod config;
pub mod dataset;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
