//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Startup and shutdown logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::Level;

use crate::config::Config;
use crate::dataset::Dataset;
use std::net::SocketAddr;
use std::path::Path;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config.logging.level.parse().unwrap_or_else(|e| {
        eprintln!("[WARN] {e}, falling back to info");
        Level::Info
    });
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info log
fn write_info(level: Level, message: &str) {
    match writer::get() {
        Some(w) => w.write_info(level, message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(level: Level, message: &str) {
    match writer::get() {
        Some(w) => w.write_error(level, message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info(Level::Info, "======================================");
    write_info(Level::Info, "lakecast started successfully");
    write_info(Level::Info, &format!("Listening on: http://{addr}"));
    write_info(Level::Info, &format!("  - GET http://{addr}/"));
    write_info(Level::Info, &format!("  - GET http://{addr}/api/data"));
    write_info(Level::Info, &format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(Level::Info, &format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(Level::Info, &format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(Level::Info, &format!("Error log: {path}"));
    }
    write_info(Level::Info, "======================================\n");
}

pub fn log_dataset_loaded(actual: &Path, forecast: &Path, dataset: &Dataset) {
    write_info(
        Level::Info,
        &format!(
            "[Dataset] Loaded {} records ({} columns) from {} + {}",
            dataset.len(),
            dataset.columns().len(),
            actual.display(),
            forecast.display()
        ),
    );
    write_info(
        Level::Debug,
        &format!("[Dataset] Columns: {}", dataset.columns().join(", ")),
    );
}

pub fn log_index_page(template: &Path, found: bool) {
    if found {
        write_info(
            Level::Info,
            &format!("[Page] Index template: {}", template.display()),
        );
    } else {
        log_warning(&format!(
            "Index template {} not found, serving built-in page",
            template.display()
        ));
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(
        Level::Debug,
        &format!("[Connection] Accepted from: {peer_addr}"),
    );
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(
        Level::Error,
        &format!("[ERROR] Failed to serve connection: {err:?}"),
    );
}

pub fn log_error(message: &str) {
    write_error(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(Level::Warn, &format!("[WARN] {message}"));
}

pub fn log_debug(message: &str) {
    write_info(Level::Debug, &format!("[DEBUG] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_shutdown_started(active: usize) {
    write_info(
        Level::Info,
        &format!("\n[Shutdown] Stopped accepting, waiting for {active} active connection(s)"),
    );
}

pub fn log_shutdown_complete(remaining: usize) {
    if remaining == 0 {
        write_info(Level::Info, "[Shutdown] ✓ All connections closed");
    } else {
        log_warning(&format!(
            "[Shutdown] Timed out with {remaining} connection(s) still open"
        ));
    }
}
