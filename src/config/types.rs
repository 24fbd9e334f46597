// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub frontend: FrontendConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Input CSV files
#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub actual_path: PathBuf,
    pub forecast_path: PathBuf,
}

/// Page template and static asset locations
#[derive(Debug, Deserialize, Clone)]
pub struct FrontendConfig {
    pub index_template: PathBuf,
    pub static_dir: PathBuf,
    /// URL prefix the static directory is mounted under
    pub static_prefix: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    /// Seconds in-flight connections get to finish after a shutdown signal
    pub shutdown_timeout: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}
