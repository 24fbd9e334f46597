// Configuration module entry point
// Manages application configuration and the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, DataConfig, FrontendConfig, HttpConfig, LoggingConfig, PerformanceConfig,
    ServerConfig,
};

/// Prefix for environment overrides, e.g. `LAKECAST__SERVER__PORT=8080`
const ENV_PREFIX: &str = "LAKECAST";

impl Config {
    /// Load configuration from `config.toml` (optional) and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = Self::defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    fn defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("data.actual_path", "data/actual.csv")?
            .set_default("data.forecast_path", "data/forecast.csv")?
            .set_default("frontend.index_template", "frontend/templates/index.html")?
            .set_default("frontend.static_dir", "frontend/static")?
            .set_default("frontend.static_prefix", "/static")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_timeout", 10)?
            .set_default("http.server_name", "lakecast")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 1_048_576) // 1MB
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
