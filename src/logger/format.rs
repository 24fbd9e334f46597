//! Access log format module
//!
//! Supported formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - `json` (one JSON object per line)
//! - Custom patterns with `$variable` substitution

use chrono::{DateTime, Local};
use serde::Serialize;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Access log entry for one served request
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub time: DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    /// HTTP version without the `HTTP/` prefix (1.0, 1.1, 2)
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_rfc3339<S: serde::Serializer>(
    time: &DateTime<Local>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339())
}

impl AccessLogEntry {
    /// Create a new access log entry stamped with the current time
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => format!(
                "{} \"{}\" \"{}\"",
                self.format_common(),
                self.referer.as_deref().unwrap_or("-"),
                self.user_agent.as_deref().unwrap_or("-"),
            ),
            "common" => self.format_common(),
            "json" => serde_json::to_string(self).unwrap_or_default(),
            custom => self.format_custom(custom),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    fn request_line(&self) -> String {
        format!(
            "{} {} HTTP/{}",
            self.method,
            self.request_uri(),
            self.http_version
        )
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables: `$remote_addr`, `$time_local`, `$time_iso8601`,
    /// `$request`, `$request_method`, `$request_uri`, `$request_time` (seconds,
    /// 3 decimals), `$status`, `$body_bytes_sent`, `$http_referer`,
    /// `$http_user_agent`.
    fn format_custom(&self, pattern: &str) -> String {
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;

        // Longer names first: $request_time and friends before $request
        let substitutions = [
            ("$remote_addr", self.remote_addr.clone()),
            ("$time_local", self.time.format(CLF_TIME).to_string()),
            ("$time_iso8601", self.time.to_rfc3339()),
            ("$request_time", format!("{request_time:.3}")),
            ("$request_method", self.method.clone()),
            ("$request_uri", self.request_uri()),
            ("$request", self.request_line()),
            ("$status", self.status.to_string()),
            ("$body_bytes_sent", self.body_bytes.to_string()),
            (
                "$http_referer",
                self.referer.clone().unwrap_or_else(|| "-".to_string()),
            ),
            (
                "$http_user_agent",
                self.user_agent.clone().unwrap_or_else(|| "-".to_string()),
            ),
        ];

        substitutions
            .iter()
            .fold(pattern.to_string(), |acc, (var, value)| acc.replace(var, value))
    }
}
