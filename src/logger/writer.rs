//! Log writer module
//!
//! Provides thread-safe log writing to files or stdout/stderr, filtered by level.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Severity, ordered from most to least important
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" | "trace" => Ok(Self::Debug),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Log output target
enum LogTarget {
    /// Write to stdout
    Stdout,
    /// Write to stderr
    Stderr,
    /// Write to file
    File(Mutex<File>),
}

/// Thread-safe log writer
pub struct LogWriter {
    /// Most verbose level that is still written
    max_level: Level,
    /// Access log target
    access: LogTarget,
    /// Error log target
    error: LogTarget,
}

impl LogWriter {
    /// Create a new log writer with optional file paths
    fn new(
        max_level: Level,
        access_log_file: Option<&str>,
        error_log_file: Option<&str>,
    ) -> io::Result<Self> {
        let access = match access_log_file {
            Some(path) => LogTarget::File(Mutex::new(open_log_file(path)?)),
            None => LogTarget::Stdout,
        };

        let error = match error_log_file {
            Some(path) => LogTarget::File(Mutex::new(open_log_file(path)?)),
            None => LogTarget::Stderr,
        };

        Ok(Self {
            max_level,
            access,
            error,
        })
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.max_level
    }

    /// Write to access log (not level filtered)
    pub fn write_access(&self, message: &str) {
        write_to_target(&self.access, message);
    }

    /// Write to error log
    pub fn write_error(&self, level: Level, message: &str) {
        if self.enabled(level) {
            write_to_target(&self.error, message);
        }
    }

    /// Write info message (to access log target)
    pub fn write_info(&self, level: Level, message: &str) {
        if self.enabled(level) {
            write_to_target(&self.access, message);
        }
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Write message to log target
fn write_to_target(target: &LogTarget, message: &str) {
    match target {
        LogTarget::Stdout => {
            println!("{message}");
        }
        LogTarget::Stderr => {
            eprintln!("{message}");
        }
        LogTarget::File(file) => {
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(f, "{message}");
            }
        }
    }
}

/// Initialize the global log writer
///
/// This should be called once at application startup.
/// Returns error if log files cannot be opened.
pub fn init(
    max_level: Level,
    access_log_file: Option<&str>,
    error_log_file: Option<&str>,
) -> io::Result<()> {
    let writer = LogWriter::new(max_level, access_log_file, error_log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if `init()` has run
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}
