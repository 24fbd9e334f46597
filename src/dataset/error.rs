use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading one of the input CSV files
///
/// Every variant carries the offending path so the startup diagnostic can name it.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {} (line {line}): {message}", path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },
}

impl LoadError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound { path } | Self::Io { path, .. } | Self::Parse { path, .. } => path,
        }
    }

    pub(crate) fn parse(path: &std::path::Path, line: u64, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Classify a `csv` crate error for `path`
    pub(crate) fn from_csv(path: &std::path::Path, err: csv::Error) -> Self {
        let line = err.position().map_or(0, csv::Position::line);
        match err.into_kind() {
            csv::ErrorKind::Io(source) => Self::from_io(path, source),
            csv::ErrorKind::Utf8 { err, .. } => Self::parse(path, line, format!("invalid UTF-8: {err}")),
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => Self::parse(
                path,
                line,
                format!("expected {expected_len} fields, saw {len}"),
            ),
            other => Self::parse(path, line, format!("{other:?}")),
        }
    }
}
