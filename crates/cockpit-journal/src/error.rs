//! Error types for reading the game's status log.

use std::path::{Path, PathBuf};

/// Result type alias for status log reads.
pub type Result<T> = std::result::Result<T, ReadError>;

/// Errors that can occur while reading the status file or the journals.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// A file could not be read.
    #[error("Couldn't read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file was read but is not valid JSON of the expected shape.
    #[error("Couldn't parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The status file exists but is empty (the game truncates it before
    /// each write).
    #[error("{} is empty", path.display())]
    Empty { path: PathBuf },

    /// No journal records the current star system.
    #[error("No star system found in journals under {}", dir.display())]
    LocationUnknown { dir: PathBuf },
}

impl ReadError {
    /// Create a new I/O error for `path`.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a new parse error for `path`.
    pub fn parse(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a new empty file error.
    pub fn empty(path: impl AsRef<Path>) -> Self {
        Self::Empty {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a new unknown location error.
    pub fn location_unknown(dir: impl AsRef<Path>) -> Self {
        Self::LocationUnknown {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}
