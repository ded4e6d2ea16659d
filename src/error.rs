use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a duplicate scan.
///
/// There is no partial result: any of these stops the scan and is handed
/// back to the caller as-is.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The directory to scan does not exist.
    #[error("path not found: '{}'", path.display())]
    NotFound { path: PathBuf },

    /// The path exists but is not a directory.
    #[error("not a directory: '{}'", path.display())]
    NotADirectory { path: PathBuf },

    /// The directory (or an entry in it) could not be accessed.
    #[error("permission denied: '{}'", path.display())]
    PermissionDenied { path: PathBuf },

    /// Size lookup failed for a single entry.
    #[error("failed to read metadata for '{}': {source}", path.display())]
    MetadataUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Opening or reading a file for hashing failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The scan configuration was rejected before anything was read.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Classify an I/O error raised while touching `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }

    /// Process exit code for this error. Each kind gets its own code.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NotFound { .. } => 2,
            Self::NotADirectory { .. } => 3,
            Self::PermissionDenied { .. } => 4,
            Self::MetadataUnavailable { .. } => 5,
            Self::Io { .. } => 6,
            Self::InvalidConfig { .. } => 7,
        }
    }
}
