use std::path::PathBuf;

use thiserror::Error;

use crate::record::RecordKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Version library format {version} is not supported (supported: {min}..={max})")]
    UnsupportedFormatVersion { version: i32, min: i32, max: i32 },

    #[error("A {kind} with identifier {id} is already registered")]
    DuplicateIdentifier { kind: RecordKind, id: u64 },

    #[error(
        "Version library alias depth exceeded ({depth}) while loading {}; this could indicate infinite alias recursion",
        path.display()
    )]
    AliasRecursionExceeded { depth: u32, path: PathBuf },

    #[error("Unable to resolve alias of {}: {reason}", path.display())]
    AliasSubstitutionFailed { path: PathBuf, reason: String },

    #[error(
        "Object with version independent id `{id}` was not found in version library! This usually means plugin must be updated by author"
    )]
    NotFound { id: u64 },

    #[error(
        "Object with version independent id `{id}` did not match specified byte pattern! This usually means plugin must be updated by author"
    )]
    VersionMismatch { id: u64 },

    #[error("Failed to dereference pointer at {address:#x} while resolving id `{id}`: {message}")]
    PointerDereferenceFailure {
        id: u64,
        address: u64,
        message: String,
    },

    #[error("Failed to read memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Invalid byte pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid build version: {0}")]
    InvalidVersion(String),

    #[error("Malformed version library: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error means "the thing asked for does not exist"
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Check if this error signals that the loaded build does not match the plugin
    pub fn is_version_mismatch(&self) -> bool {
        matches!(
            self,
            Error::VersionMismatch { .. } | Error::UnsupportedFormatVersion { .. }
        )
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::Malformed(message.into())
    }
}
