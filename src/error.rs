//! Error types for thumbcask
//!
//! All modules use `ThumbResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for thumbcask operations
pub type ThumbResult<T> = Result<T, ThumbError>;

/// All errors that can occur in thumbcask
#[derive(Error, Debug)]
pub enum ThumbError {
    // Identity errors
    #[error("cannot resolve modification time for non-local source: {uri}")]
    UnresolvableMtime { uri: String },

    #[error("source not readable: {path}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a representable local path: {0}")]
    PathInvalid(PathBuf),

    // Artifact metadata errors
    #[error("artifact metadata unreadable at {path}: {reason}")]
    MetadataCorrupt { path: PathBuf, reason: String },

    #[error("failed to write artifact metadata at {path}: {reason}")]
    MetadataWrite { path: PathBuf, reason: String },

    // Configuration errors
    #[error("invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Storage errors: directory creation, temp staging, rename. These
    // propagate unmasked; retrying cannot recover a full disk.
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl ThumbError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a metadata-corrupt error
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MetadataCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means "the cache entry is unusable" rather than
    /// "the operation failed". Lookups swallow these and report a miss.
    pub fn is_entry_invalid(&self) -> bool {
        matches!(self, Self::MetadataCorrupt { .. })
    }
}
