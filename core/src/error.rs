//! Error taxonomy shared by the store contract, the codecs, and folder actions.

use thiserror::Error;

/// Failure raised by a [`PathStore`](crate::store::PathStore) call or a folder action.
#[derive(Debug, Error)]
pub enum FsError {
    /// The target vanished, usually because another view mutated the store first.
    #[error("no such file or directory: {0}")]
    NotFound(String),
    /// The destination already exists.
    #[error("file already exists: {0}")]
    Conflict(String),
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),
    #[error("unsupported archive format: {0}")]
    UnsupportedArchive(String),
    /// Name sanitisation left nothing usable.
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("is a directory: {0}")]
    IsADirectory(String),
    /// Permission, quota, or backend failure reported by the store.
    #[error("store failure at {path}: {reason}")]
    Store { path: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FsError {
    pub fn store(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Store { path: path.into(), reason: reason.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Conditions folder actions resolve internally instead of reporting to the UI.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Conflict(_) | Self::InvalidName(_))
    }
}
