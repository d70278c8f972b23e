//! Shared data structures exchanged between the store, the codecs, and folder views.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Attributes of a single node as seen by a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
    pub modified_ms: u64,
    /// Set when the node is a link file pointing at a built-in application.
    #[serde(default)]
    pub system_shortcut: bool,
}

impl FileStat {
    pub fn file(name: impl Into<String>, size: u64, modified_ms: u64) -> Self {
        Self { name: name.into(), size, is_dir: false, modified_ms, system_shortcut: false }
    }

    pub fn directory(name: impl Into<String>, modified_ms: u64) -> Self {
        Self { name: name.into(), size: 0, is_dir: true, modified_ms, system_shortcut: false }
    }
}

/// One member of an archive: a relative path and its bytes.
///
/// Empty directories travel as a path ending in `/` with no data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn file(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self { path: path.into(), data: data.into() }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.ends_with('/') {
            path.push('/');
        }
        Self { path, data: Vec::new() }
    }

    pub fn is_directory_marker(&self) -> bool {
        self.data.is_empty() && self.path.ends_with('/')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Rar,
}

impl ArchiveKind {
    /// Pick the decoder for an archive path. Anything that is not `.rar` is read as zip.
    pub fn from_path(path: &str) -> Self {
        match Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_ascii_lowercase())
        {
            Some(ref ext) if ext == "rar" => ArchiveKind::Rar,
            _ => ArchiveKind::Zip,
        }
    }
}

/// Change notification delivered to watchers of a directory.
///
/// Both names are base names inside the watched directory. `added` alone is a
/// new entry, `removed` alone a deletion, and both together a rename.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirChange {
    pub added: Option<String>,
    pub removed: Option<String>,
}

impl DirChange {
    pub fn added(name: impl Into<String>) -> Self {
        Self { added: Some(name.into()), removed: None }
    }

    pub fn removed(name: impl Into<String>) -> Self {
        Self { added: None, removed: Some(name.into()) }
    }

    pub fn renamed(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { added: Some(to.into()), removed: Some(from.into()) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PasteOp {
    Copy,
    Move,
}

/// Lifecycle of a folder view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderPhase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

/// Column used by an explicit "sort by" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Name,
    Size,
    Date,
    Type,
}
