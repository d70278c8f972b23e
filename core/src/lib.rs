//! Core of a browser-style desktop: an in-process file store and live folder views over it.

#![deny(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod folder;
pub mod fs;
pub mod log;
pub mod store;
pub mod types;

pub type Result<T> = std::result::Result<T, FsError>;

pub use config::FolderConfig;
pub use error::FsError;
pub use folder::{Clipboard, FolderContext, FolderHost, FolderOptions, FolderSync, Listing, NoopHost};
pub use store::{MemorySortOrders, MemoryStore, PathStore, SortOrderStore};
pub use types::{ArchiveEntry, ArchiveKind, DirChange, FileStat, FolderPhase, PasteOp, SortBy};

/// Returns the version of the core crate for diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_semver_version() {
        assert!(version().contains('.'));
    }
}
