//! Pure helpers over paths and file contents: naming, archives, link files, ordering.

pub mod archive;
pub mod shortcut;
pub mod sort;
pub mod util;

pub use archive::{compress, decompress};
pub use shortcut::{ShortcutKind, ShortcutRecord};
pub use sort::{SortReconciliation, reconcile_sort_order, sort_contents};
pub use util::{basename, dirname, extname, join, natural_cmp_name, normalize};

/// Shared result type for fs operations.
pub type Result<T> = crate::Result<T>;
