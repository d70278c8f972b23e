//! Storage contracts consumed by folder views, plus in-memory and JSON-backed implementations.

pub mod memory;
pub mod sort_order;
pub mod watch;

use futures::future::LocalBoxFuture;

use crate::fs::util::{iterate_name, join};
use crate::types::{DirChange, FileStat};

pub use memory::MemoryStore;
pub use sort_order::{JsonSortOrders, MemorySortOrders, SortOrderStore};
pub use watch::{WatchRegistry, WatchSubscription};

/// Shared result type for store operations.
pub type Result<T> = crate::Result<T>;

/// Boxed future returned by [`PathStore`] operations.
pub type StoreFuture<'a, T> = LocalBoxFuture<'a, Result<T>>;

/// Hierarchical byte store addressed by absolute POSIX-style paths.
///
/// Missing targets fail with [`FsError::NotFound`](crate::FsError::NotFound) and occupied
/// destinations with [`FsError::Conflict`](crate::FsError::Conflict).
pub trait PathStore {
    /// Base names of the direct children of `dir`.
    fn list<'a>(&'a self, dir: &'a str) -> StoreFuture<'a, Vec<String>>;

    fn stat<'a>(&'a self, path: &'a str) -> StoreFuture<'a, FileStat>;

    fn read<'a>(&'a self, path: &'a str) -> StoreFuture<'a, Vec<u8>>;

    /// Create or overwrite a file. The parent directory must exist.
    fn write<'a>(&'a self, path: &'a str, bytes: Vec<u8>) -> StoreFuture<'a, ()>;

    /// Create a single directory; fails with `Conflict` when the path is taken.
    fn mkdir<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()>;

    /// Create `path` and any missing ancestors. Existing directories are fine.
    fn mkdir_recursive<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()>;

    /// Remove a file or a directory tree.
    fn delete<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()>;

    fn rename<'a>(&'a self, from: &'a str, to: &'a str) -> StoreFuture<'a, ()>;

    fn exists<'a>(&'a self, path: &'a str) -> StoreFuture<'a, bool>;

    /// Create `name` under `dir`, suffixing ` (n)` before the extension until the name is
    /// free. Writes `bytes` as a file, or creates a directory when `bytes` is `None`.
    /// Returns the name that was used, relative to `dir`.
    fn create_unique<'a>(
        &'a self,
        name: &'a str,
        dir: &'a str,
        bytes: Option<Vec<u8>>,
    ) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let mut iteration = 0u32;
            loop {
                let candidate =
                    if iteration == 0 { name.to_string() } else { iterate_name(name, iteration) };
                let path = join(dir, &candidate);
                iteration += 1;

                if self.exists(&path).await? {
                    continue;
                }
                let created = match &bytes {
                    Some(data) => self.write(&path, data.clone()).await,
                    None => self.mkdir(&path).await,
                };
                match created {
                    Ok(()) => return Ok(candidate),
                    Err(err) if err.is_conflict() => continue,
                    Err(err) => return Err(err),
                }
            }
        })
    }

    /// Subscribe to [`DirChange`] notifications for `dir`.
    fn watch(&self, dir: &str) -> WatchSubscription;

    fn unwatch(&self, subscription: &WatchSubscription);

    /// Deliver `change` to every subscription on `dir`.
    fn notify(&self, dir: &str, change: DirChange);
}
