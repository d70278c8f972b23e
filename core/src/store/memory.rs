//! In-memory [`PathStore`] used for headless sessions and tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future;
use parking_lot::Mutex;

use crate::error::FsError;
use crate::fs::util::{basename, dirname, normalize};
use crate::types::{DirChange, FileStat};

use super::{PathStore, Result, StoreFuture, WatchRegistry, WatchSubscription};

#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, modified_ms: u64 },
    Dir { modified_ms: u64 },
}

/// Tree of nodes keyed by normalized absolute path.
#[derive(Debug)]
pub struct MemoryStore {
    nodes: Mutex<BTreeMap<String, Node>>,
    unreadable: Mutex<HashSet<String>>,
    watchers: WatchRegistry,
    read_only: AtomicBool,
    clock: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store containing only the root directory.
    pub fn new() -> Self {
        let clock = now_ms();
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir { modified_ms: clock });
        Self {
            nodes: Mutex::new(nodes),
            unreadable: Mutex::new(HashSet::new()),
            watchers: WatchRegistry::new(),
            read_only: AtomicBool::new(false),
            clock: AtomicU64::new(clock),
        }
    }

    /// Write a file, creating missing parent directories. Intended for seeding.
    pub fn seed_file(&self, path: &str, bytes: impl Into<Vec<u8>>) -> Result<()> {
        let path = normalize(path);
        self.make_dirs(&dirname(&path))?;
        let modified_ms = self.tick();
        let mut nodes = self.nodes.lock();
        if matches!(nodes.get(&path), Some(Node::Dir { .. })) {
            return Err(FsError::IsADirectory(path));
        }
        nodes.insert(path, Node::File { data: bytes.into(), modified_ms });
        Ok(())
    }

    pub fn seed_dir(&self, path: &str) -> Result<()> {
        self.make_dirs(&normalize(path))
    }

    /// Reject every mutation with a store failure, as a full or locked backend would.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Make `stat` and `read` on `path` fail while it stays listed.
    pub fn mark_unreadable(&self, path: &str) {
        self.unreadable.lock().insert(normalize(path));
    }

    /// Number of live watch subscriptions on `dir`.
    pub fn watcher_count(&self, dir: &str) -> usize {
        self.watchers.subscriber_count(dir)
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn ensure_writable(&self, path: &str) -> Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(FsError::store(path, "read-only file system"));
        }
        Ok(())
    }

    fn ensure_readable(&self, path: &str) -> Result<()> {
        if self.unreadable.lock().contains(path) {
            return Err(FsError::store(path, "permission denied"));
        }
        Ok(())
    }

    fn children(nodes: &BTreeMap<String, Node>, dir: &str) -> Vec<String> {
        let prefix = if dir == "/" { "/".to_string() } else { format!("{dir}/") };
        nodes
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter(|(path, _)| path.len() > prefix.len() && !path[prefix.len()..].contains('/'))
            .map(|(path, _)| path[prefix.len()..].to_string())
            .collect()
    }

    fn descendants(nodes: &BTreeMap<String, Node>, path: &str) -> Vec<String> {
        let prefix = format!("{path}/");
        nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn require_parent_dir(nodes: &BTreeMap<String, Node>, path: &str) -> Result<()> {
        let parent = dirname(path);
        match nodes.get(&parent) {
            Some(Node::Dir { .. }) => Ok(()),
            Some(Node::File { .. }) => Err(FsError::NotADirectory(parent)),
            None => Err(FsError::NotFound(parent)),
        }
    }

    fn do_list(&self, dir: &str) -> Result<Vec<String>> {
        let dir = normalize(dir);
        let nodes = self.nodes.lock();
        match nodes.get(&dir) {
            Some(Node::Dir { .. }) => Ok(Self::children(&nodes, &dir)),
            Some(Node::File { .. }) => Err(FsError::NotADirectory(dir)),
            None => Err(FsError::NotFound(dir)),
        }
    }

    fn do_stat(&self, path: &str) -> Result<FileStat> {
        let path = normalize(path);
        self.ensure_readable(&path)?;
        let nodes = self.nodes.lock();
        let name = basename(&path).to_string();
        match nodes.get(&path) {
            Some(Node::File { data, modified_ms }) => {
                Ok(FileStat::file(name, data.len() as u64, *modified_ms))
            }
            Some(Node::Dir { modified_ms }) => Ok(FileStat::directory(name, *modified_ms)),
            None => Err(FsError::NotFound(path)),
        }
    }

    fn do_read(&self, path: &str) -> Result<Vec<u8>> {
        let path = normalize(path);
        self.ensure_readable(&path)?;
        match self.nodes.lock().get(&path) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Dir { .. }) => Err(FsError::IsADirectory(path)),
            None => Err(FsError::NotFound(path)),
        }
    }

    fn do_write(&self, path: &str, bytes: Vec<u8>) -> Result<()> {
        let path = normalize(path);
        self.ensure_writable(&path)?;
        let modified_ms = self.tick();
        let mut nodes = self.nodes.lock();
        Self::require_parent_dir(&nodes, &path)?;
        if matches!(nodes.get(&path), Some(Node::Dir { .. })) {
            return Err(FsError::IsADirectory(path));
        }
        nodes.insert(path, Node::File { data: bytes, modified_ms });
        Ok(())
    }

    fn do_mkdir(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        self.ensure_writable(&path)?;
        let modified_ms = self.tick();
        let mut nodes = self.nodes.lock();
        if nodes.contains_key(&path) {
            return Err(FsError::Conflict(path));
        }
        Self::require_parent_dir(&nodes, &path)?;
        nodes.insert(path, Node::Dir { modified_ms });
        Ok(())
    }

    fn make_dirs(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let modified_ms = self.tick();
        let mut nodes = self.nodes.lock();
        let mut current = String::new();

        for part in path.split('/').filter(|part| !part.is_empty()) {
            current.push('/');
            current.push_str(part);
            match nodes.get(&current) {
                Some(Node::Dir { .. }) => {}
                Some(Node::File { .. }) => return Err(FsError::NotADirectory(current)),
                None => {
                    nodes.insert(current.clone(), Node::Dir { modified_ms });
                }
            }
        }
        Ok(())
    }

    fn do_delete(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        self.ensure_writable(&path)?;
        if path == "/" {
            return Err(FsError::store(path, "cannot delete the root directory"));
        }
        let mut nodes = self.nodes.lock();
        if nodes.remove(&path).is_none() {
            return Err(FsError::NotFound(path));
        }
        for child in Self::descendants(&nodes, &path) {
            nodes.remove(&child);
        }
        Ok(())
    }

    fn do_rename(&self, from: &str, to: &str) -> Result<()> {
        let from = normalize(from);
        let to = normalize(to);
        self.ensure_writable(&to)?;
        if from == to {
            return Ok(());
        }
        if to.starts_with(&format!("{from}/")) {
            return Err(FsError::store(to, "cannot move a directory into itself"));
        }

        let mut nodes = self.nodes.lock();
        if !nodes.contains_key(&from) {
            return Err(FsError::NotFound(from));
        }
        if nodes.contains_key(&to) {
            return Err(FsError::Conflict(to));
        }
        Self::require_parent_dir(&nodes, &to)?;

        let moved = Self::descendants(&nodes, &from);
        if let Some(node) = nodes.remove(&from) {
            nodes.insert(to.clone(), node);
        }
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                nodes.insert(format!("{to}{}", &old[from.len()..]), node);
            }
        }
        Ok(())
    }

    fn do_exists(&self, path: &str) -> bool {
        self.nodes.lock().contains_key(&normalize(path))
    }
}

impl PathStore for MemoryStore {
    fn list<'a>(&'a self, dir: &'a str) -> StoreFuture<'a, Vec<String>> {
        Box::pin(future::ready(self.do_list(dir)))
    }

    fn stat<'a>(&'a self, path: &'a str) -> StoreFuture<'a, FileStat> {
        Box::pin(future::ready(self.do_stat(path)))
    }

    fn read<'a>(&'a self, path: &'a str) -> StoreFuture<'a, Vec<u8>> {
        Box::pin(future::ready(self.do_read(path)))
    }

    fn write<'a>(&'a self, path: &'a str, bytes: Vec<u8>) -> StoreFuture<'a, ()> {
        Box::pin(future::ready(self.do_write(path, bytes)))
    }

    fn mkdir<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(future::ready(self.do_mkdir(path)))
    }

    fn mkdir_recursive<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        let result = self.ensure_writable(path).and_then(|()| self.make_dirs(path));
        Box::pin(future::ready(result))
    }

    fn delete<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(future::ready(self.do_delete(path)))
    }

    fn rename<'a>(&'a self, from: &'a str, to: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(future::ready(self.do_rename(from, to)))
    }

    fn exists<'a>(&'a self, path: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(future::ready(Ok(self.do_exists(path))))
    }

    fn watch(&self, dir: &str) -> WatchSubscription {
        self.watchers.subscribe(dir)
    }

    fn unwatch(&self, subscription: &WatchSubscription) {
        self.watchers.unsubscribe(subscription);
    }

    fn notify(&self, dir: &str, change: DirChange) {
        self.watchers.notify(dir, change);
    }
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn lists_direct_children_only() {
        let store = MemoryStore::new();
        store.seed_file("/Users/Public/a.txt", "a").unwrap();
        store.seed_file("/Users/Public/docs/b.txt", "b").unwrap();
        store.seed_file("/Users/Publicity.txt", "c").unwrap();

        let names = block_on(store.list("/Users/Public")).unwrap();
        assert_eq!(names, vec!["a.txt", "docs"]);
        assert_eq!(block_on(store.list("/")).unwrap(), vec!["Users"]);
        assert!(block_on(store.list("/missing")).unwrap_err().is_not_found());
    }

    #[test]
    fn rename_moves_whole_subtree() {
        let store = MemoryStore::new();
        store.seed_file("/a/inner/file.txt", "x").unwrap();
        store.seed_dir("/b").unwrap();

        block_on(store.rename("/a", "/b/a2")).unwrap();

        assert!(!block_on(store.exists("/a/inner/file.txt")).unwrap());
        assert_eq!(block_on(store.read("/b/a2/inner/file.txt")).unwrap(), b"x");
        assert!(block_on(store.rename("/b", "/b/a2/nested")).is_err());
    }

    #[test]
    fn create_unique_counts_up() {
        let store = MemoryStore::new();
        store.seed_dir("/d").unwrap();

        let first = block_on(store.create_unique("n.txt", "/d", Some(b"1".to_vec()))).unwrap();
        let second = block_on(store.create_unique("n.txt", "/d", Some(b"2".to_vec()))).unwrap();
        let third = block_on(store.create_unique("n.txt", "/d", None)).unwrap();

        assert_eq!((first.as_str(), second.as_str(), third.as_str()), ("n.txt", "n (1).txt", "n (2).txt"));
        assert!(block_on(store.stat("/d/n (2).txt")).unwrap().is_dir);
    }

    #[test]
    fn read_only_and_unreadable_fail_as_store_errors() {
        let store = MemoryStore::new();
        store.seed_file("/a.txt", "a").unwrap();
        store.mark_unreadable("/a.txt");
        assert!(matches!(block_on(store.stat("/a.txt")), Err(FsError::Store { .. })));

        store.set_read_only(true);
        assert!(matches!(block_on(store.write("/b.txt", vec![])), Err(FsError::Store { .. })));
        assert!(matches!(block_on(store.mkdir("/c")), Err(FsError::Store { .. })));
    }

    #[test]
    fn mkdir_reports_conflicts() {
        let store = MemoryStore::new();
        store.seed_dir("/photos").unwrap();
        assert!(block_on(store.mkdir("/photos")).unwrap_err().is_conflict());
        block_on(store.mkdir_recursive("/photos/2024/may")).unwrap();
        assert!(block_on(store.exists("/photos/2024")).unwrap());
    }
}
