#![allow(dead_code)]

use std::sync::Arc;

use futures::channel::oneshot;
use parking_lot::Mutex;
use webdesk_core::folder::{FolderContext, FolderHost, Listing};
use webdesk_core::store::{StoreFuture, WatchSubscription};
use webdesk_core::{DirChange, FileStat, MemorySortOrders, MemoryStore, PathStore};

/// Host that records every callback it receives.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub blurred: Mutex<Vec<Option<String>>>,
    pub focused: Mutex<Vec<String>>,
    pub renaming: Mutex<Vec<String>>,
    pub closed: Mutex<Vec<String>>,
    pub listings: Mutex<Vec<(String, Vec<String>)>>,
    pub offered: Mutex<Vec<(String, Vec<u8>)>>,
    pub revoked: Mutex<Vec<String>>,
}

impl FolderHost for RecordingHost {
    fn blur_entry(&self, name: Option<&str>) {
        self.blurred.lock().push(name.map(str::to_string));
    }

    fn focus_entry(&self, name: &str) {
        self.focused.lock().push(name.to_string());
    }

    fn set_renaming(&self, name: &str) {
        self.renaming.lock().push(name.to_string());
    }

    fn close_views_for(&self, dir: &str) {
        self.closed.lock().push(dir.to_string());
    }

    fn listing_changed(&self, dir: &str, listing: &Listing) {
        self.listings.lock().push((dir.to_string(), listing.names()));
    }

    fn offer_download(&self, file_name: &str, bytes: &[u8]) -> Option<String> {
        let mut offered = self.offered.lock();
        offered.push((file_name.to_string(), bytes.to_vec()));
        Some(format!("blob:{}", offered.len()))
    }

    fn revoke_download(&self, link: &str) {
        self.revoked.lock().push(link.to_string());
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub sort_orders: Arc<MemorySortOrders>,
    pub host: Arc<RecordingHost>,
    pub ctx: FolderContext,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    harness_with(store.clone(), store)
}

/// Harness whose folder views talk to `backend`, while `store` stays reachable for seeding.
pub fn harness_with(store: Arc<MemoryStore>, backend: Arc<dyn PathStore>) -> Harness {
    let sort_orders = Arc::new(MemorySortOrders::new());
    let host = Arc::new(RecordingHost::default());
    let ctx = FolderContext::new(backend, sort_orders.clone(), host.clone());
    Harness { store, sort_orders, host, ctx }
}

/// Store whose first `list` call waits until the gate is opened.
#[derive(Debug)]
pub struct GatedStore {
    inner: Arc<MemoryStore>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryStore>) -> (Self, oneshot::Sender<()>) {
        let (open, gate) = oneshot::channel();
        (Self { inner, gate: Mutex::new(Some(gate)) }, open)
    }
}

impl PathStore for GatedStore {
    fn list<'a>(&'a self, dir: &'a str) -> StoreFuture<'a, Vec<String>> {
        let gate = self.gate.lock().take();
        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.inner.list(dir).await
        })
    }

    fn stat<'a>(&'a self, path: &'a str) -> StoreFuture<'a, FileStat> {
        self.inner.stat(path)
    }

    fn read<'a>(&'a self, path: &'a str) -> StoreFuture<'a, Vec<u8>> {
        self.inner.read(path)
    }

    fn write<'a>(&'a self, path: &'a str, bytes: Vec<u8>) -> StoreFuture<'a, ()> {
        self.inner.write(path, bytes)
    }

    fn mkdir<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        self.inner.mkdir(path)
    }

    fn mkdir_recursive<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        self.inner.mkdir_recursive(path)
    }

    fn delete<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        self.inner.delete(path)
    }

    fn rename<'a>(&'a self, from: &'a str, to: &'a str) -> StoreFuture<'a, ()> {
        self.inner.rename(from, to)
    }

    fn exists<'a>(&'a self, path: &'a str) -> StoreFuture<'a, bool> {
        self.inner.exists(path)
    }

    fn watch(&self, dir: &str) -> WatchSubscription {
        self.inner.watch(dir)
    }

    fn unwatch(&self, subscription: &WatchSubscription) {
        self.inner.unwatch(subscription)
    }

    fn notify(&self, dir: &str, change: DirChange) {
        self.inner.notify(dir, change)
    }
}
