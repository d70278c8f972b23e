//! Per-directory change subscriptions delivered over channels.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::StreamExt;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use parking_lot::Mutex;

use crate::fs::util::normalize;
use crate::types::DirChange;

/// Receiving end of a directory watch.
#[derive(Debug)]
pub struct WatchSubscription {
    id: u64,
    directory: String,
    events: UnboundedReceiver<DirChange>,
}

impl WatchSubscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Next queued change, if one is ready. Never waits.
    pub fn try_next_change(&mut self) -> Option<DirChange> {
        self.events.next().now_or_never().flatten()
    }

    /// Wait for the next change; `None` once the store dropped the subscription.
    pub async fn next_change(&mut self) -> Option<DirChange> {
        self.events.next().await
    }
}

/// Subscription bookkeeping a [`PathStore`](super::PathStore) can embed.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    next_id: AtomicU64,
    watchers: Mutex<HashMap<String, Vec<(u64, UnboundedSender<DirChange>)>>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, dir: &str) -> WatchSubscription {
        let directory = normalize(dir);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, events) = unbounded();
        self.watchers.lock().entry(directory.clone()).or_default().push((id, sender));
        WatchSubscription { id, directory, events }
    }

    pub fn unsubscribe(&self, subscription: &WatchSubscription) {
        let mut watchers = self.watchers.lock();
        if let Some(senders) = watchers.get_mut(&subscription.directory) {
            senders.retain(|(id, _)| *id != subscription.id);
            if senders.is_empty() {
                watchers.remove(&subscription.directory);
            }
        }
    }

    /// Fan `change` out to live subscribers of `dir`, pruning closed ones.
    pub fn notify(&self, dir: &str, change: DirChange) {
        let directory = normalize(dir);
        let mut watchers = self.watchers.lock();
        if let Some(senders) = watchers.get_mut(&directory) {
            senders.retain(|(_, sender)| sender.unbounded_send(change.clone()).is_ok());
            if senders.is_empty() {
                watchers.remove(&directory);
            }
        }
    }

    pub fn subscriber_count(&self, dir: &str) -> usize {
        self.watchers.lock().get(&normalize(dir)).map(Vec::len).unwrap_or(0)
    }
}
