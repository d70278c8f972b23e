//! Live view of one directory: listing reconciliation plus file and folder actions.
//!
//! A [`FolderSync`] keeps a [`Listing`] consistent with a [`PathStore`]. Full refreshes
//! rebuild it, watch notifications patch it one entry at a time, and the persisted sort
//! order is reconciled after every change so renamed entries keep their slot.
//!
//! Every refresh or point update is tagged with the directory and generation it started
//! under. When the view moves to another directory (or is reset) while a store call is
//! in flight, the late result no longer matches and is dropped instead of committed.

mod actions;
pub mod clipboard;
pub mod host;
pub mod listing;
mod paste;

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::FolderConfig;
use crate::fs::shortcut::{self, ShortcutKind};
use crate::fs::sort::{self, SortReconciliation, sort_contents};
use crate::fs::util::{basename, join, normalize};
use crate::store::{PathStore, SortOrderStore, WatchSubscription};
use crate::types::{DirChange, FileStat, FolderPhase, SortBy};

pub use clipboard::Clipboard;
pub use host::{DownloadLink, FolderHost, NoopHost};
pub use listing::Listing;

/// Shared result type for folder operations.
pub type Result<T> = crate::Result<T>;

/// Collaborators shared by every folder view of a session.
#[derive(Clone)]
pub struct FolderContext {
    pub store: Arc<dyn PathStore>,
    pub sort_orders: Arc<dyn SortOrderStore>,
    pub host: Arc<dyn FolderHost>,
    pub clipboard: Arc<Clipboard>,
    pub config: Arc<FolderConfig>,
}

impl FolderContext {
    /// Context with an empty clipboard and the default configuration.
    pub fn new(
        store: Arc<dyn PathStore>,
        sort_orders: Arc<dyn SortOrderStore>,
        host: Arc<dyn FolderHost>,
    ) -> Self {
        Self {
            store,
            sort_orders,
            host,
            clipboard: Arc::new(Clipboard::new()),
            config: Arc::new(FolderConfig::default()),
        }
    }

    pub fn with_clipboard(mut self, clipboard: Arc<Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_config(mut self, config: FolderConfig) -> Self {
        self.config = Arc::new(config);
        self
    }
}

impl fmt::Debug for FolderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolderContext")
            .field("clipboard", &self.clipboard)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Per-view switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct FolderOptions {
    /// Leave directories out of the listing.
    pub hide_folders: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    directory: String,
    generation: u64,
}

#[derive(Debug)]
struct FolderState {
    directory: String,
    generation: u64,
    phase: FolderPhase,
    listing: Option<Listing>,
    watch: Option<WatchSubscription>,
    download: Option<DownloadLink>,
}

/// Observable listing and file operations for one directory.
pub struct FolderSync {
    ctx: FolderContext,
    options: FolderOptions,
    state: Mutex<FolderState>,
}

impl fmt::Debug for FolderSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolderSync")
            .field("options", &self.options)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl FolderSync {
    /// Open a view on `directory` and subscribe to its changes. Nothing is listed until
    /// [`sync`](Self::sync) or [`refresh`](Self::refresh) runs.
    pub fn new(directory: &str, ctx: FolderContext, options: FolderOptions) -> Self {
        let directory = normalize(directory);
        let watch = ctx.store.watch(&directory);
        Self {
            ctx,
            options,
            state: Mutex::new(FolderState {
                directory,
                generation: 0,
                phase: FolderPhase::Uninitialized,
                listing: None,
                watch: Some(watch),
                download: None,
            }),
        }
    }

    pub fn context(&self) -> &FolderContext {
        &self.ctx
    }

    pub fn directory(&self) -> String {
        self.state.lock().directory.clone()
    }

    pub fn phase(&self) -> FolderPhase {
        self.state.lock().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase() != FolderPhase::Ready
    }

    /// Current listing; empty until the first refresh commits.
    pub fn listing(&self) -> Listing {
        self.state.lock().listing.clone().unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.state.lock().listing.as_ref().map(Listing::names).unwrap_or_default()
    }

    /// Point the view at another directory. A different path discards the listing and
    /// moves the watch subscription; the next [`sync`](Self::sync) reloads.
    pub fn set_directory(&self, directory: &str) {
        let directory = normalize(directory);
        if self.state.lock().directory == directory {
            return;
        }

        let watch = self.ctx.store.watch(&directory);
        let previous = {
            let mut state = self.state.lock();
            state.directory = directory.clone();
            state.generation += 1;
            state.phase = FolderPhase::Loading;
            state.listing = None;
            state.watch.replace(watch)
        };
        if let Some(previous) = previous {
            self.ctx.store.unwatch(&previous);
        }
        debug!(%directory, "folder view switched directory");
    }

    /// Drop the listing so the next [`sync`](Self::sync) performs a full refresh.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.phase = FolderPhase::Loading;
        state.listing = None;
    }

    /// Load the directory if nothing is listed yet, otherwise reconcile the sort order.
    pub async fn sync(&self) -> Result<()> {
        let (loaded, directory) = {
            let state = self.state.lock();
            (state.listing.is_some(), state.directory.clone())
        };

        if loaded {
            self.reconcile_sort_order();
        } else {
            let order = self.ctx.sort_orders.get(&directory);
            self.refresh(order).await?;
        }
        Ok(())
    }

    /// Rescan the whole directory.
    ///
    /// Returns `false` when the result was discarded because the view changed directory
    /// while the scan was running.
    pub async fn refresh(&self, custom_order: Option<Vec<String>>) -> Result<bool> {
        let tag = self.begin_loading();
        let directory = tag.directory.as_str();

        let names = match self.ctx.store.list(directory).await {
            Ok(names) => names,
            Err(err) if err.is_not_found() => {
                if self.commit(&tag, Listing::new()) {
                    debug!(%directory, "directory vanished, closing its views");
                    self.ctx.host.close_views_for(directory);
                }
                return Ok(self.is_current(&tag));
            }
            Err(err) => {
                self.finish_loading(&tag);
                return Err(err);
            }
        };

        let visible: Vec<String> = names
            .into_iter()
            .filter(|name| !self.ctx.config.is_system_entry(directory, name))
            .collect();
        let stats = join_all(visible.iter().map(|name| self.stat_entry(directory, name))).await;

        let entries: Vec<(String, FileStat)> = visible
            .into_iter()
            .zip(stats)
            .filter_map(|(name, stat)| match stat {
                Ok(stat) if self.options.hide_folders && stat.is_dir => None,
                Ok(stat) => Some((name, stat)),
                Err(err) => {
                    warn!(%directory, %name, error = %err, "skipping entry that could not be read");
                    None
                }
            })
            .collect();

        let order = custom_order.unwrap_or_else(|| self.names());
        let listing: Listing = sort_contents(entries, &order).into_iter().collect();
        if !self.is_current(&tag) {
            debug!(%directory, "discarding stale refresh");
            return Ok(false);
        }

        if !listing.is_empty() {
            self.ctx.sort_orders.set(directory, listing.names());
        }
        Ok(self.commit(&tag, listing))
    }

    /// Patch the listing for one change notification without rescanning.
    ///
    /// A removal is only honoured once the old name is really gone from the store. With
    /// both names present it is a rename and the entry keeps its position. With neither,
    /// the directory is refreshed.
    pub async fn apply_point_update(&self, added: Option<&str>, removed: Option<&str>) -> Result<()> {
        let tag = self.tag();
        let directory = tag.directory.as_str();

        if let Some(removed) = removed {
            let old_name = basename(removed).to_string();
            if self.ctx.store.exists(&join(directory, &old_name)).await? {
                return Ok(());
            }

            let changed = match added {
                Some(added) => {
                    let new_name = basename(added).to_string();
                    self.mutate(&tag, |listing| {
                        listing.relabel(&old_name, &new_name);
                    })
                }
                None => {
                    let removed = self.mutate(&tag, |listing| {
                        listing.remove(&old_name);
                    });
                    if removed {
                        self.ctx.host.blur_entry(Some(&old_name));
                    }
                    removed
                }
            };
            if changed {
                self.settle_sort_order(&tag);
            }
            return Ok(());
        }

        let Some(added) = added else {
            return self.refresh(None).await.map(|_| ());
        };

        let name = basename(added).to_string();
        if self.ctx.config.is_system_entry(directory, &name) {
            return Ok(());
        }
        let stat = match self.stat_entry(directory, &name).await {
            Ok(stat) => stat,
            Err(err) if err.is_not_found() => {
                debug!(%directory, %name, "added entry vanished before it could be read");
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        if self.options.hide_folders && stat.is_dir {
            return Ok(());
        }

        if self.mutate(&tag, |listing| listing.upsert(name, stat)) {
            self.settle_sort_order(&tag);
        }
        Ok(())
    }

    /// Apply every queued watch notification. Returns how many were applied.
    pub async fn process_pending_changes(&self) -> Result<usize> {
        let mut applied = 0;
        loop {
            let change = {
                let mut state = self.state.lock();
                state.watch.as_mut().and_then(WatchSubscription::try_next_change)
            };
            let Some(DirChange { added, removed }) = change else {
                break;
            };
            self.apply_point_update(added.as_deref(), removed.as_deref()).await?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Compare the listing with the persisted order and act on the difference.
    pub fn reconcile_sort_order(&self) -> SortReconciliation {
        let tag = self.tag();
        let Some(names) = self.state.lock().listing.as_ref().map(Listing::names) else {
            return SortReconciliation::Structural;
        };
        let Some(persisted) = self.ctx.sort_orders.get(&tag.directory) else {
            return SortReconciliation::Structural;
        };

        let outcome = sort::reconcile_sort_order(&names, &persisted);
        match &outcome {
            SortReconciliation::Rename { from, to, order } => {
                debug!(directory = %tag.directory, %from, %to, "keeping sort position across rename");
                self.ctx.sort_orders.set(&tag.directory, order.clone());
            }
            SortReconciliation::Reorder => {
                self.mutate(&tag, |listing| {
                    let entries = std::mem::take(listing).into_entries();
                    *listing = sort_contents(entries, &persisted).into_iter().collect();
                });
            }
            SortReconciliation::InSync | SortReconciliation::Structural => {}
        }
        outcome
    }

    /// Reorder by a column (folders always first) and persist the result.
    pub fn sort_by(&self, key: SortBy, ascending: bool) {
        let tag = self.tag();
        let mut names = Vec::new();
        self.mutate(&tag, |listing| {
            let entries = std::mem::take(listing).into_entries();
            *listing = sort::sort_by(entries, key, ascending).into_iter().collect();
            names = listing.names();
        });
        if !names.is_empty() {
            self.ctx.sort_orders.set(&tag.directory, names);
        }
    }

    /// Reconcile after a point update. A membership change has no persisted slot to
    /// keep, so the listing's order becomes the persisted one.
    fn settle_sort_order(&self, tag: &Tag) {
        if self.reconcile_sort_order() != SortReconciliation::Structural {
            return;
        }
        let names = {
            let state = self.state.lock();
            if state.generation != tag.generation || state.directory != tag.directory {
                return;
            }
            state.listing.as_ref().map(Listing::names).unwrap_or_default()
        };
        if !names.is_empty() {
            debug!(directory = %tag.directory, entries = names.len(), "persisting order after membership change");
            self.ctx.sort_orders.set(&tag.directory, names);
        }
    }

    async fn stat_entry(&self, directory: &str, name: &str) -> Result<FileStat> {
        let path = join(directory, name);
        let mut stat = self.ctx.store.stat(&path).await?;
        stat.name = name.to_string();

        if !stat.is_dir && self.ctx.config.is_shortcut(name) {
            let contents = self.ctx.store.read(&path).await?;
            let record = shortcut::decode_bytes(&contents, &self.ctx.config.system_processes);
            stat.system_shortcut = record.kind == ShortcutKind::System;
        }
        Ok(stat)
    }

    fn notify(&self, dir: &str, change: DirChange) {
        self.ctx.store.notify(dir, change);
    }

    fn tag(&self) -> Tag {
        let state = self.state.lock();
        Tag { directory: state.directory.clone(), generation: state.generation }
    }

    fn is_current(&self, tag: &Tag) -> bool {
        let state = self.state.lock();
        state.generation == tag.generation && state.directory == tag.directory
    }

    fn begin_loading(&self) -> Tag {
        let mut state = self.state.lock();
        state.phase = FolderPhase::Loading;
        Tag { directory: state.directory.clone(), generation: state.generation }
    }

    fn finish_loading(&self, tag: &Tag) {
        let mut state = self.state.lock();
        if state.generation == tag.generation && state.directory == tag.directory {
            state.phase = FolderPhase::Ready;
        }
    }

    /// Replace the listing if `tag` is still current.
    fn commit(&self, tag: &Tag, listing: Listing) -> bool {
        {
            let mut state = self.state.lock();
            if state.generation != tag.generation || state.directory != tag.directory {
                return false;
            }
            state.listing = Some(listing.clone());
            state.phase = FolderPhase::Ready;
        }
        self.ctx.host.listing_changed(&tag.directory, &listing);
        true
    }

    /// Edit a loaded listing if `tag` is still current. Unloaded views are left alone.
    fn mutate(&self, tag: &Tag, edit: impl FnOnce(&mut Listing)) -> bool {
        let snapshot = {
            let mut state = self.state.lock();
            if state.generation != tag.generation || state.directory != tag.directory {
                return false;
            }
            let Some(listing) = state.listing.as_mut() else {
                return false;
            };
            edit(listing);
            listing.clone()
        };
        self.ctx.host.listing_changed(&tag.directory, &snapshot);
        true
    }
}

impl Drop for FolderSync {
    fn drop(&mut self) {
        if let Some(watch) = self.state.get_mut().watch.take() {
            self.ctx.store.unwatch(&watch);
        }
    }
}
