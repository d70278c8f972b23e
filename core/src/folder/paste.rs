//! Paste from the shared clipboard and drop-in of external files.

use futures::FutureExt;
use futures::future::{LocalBoxFuture, join_all};
use tracing::{debug, info, warn};

use crate::fs::util::{basename, dirname, iterate_name, join, normalize};
use crate::types::{DirChange, PasteOp};

use super::{FolderSync, Result};

impl FolderSync {
    /// Paste the clipboard into this directory. Returns the names created here.
    ///
    /// Cut entries are moved and the clipboard is emptied; copied entries are duplicated
    /// recursively and stay on the clipboard. Every entry is attempted; the first failure
    /// is returned after the rest have settled.
    pub async fn paste_from_clipboard(&self) -> Result<Vec<String>> {
        let entries = self.ctx.clipboard.take_for_paste();
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let directory = self.directory();

        let results = join_all(entries.iter().map(|(path, op)| {
            let directory = directory.as_str();
            async move {
                match op {
                    PasteOp::Move => self.move_into(path, directory).await,
                    PasteOp::Copy => self.copy_into(path.clone(), directory.to_string()).await.map(Some),
                }
            }
        }))
        .await;

        let mut pasted = Vec::new();
        let mut first_error = None;
        for result in results {
            match result {
                Ok(Some(name)) => {
                    self.notify(&directory, DirChange::added(name.as_str()));
                    pasted.push(name);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(%directory, error = %err, "paste entry failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }
        info!(%directory, count = pasted.len(), "pasted entries");
        Ok(pasted)
    }

    /// Write externally supplied files into this directory under free names.
    pub async fn add_to_folder(&self, files: Vec<(String, Vec<u8>)>) -> Result<Vec<String>> {
        let mut added = Vec::with_capacity(files.len());
        for (name, bytes) in files {
            added.push(self.create_entry(basename(&name), Some(bytes), false).await?);
        }
        Ok(added)
    }

    /// Move `path` into `directory`. `None` when the move would be a no-op or would put
    /// a folder inside itself.
    async fn move_into(&self, path: &str, directory: &str) -> Result<Option<String>> {
        let path = normalize(path);
        let source_dir = dirname(&path);
        if source_dir == directory || directory == path || directory.starts_with(&format!("{path}/")) {
            debug!(%path, %directory, "skipping move onto itself");
            return Ok(None);
        }

        let store = &self.ctx.store;
        let original = basename(&path).to_string();
        let mut name = original.clone();
        let mut iteration = 0;
        while store.exists(&join(directory, &name)).await? {
            iteration += 1;
            name = iterate_name(&original, iteration);
        }

        store.rename(&path, &join(directory, &name)).await?;
        self.notify(&source_dir, DirChange::removed(original));
        Ok(Some(name))
    }

    /// Copy `path` into `base` under a free name and return that name.
    ///
    /// A folder's children are listed before its copy is created, so pasting a folder
    /// into itself copies only what was there beforehand. Children are copied
    /// concurrently; one failing child does not stop its siblings.
    fn copy_into<'a>(&'a self, path: String, base: String) -> LocalBoxFuture<'a, Result<String>> {
        async move {
            let store = &self.ctx.store;
            let stat = store.stat(&path).await?;
            let name = basename(&path);

            if !stat.is_dir {
                let data = store.read(&path).await?;
                return store.create_unique(name, &base, Some(data)).await;
            }

            let children = store.list(&path).await?;
            let created = store.create_unique(name, &base, None).await?;
            let target = join(&base, &created);
            let copies = join_all(
                children.iter().map(|child| self.copy_into(join(&path, child), target.clone())),
            )
            .await;
            if let Some(err) = copies.into_iter().find_map(|copy| copy.err()) {
                return Err(err);
            }
            Ok(created)
        }
        .boxed_local()
    }
}
