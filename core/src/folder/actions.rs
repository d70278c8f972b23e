//! Actions on entries of a folder: rename, delete, shortcuts, archives, downloads.

use futures::FutureExt;
use futures::future::{LocalBoxFuture, join_all, try_join_all};
use tracing::{debug, info, warn};

use crate::error::FsError;
use crate::fs::archive;
use crate::fs::shortcut::{self, ShortcutKind, ShortcutRecord};
use crate::fs::util::{
    basename, dirname, extname, file_stem, join, normalize, relative, sanitize_file_name,
};
use crate::types::{ArchiveEntry, ArchiveKind, DirChange};

use super::host::DownloadLink;
use super::{FolderSync, Result};

impl FolderSync {
    /// Rename `path` to `new_name` inside this directory.
    ///
    /// Returns the new path, or `None` when the name sanitises to nothing or the
    /// destination is already taken.
    pub async fn rename(&self, path: &str, new_name: &str) -> Result<Option<String>> {
        let config = &self.ctx.config;
        let Some(clean) = sanitize_file_name(new_name, &config.invalid_file_characters) else {
            debug!(%path, new_name, "rename skipped: {}", FsError::InvalidName(new_name.into()));
            return Ok(None);
        };

        let directory = self.directory();
        let path = normalize(path);
        let target_name = if config.is_shortcut(&path) {
            format!("{clean}{}", config.shortcut_extension)
        } else {
            clean
        };
        let renamed = join(&directory, &target_name);

        if self.ctx.store.exists(&renamed).await? {
            debug!(%path, %renamed, "rename skipped: destination exists");
            return Ok(None);
        }
        match self.ctx.store.rename(&path, &renamed).await {
            Ok(()) => {}
            Err(err) if err.is_benign() => {
                warn!(%path, %renamed, error = %err, "rename lost a race");
                return Ok(None);
            }
            Err(err) => return Err(err),
        }

        let source_dir = dirname(&path);
        if source_dir == directory {
            self.notify(&directory, DirChange::renamed(basename(&path), target_name));
        } else {
            self.notify(&source_dir, DirChange::removed(basename(&path)));
            self.notify(&directory, DirChange::added(target_name));
        }
        info!(from = %path, to = %renamed, "renamed entry");
        Ok(Some(renamed))
    }

    /// Create `name` (a file when `bytes` is given, a folder otherwise) under a free name,
    /// then either start inline renaming or focus it. Returns the name used.
    pub async fn create_entry(
        &self,
        name: &str,
        bytes: Option<Vec<u8>>,
        then_rename: bool,
    ) -> Result<String> {
        let directory = self.directory();
        let unique = self.ctx.store.create_unique(name, &directory, bytes).await?;

        if !unique.contains('/') {
            self.notify(&directory, DirChange::added(unique.as_str()));
            if then_rename {
                self.ctx.host.set_renaming(&unique);
            } else {
                self.ctx.host.blur_entry(None);
                self.ctx.host.focus_entry(&unique);
            }
        }
        debug!(%directory, name = %unique, "created entry");
        Ok(unique)
    }

    /// Delete `path` and tell its parent directory. A path that is already gone is fine.
    pub async fn delete_entry(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        match self.ctx.store.delete(&path).await {
            Ok(()) => info!(%path, "deleted entry"),
            Err(err) if err.is_not_found() => debug!(%path, "delete target already gone"),
            Err(err) => return Err(err),
        }
        self.notify(&dirname(&path), DirChange::removed(basename(&path)));
        Ok(())
    }

    /// Create a link to `path` opened by `process`. Linking a link copies it.
    pub async fn create_shortcut(&self, path: &str, process: &str) -> Result<String> {
        let config = &self.ctx.config;

        if config.is_shortcut(path) {
            let contents = self.ctx.store.read(path).await?;
            return self.create_entry(basename(path), Some(contents), false).await;
        }

        let extension = extname(path).to_lowercase();
        let icon_file = if !extension.is_empty()
            && (process != config.file_explorer_process
                || config.mountable_extensions.contains(&extension))
        {
            config.icon_for_extension(&extension).to_string()
        } else {
            config.folder_icon.clone()
        };
        let record = ShortcutRecord {
            base_url: process.to_string(),
            icon_file,
            url: path.to_string(),
            kind: ShortcutKind::User,
        };
        let name =
            format!("{}{}{}", basename(path), config.shortcut_append, config.shortcut_extension);

        self.create_entry(&name, Some(shortcut::encode(&record).into_bytes()), false).await
    }

    /// Zip `paths` (folders recursively) into `<directory name>.zip` here.
    pub async fn archive(&self, paths: &[String]) -> Result<String> {
        let entries = self.collect_entries(paths).await?;
        let bytes = archive::compress(&entries)?;

        let directory = self.directory();
        let base = basename(&directory);
        let base = if base.is_empty() { self.ctx.config.archive_fallback_name.as_str() } else { base };
        let name = self.create_entry(&format!("{base}.zip"), Some(bytes), false).await?;
        info!(%directory, %name, entries = entries.len(), "created archive");
        Ok(name)
    }

    /// Unpack the archive at `path` into a new folder named after it.
    ///
    /// Returns `None` without touching anything when that folder already exists. Entries
    /// are written concurrently; a failed entry does not undo the others, and the first
    /// failure is reported once the whole batch has settled.
    pub async fn extract(&self, path: &str) -> Result<Option<String>> {
        let directory = self.directory();
        let data = self.ctx.store.read(path).await?;
        let entries = archive::decompress(&data, ArchiveKind::from_path(path))?;

        let folder_name = file_stem(path).to_string();
        let target = join(&directory, &folder_name);
        match self.ctx.store.mkdir(&target).await {
            Ok(()) => {}
            Err(err) if err.is_conflict() => {
                warn!(%target, "extraction skipped: destination folder exists");
                return Ok(None);
            }
            Err(err) => return Err(err),
        }

        let results = join_all(entries.iter().map(|entry| self.write_extracted(&target, entry))).await;
        self.notify(&directory, DirChange::added(folder_name.as_str()));

        let mut failures = results.into_iter().filter_map(|result| result.err());
        if let Some(first) = failures.next() {
            warn!(%target, failed = failures.count() + 1, "some archive entries were not extracted");
            return Err(first);
        }
        info!(%target, entries = entries.len(), "extracted archive");
        Ok(Some(folder_name))
    }

    /// Offer `paths` as a download: a lone file directly, anything else as one zip.
    /// Returns the offered file name.
    pub async fn download(&self, paths: &[String]) -> Result<String> {
        let entries = self.collect_entries(paths).await?;

        let (file_name, bytes) = match entries.as_slice() {
            [single] if !single.is_directory_marker() && !extname(&single.path).is_empty() => {
                (basename(&single.path).to_string(), single.data.clone())
            }
            _ => (self.ctx.config.download_fallback_name.clone(), archive::compress(&entries)?),
        };

        let link = self
            .ctx
            .host
            .offer_download(&file_name, &bytes)
            .map(|link| DownloadLink::new(self.ctx.host.clone(), link));
        let previous = std::mem::replace(&mut self.state.lock().download, link);
        drop(previous);

        info!(%file_name, size = bytes.len(), "offered download");
        Ok(file_name)
    }

    /// Expand `paths` into archive entries relative to each path's parent.
    async fn collect_entries(&self, paths: &[String]) -> Result<Vec<ArchiveEntry>> {
        let nested = try_join_all(paths.iter().map(|path| {
            let path = normalize(path);
            let root = dirname(&path);
            self.expand(path, root)
        }))
        .await?;
        Ok(nested.into_iter().flatten().collect())
    }

    fn expand<'a>(&'a self, path: String, root: String) -> LocalBoxFuture<'a, Result<Vec<ArchiveEntry>>> {
        async move {
            let store = &self.ctx.store;
            let stat = match store.stat(&path).await {
                Ok(stat) => stat,
                Err(err) if err.is_not_found() => return Ok(Vec::new()),
                Err(err) => return Err(err),
            };
            let member = relative(&root, &path);

            if !stat.is_dir {
                return match store.read(&path).await {
                    Ok(data) => Ok(vec![ArchiveEntry::file(member, data)]),
                    Err(err) if err.is_not_found() => Ok(Vec::new()),
                    Err(err) => Err(err),
                };
            }

            let children = store.list(&path).await?;
            if children.is_empty() {
                return Ok(vec![ArchiveEntry::directory(member)]);
            }
            let nested = try_join_all(
                children.iter().map(|child| self.expand(join(&path, child), root.clone())),
            )
            .await?;
            Ok(nested.into_iter().flatten().collect())
        }
        .boxed_local()
    }

    async fn write_extracted(&self, target: &str, entry: &ArchiveEntry) -> Result<()> {
        let store = &self.ctx.store;
        let local = join(target, &entry.path);

        if entry.is_directory_marker() {
            return store.mkdir_recursive(&local).await;
        }

        let parent = dirname(&local);
        if !store.exists(&parent).await? {
            store.mkdir_recursive(&parent).await?;
        }
        store.write(&local, entry.data.clone()).await
    }
}
