//! Callbacks into the UI layer that renders folder views.

use std::fmt;
use std::sync::Arc;

use super::listing::Listing;

/// UI collaborator driven by [`FolderSync`](super::FolderSync). Every hook defaults to a no-op.
pub trait FolderHost {
    /// Drop focus from `name`, or from every entry when `None`.
    fn blur_entry(&self, _name: Option<&str>) {}

    fn focus_entry(&self, _name: &str) {}

    /// Put `name` into inline rename mode.
    fn set_renaming(&self, _name: &str) {}

    /// `dir` disappeared from the store; close windows showing it.
    fn close_views_for(&self, _dir: &str) {}

    fn listing_changed(&self, _dir: &str, _listing: &Listing) {}

    /// Hand bytes to the user as a download. Returns a link handle to revoke later.
    fn offer_download(&self, _file_name: &str, _bytes: &[u8]) -> Option<String> {
        None
    }

    fn revoke_download(&self, _link: &str) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHost;

impl FolderHost for NoopHost {}

/// Download link revoked when dropped.
pub struct DownloadLink {
    host: Arc<dyn FolderHost>,
    link: String,
}

impl DownloadLink {
    pub fn new(host: Arc<dyn FolderHost>, link: String) -> Self {
        Self { host, link }
    }

    pub fn link(&self) -> &str {
        &self.link
    }
}

impl Drop for DownloadLink {
    fn drop(&mut self) {
        self.host.revoke_download(&self.link);
    }
}

impl fmt::Debug for DownloadLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadLink").field("link", &self.link).finish_non_exhaustive()
    }
}
