//! Process-wide cut/copy clipboard consumed by paste.

use hashlink::LinkedHashMap;
use parking_lot::Mutex;

use crate::fs::util::normalize;
use crate::types::PasteOp;

/// Source paths waiting to be pasted, in the order they were picked.
///
/// Filled by cut or copy. A paste that contains any move empties it in the same step
/// it reads it; a copy-only paste leaves it intact so it can be repeated.
#[derive(Debug, Default)]
pub struct Clipboard {
    entries: Mutex<LinkedHashMap<String, PasteOp>>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set(paths, PasteOp::Copy);
    }

    pub fn cut<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set(paths, PasteOp::Move);
    }

    /// Replace the contents with `paths`, all tagged with `op`.
    pub fn set<I, S>(&self, paths: I, op: PasteOp)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fresh: LinkedHashMap<String, PasteOp> =
            paths.into_iter().map(|path| (normalize(path.as_ref()), op)).collect();
        *self.entries.lock() = fresh;
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn entries(&self) -> Vec<(String, PasteOp)> {
        self.entries.lock().iter().map(|(path, op)| (path.clone(), *op)).collect()
    }

    /// Snapshot for a paste. Clears the clipboard when the snapshot contains a move.
    pub fn take_for_paste(&self) -> Vec<(String, PasteOp)> {
        let mut entries = self.entries.lock();
        let snapshot: Vec<(String, PasteOp)> =
            entries.iter().map(|(path, op)| (path.clone(), *op)).collect();
        if snapshot.iter().any(|(_, op)| *op == PasteOp::Move) {
            entries.clear();
        }
        snapshot
    }
}
