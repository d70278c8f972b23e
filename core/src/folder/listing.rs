//! Ordered name → stat snapshot for one directory.

use hashlink::LinkedHashMap;

use crate::types::FileStat;

/// Directory contents in display order. Names are unique base names.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    entries: LinkedHashMap<String, FileStat>,
}

impl Listing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FileStat> {
        self.entries.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileStat)> {
        self.entries.iter()
    }

    /// Insert at the end, or replace the stat of an existing name in place.
    pub fn upsert(&mut self, name: String, stat: FileStat) {
        if let Some(existing) = self.entries.get_mut(&name) {
            *existing = stat;
        } else {
            self.entries.insert(name, stat);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FileStat> {
        self.entries.remove(name)
    }

    /// Rename `from` to `to` without moving it. Returns false when `from` is absent.
    pub fn relabel(&mut self, from: &str, to: &str) -> bool {
        if !self.entries.contains_key(from) {
            return false;
        }

        let previous = std::mem::take(&mut self.entries);
        for (name, mut stat) in previous {
            if name == from {
                stat.name = to.to_string();
                self.entries.insert(to.to_string(), stat);
            } else if name != to {
                self.entries.insert(name, stat);
            }
        }
        true
    }

    pub fn into_entries(self) -> Vec<(String, FileStat)> {
        self.entries.into_iter().collect()
    }
}

impl FromIterator<(String, FileStat)> for Listing {
    fn from_iter<I: IntoIterator<Item = (String, FileStat)>>(iter: I) -> Self {
        let mut listing = Listing::new();
        for (name, stat) in iter {
            listing.upsert(name, stat);
        }
        listing
    }
}
