//! Last-known display order of each directory, kept across sessions.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, anyhow};
use directories::ProjectDirs;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::fs::util::normalize;

const APP_QUALIFIER: &str = "com";
const APP_ORGANISATION: &str = "WebDesk";
const APP_NAME: &str = "webdesk";

/// Per-directory ordering persistence.
pub trait SortOrderStore {
    fn get(&self, dir: &str) -> Option<Vec<String>>;

    fn set(&self, dir: &str, order: Vec<String>);
}

/// Session-only orders.
#[derive(Debug, Default)]
pub struct MemorySortOrders {
    orders: Mutex<HashMap<String, Vec<String>>>,
}

impl MemorySortOrders {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SortOrderStore for MemorySortOrders {
    fn get(&self, dir: &str) -> Option<Vec<String>> {
        self.orders.lock().get(&normalize(dir)).cloned()
    }

    fn set(&self, dir: &str, order: Vec<String>) {
        self.orders.lock().insert(normalize(dir), order);
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SortOrderFile {
    #[serde(default)]
    orders: HashMap<String, SortOrderEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SortOrderEntry {
    names: Vec<String>,
    updated_ms: u64,
}

/// Orders stored as one JSON document, rewritten atomically on every change.
#[derive(Debug)]
pub struct JsonSortOrders {
    path: PathBuf,
    state: Mutex<SortOrderFile>,
}

impl JsonSortOrders {
    /// Load `path`, starting empty when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let state = read_file(&path)?;
        Ok(Self { path, state: Mutex::new(state) })
    }

    /// Open the document under the per-user data directory.
    pub fn open_default() -> anyhow::Result<Self> {
        Self::open(default_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SortOrderStore for JsonSortOrders {
    fn get(&self, dir: &str) -> Option<Vec<String>> {
        self.state.lock().orders.get(&normalize(dir)).map(|entry| entry.names.clone())
    }

    fn set(&self, dir: &str, order: Vec<String>) {
        let mut state = self.state.lock();
        state.orders.insert(normalize(dir), SortOrderEntry { names: order, updated_ms: now_ms() });
        if let Err(err) = write_file(&self.path, &state) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to persist sort order");
        }
    }
}

fn default_path() -> anyhow::Result<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORGANISATION, APP_NAME)
        .map(|dirs| dirs.data_dir().join("state").join("sort_orders.json"))
        .ok_or_else(|| anyhow!("unable to resolve application data directory"))
}

fn read_file(path: &Path) -> anyhow::Result<SortOrderFile> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing sort orders at {}", path.display())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(SortOrderFile::default()),
        Err(err) => Err(err.into()),
    }
}

fn write_file(path: &Path, file: &SortOrderFile) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("sort order path {} has no parent directory", path.display()))?;
    fs::create_dir_all(parent)?;

    let data = serde_json::to_vec_pretty(file)?;
    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(&data)?;
    temp.flush()?;

    match temp.persist(path) {
        Ok(_) => Ok(()),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
            if let Err(remove_err) = fs::remove_file(path) {
                if remove_err.kind() != io::ErrorKind::NotFound {
                    return Err(remove_err.into());
                }
            }
            err.file.persist(path).map(|_| ()).map_err(|persist_err| persist_err.error.into())
        }
        Err(err) => Err(err.error.into()),
    }
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}
