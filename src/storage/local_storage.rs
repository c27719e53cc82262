//! File-backed string key/value storage, the native counterpart of browser local storage.
//!
//! The whole map lives in one JSON object on disk. Every write is a locked
//! read-modify-write: take an exclusive lock on a sibling lock file, re-read the
//! file, apply the change, then write a temp file and rename it over the original.
//! Several processes can share one storage directory without losing each other's keys.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use fs2::FileExt;
use tracing::warn;

use crate::errors::Result;

const STORAGE_FILE: &str = "local_storage.json";

#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    /// Opens (or creates) the storage file inside `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(STORAGE_FILE);
        let entries = read_entries(&path)?;
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.update(|entries| {
            entries.insert(key.to_string(), value);
        })
    }

    /// Returns whether the key was present.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        self.update(|entries| entries.remove(key).is_some())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.update(BTreeMap::clear)
    }

    /// Applies `f` to the latest on-disk map under an exclusive file lock and
    /// persists the result. Keys written by other processes in the meantime survive.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut BTreeMap<String, String>) -> R) -> Result<R> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut entries = read_entries(&self.path)?;
        let out = f(&mut entries);
        persist(&self.path, &entries)?;
        self.entries = entries;
        Ok(out)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Re-reads the file, picking up writes made by another process.
    pub fn reload(&mut self) -> Result<()> {
        self.entries = read_entries(&self.path)?;
        Ok(())
    }
}

fn persist(path: &Path, entries: &BTreeMap<String, String>) -> Result<()> {
    let json = serde_json::to_vec_pretty(entries)?;
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Exclusive lock on `<file>.lock`, released when the handle is dropped.
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.with_extension("lock"))?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release local storage lock: {e}");
        }
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_slice(&raw) {
        Ok(entries) => Ok(entries),
        Err(e) => {
            warn!("Ignoring unreadable local storage at {}: {e}", path.display());
            Ok(BTreeMap::new())
        }
    }
}

/// Storage handle shared by the session store and the preferences.
#[derive(Debug, Clone)]
pub struct SharedStorage(Arc<Mutex<LocalStorage>>);

impl SharedStorage {
    pub fn new(storage: LocalStorage) -> Self {
        Self(Arc::new(Mutex::new(storage)))
    }

    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(LocalStorage::open(dir)?))
    }

    /// Locks the storage. A poisoned lock still holds a consistent map, so it is recovered.
    pub fn lock(&self) -> MutexGuard<'_, LocalStorage> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
