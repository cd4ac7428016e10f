//! Durable key/value storage shared by every page of an origin.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing `{key}` ({needed} of {limit} bytes)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },
    #[error("storage access denied: {0}")]
    AccessDenied(String),
    #[error("storage i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// `localStorage`-shaped store. Every operation may fail.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
    access_denied: bool,
}

impl MemoryState {
    fn check_access(&self) -> Result<(), StorageError> {
        if self.access_denied {
            return Err(StorageError::AccessDenied("storage disabled".to_string()));
        }
        Ok(())
    }

    fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

/// In-memory storage. Clones share the same entries, so a "reloaded" page
/// built from a clone sees what the previous page wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the total size (keys plus values, in bytes).
    pub fn with_quota(limit: usize) -> Self {
        let storage = Self::new();
        storage.state.borrow_mut().quota = Some(limit);
        storage
    }

    /// Makes every subsequent operation fail with [`StorageError::AccessDenied`].
    pub fn set_access_denied(&self, denied: bool) {
        self.state.borrow_mut().access_denied = denied;
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw read that bypasses failure injection.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.state.borrow().entries.get(key).cloned()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let state = self.state.borrow();
        state.check_access()?;
        Ok(state.entries.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self.state.borrow_mut();
        state.check_access()?;
        if let Some(limit) = state.quota {
            let previous = state.entries.get(key).map_or(0, |v| key.len() + v.len());
            let needed = state.used_bytes() - previous + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }
        state.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        let mut state = self.state.borrow_mut();
        state.check_access()?;
        state.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let state = self.state.borrow();
        state.check_access()?;
        Ok(state.entries.keys().cloned().collect())
    }
}

/// Storage persisted as one JSON object in a file. Every operation re-reads
/// the file, so two handles on the same path stay coherent (last write wins).
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        log::trace!(target: "platform.storage", "wrote {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read_all()?.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clones_share_entries() {
        let mut a = MemoryStorage::new();
        let b = a.clone();
        a.set_item("k", "v").unwrap();
        assert_eq!(b.get_item("k").unwrap().as_deref(), Some("v"));
        a.remove_item("k").unwrap();
        assert!(b.is_empty());
    }

    #[test]
    fn memory_quota_rejects_oversized_write() {
        let mut s = MemoryStorage::with_quota(8);
        s.set_item("ab", "cdef").unwrap();
        // Overwriting the same key only counts the new value.
        s.set_item("ab", "cdefgh").unwrap();
        let err = s.set_item("x", "yy").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { needed: 11, limit: 8, .. }));
        assert_eq!(s.peek("x"), None);
    }

    #[test]
    fn memory_access_denied_fails_every_operation() {
        let mut s = MemoryStorage::new();
        s.set_item("k", "v").unwrap();
        s.set_access_denied(true);
        assert!(matches!(s.get_item("k"), Err(StorageError::AccessDenied(_))));
        assert!(s.set_item("k", "w").is_err());
        assert!(s.remove_item("k").is_err());
        assert_eq!(s.peek("k").as_deref(), Some("v"));
    }

    #[test]
    fn file_storage_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let mut first = FileStorage::new(&path);
        assert_eq!(first.get_item("missing").unwrap(), None);
        first.set_item("form-storage:order", r#"{"name":"Olena"}"#).unwrap();

        let mut second = FileStorage::new(&path);
        assert_eq!(
            second.get_item("form-storage:order").unwrap().as_deref(),
            Some(r#"{"name":"Olena"}"#)
        );
        second.remove_item("form-storage:order").unwrap();
        assert!(first.keys().unwrap().is_empty());
    }

    #[test]
    fn file_storage_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();
        let s = FileStorage::new(&path);
        assert!(matches!(s.get_item("k"), Err(StorageError::Corrupt(_))));
    }
}
