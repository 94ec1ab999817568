//! Small key/value persistence for client-side preferences and the session
//! token. The file variant keeps a flat JSON object on disk.

use std::{
    collections::BTreeMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::error::CrmResult;

pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> CrmResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CrmResult<()>;
    fn remove(&self, key: &str) -> CrmResult<()>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> CrmResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CrmResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CrmResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

pub struct FileStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> CrmResult<BTreeMap<String, String>> {
        match fs::read(&self.path) {
            Ok(raw) if raw.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Stages the content in a sibling temp file and renames it over the
    /// store; readers see either the old or the new object.
    fn write_all(&self, entries: &BTreeMap<String, String>) -> CrmResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let raw = serde_json::to_vec_pretty(entries)?;
        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        staged.write_all(&raw)?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(std::io::Error::from)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> CrmResult<()> {
        let _guard = self
            .guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = self.read_all()?;
        apply(&mut entries);
        self.write_all(&entries)
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> CrmResult<Option<String>> {
        let _guard = self
            .guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> CrmResult<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> CrmResult<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_reads_missing_file_as_empty_and_creates_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("nested").join("store.json"));

        assert_eq!(store.get("token").expect("get"), None);

        store.set("token", "abc").expect("set");
        store.set("theme", "light").expect("set");
        assert!(store.path().exists());
        assert_eq!(store.get("token").expect("get").as_deref(), Some("abc"));

        store.remove("token").expect("remove");
        assert_eq!(store.get("token").expect("get"), None);
        assert_eq!(store.get("theme").expect("get").as_deref(), Some("light"));
    }

    #[test]
    fn file_store_reports_corrupt_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").expect("write");

        let store = FileStore::new(&path);
        assert!(store.get("token").is_err());
    }

    #[test]
    fn file_store_replaces_content_without_leaving_temp_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        let store = FileStore::new(&path);

        for round in 0..5 {
            store.set("token", &format!("tok-{round}")).expect("set");
        }
        store.set("theme", "dark").expect("set");

        let raw = fs::read(&path).expect("read");
        let entries: BTreeMap<String, String> = serde_json::from_slice(&raw).expect("valid json");
        assert_eq!(entries.get("token").map(String::as_str), Some("tok-4"));
        assert_eq!(entries.get("theme").map(String::as_str), Some("dark"));

        let names: Vec<_> = fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
    }
}
