use crate::paths;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

const PREFERENCES_FILE: &str = "preferences.json";

/// Durable string key-value storage for form preferences.
///
/// Entries are never expired or removed by the form; keys follow the
/// `${controlId}Value` convention.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn entries(&self) -> Vec<(String, String)>;
}

pub fn preferences_path() -> Result<PathBuf> {
    paths::scoped_path(PREFERENCES_FILE)
}

/// JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FilePreferenceStore {
    pub fn open_default() -> Result<Self> {
        Self::open(preferences_path()?)
    }

    /// Opens the default store, starting empty when the file cannot be read.
    pub fn open_default_or_empty() -> Result<Self> {
        Ok(Self::open_or_empty(preferences_path()?))
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            paths::read_json(&path, "preferences")?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    /// Like [`open`](Self::open), but an unreadable or malformed file yields an
    /// empty store at the same path. The next `set` overwrites the bad file.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(path.clone()) {
            Ok(store) => store,
            Err(err) => {
                warn!(path = %path.display(), "ignoring stored preferences: {err:#}");
                Self {
                    path,
                    entries: BTreeMap::new(),
                }
            }
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        paths::write_json(&self.path, &self.entries, "preferences")
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// In-process store; keeps a log of every write.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferenceStore {
    entries: BTreeMap<String, String>,
    writes: Vec<(String, String)>,
}

#[cfg(test)]
impl MemoryPreferenceStore {
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            writes: Vec::new(),
        }
    }

    #[must_use]
    pub fn writes(&self) -> &[(String, String)] {
        &self.writes
    }
}

#[cfg(test)]
impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        self.writes.push((key.to_owned(), value.to_owned()));
        Ok(())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Store whose writes always fail, like a full disk.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FailingPreferenceStore;

#[cfg(test)]
impl PreferenceStore for FailingPreferenceStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&mut self, key: &str, _value: &str) -> Result<()> {
        anyhow::bail!("no space left writing {key}")
    }

    fn entries(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};

    #[test]
    fn missing_file_opens_as_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePreferenceStore::open(dir.path().join("prefs.json")).unwrap();
        assert!(store.entries().is_empty());
        assert_eq!(store.get("voiceValue"), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut store = FilePreferenceStore::open(&path).unwrap();
        store.set("voiceValue", "en_us_006").unwrap();
        store.set("reuseChoicesToggleValue", "true").unwrap();
        store.set("voiceValue", "en_uk_001").unwrap();

        let reopened = FilePreferenceStore::open(&path).unwrap();
        assert_eq!(reopened.get("voiceValue").as_deref(), Some("en_uk_001"));
        assert_eq!(
            reopened.get("reuseChoicesToggleValue").as_deref(),
            Some("true")
        );
        assert_eq!(reopened.entries().len(), 2);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FilePreferenceStore::open(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed parsing preferences"));
    }

    #[test]
    fn unreadable_file_falls_back_to_empty_store_and_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        for bad in [r#"{"threadsValue": 4, "voiceValue": "en_us_006"}"#, r#"{"voiceValue": "en_"#] {
            std::fs::write(&path, bad).unwrap();
            assert!(FilePreferenceStore::open(&path).is_err());

            let mut store = FilePreferenceStore::open_or_empty(&path);
            assert!(store.entries().is_empty());
            assert_eq!(store.path(), path.as_path());

            store.set("voiceValue", "en_uk_003").unwrap();
            let reopened = FilePreferenceStore::open(&path).unwrap();
            assert_eq!(reopened.entries(), [("voiceValue".to_owned(), "en_uk_003".to_owned())]);
        }
    }

    #[test]
    fn memory_store_logs_each_write() {
        let mut store = MemoryPreferenceStore::with_entries([("threadsValue", "4")]);
        store.set("threadsValue", "8").unwrap();

        assert_eq!(store.get("threadsValue").as_deref(), Some("8"));
        assert_eq!(
            store.writes(),
            &[("threadsValue".to_owned(), "8".to_owned())]
        );
    }
}
