use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Key under which the practiced indices are stored.
pub const PROGRESS_KEY: &str = "practicedIndices";

const APP_DIR_NAME: &str = ".revise_practice";
const PROGRESS_FILE_NAME: &str = "progress.json";

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Failed to read progress file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write progress file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("No suitable config directory available for progress")]
    NoConfigDir,
}

/// Durable set of practiced sentence indices.
pub trait ProgressStore {
    fn load(&self) -> Result<BTreeSet<usize>, ProgressError>;
    /// Replaces the whole stored set.
    fn save(&self, practiced: &BTreeSet<usize>) -> Result<(), ProgressError>;
}

/// Keeps progress in a JSON object file under [`PROGRESS_KEY`].
///
/// Other keys in the same file are left untouched on write.
#[derive(Debug, Clone)]
pub struct JsonFileProgressStore {
    path: PathBuf,
}

impl JsonFileProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<OS config dir>/.revise_practice/progress.json`
    pub fn default_location() -> Result<PathBuf, ProgressError> {
        let base = directories::BaseDirs::new().ok_or(ProgressError::NoConfigDir)?;
        Ok(base.config_dir().join(APP_DIR_NAME).join(PROGRESS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Option<Map<String, Value>>, ProgressError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ProgressError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        // Invalid UTF-8 counts as malformed, not as a read failure.
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) | Err(_) => {
                tracing::warn!(
                    "Progress file {} is not a JSON object; treating as empty",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }
}

impl ProgressStore for JsonFileProgressStore {
    fn load(&self) -> Result<BTreeSet<usize>, ProgressError> {
        let Some(document) = self.read_document()? else {
            return Ok(BTreeSet::new());
        };
        match document.get(PROGRESS_KEY) {
            None => Ok(BTreeSet::new()),
            Some(value) => Ok(decode_indices(value).unwrap_or_else(|| {
                tracing::warn!(
                    "Stored value under '{}' in {} is malformed; treating as empty",
                    PROGRESS_KEY,
                    self.path.display()
                );
                BTreeSet::new()
            })),
        }
    }

    fn save(&self, practiced: &BTreeSet<usize>) -> Result<(), ProgressError> {
        let write_err = |source| ProgressError::Write {
            path: self.path.clone(),
            source,
        };
        let mut document = match self.read_document() {
            Ok(document) => document.unwrap_or_default(),
            Err(err) => {
                tracing::warn!("{err}; rewriting progress file without its other keys");
                Map::new()
            }
        };
        document.insert(PROGRESS_KEY.to_string(), serde_json::to_value(practiced)?);
        let contents = serde_json::to_string_pretty(&Value::Object(document))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;
        Ok(())
    }
}

/// Strict decoding: every element must be a non-negative integer.
fn decode_indices(value: &Value) -> Option<BTreeSet<usize>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_u64().and_then(|n| usize::try_from(n).ok()))
        .collect()
}

/// In-memory store; clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    inner: Arc<Mutex<BTreeSet<usize>>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(indices.into_iter().collect())),
        }
    }

    pub fn stored(&self) -> BTreeSet<usize> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self) -> Result<BTreeSet<usize>, ProgressError> {
        Ok(self.stored())
    }

    fn save(&self, practiced: &BTreeSet<usize>) -> Result<(), ProgressError> {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = practiced.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> JsonFileProgressStore {
        JsonFileProgressStore::new(dir.path().join("nested").join("progress.json"))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let practiced: BTreeSet<usize> = [0, 3, 7].into_iter().collect();
        store.save(&practiced).unwrap();
        assert_eq!(store.load().unwrap(), practiced);

        let raw = fs::read_to_string(store.path()).unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc[PROGRESS_KEY], serde_json::json!([0, 3, 7]));
    }

    #[test]
    fn missing_key_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, r#"{"theme": "dark"}"#).unwrap();
        assert!(JsonFileProgressStore::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn non_numeric_indices_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, r#"{"practicedIndices": [1, "two", 3]}"#).unwrap();
        assert!(JsonFileProgressStore::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn garbage_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "not json at all").unwrap();
        assert!(JsonFileProgressStore::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn non_utf8_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x7b]).unwrap();
        assert!(JsonFileProgressStore::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn directory_at_path_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::create_dir(&path).unwrap();
        let err = JsonFileProgressStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ProgressError::Read { .. }));
    }

    #[test]
    fn save_over_non_utf8_file_rewrites_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, [0xff, 0xfe]).unwrap();
        let store = JsonFileProgressStore::new(&path);
        store.save(&[4].into_iter().collect()).unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc[PROGRESS_KEY], serde_json::json!([4]));
        assert_eq!(doc.as_object().map(Map::len), Some(1));
        assert_eq!(store.load().unwrap(), [4].into_iter().collect());
    }

    #[test]
    fn save_over_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::create_dir(&path).unwrap();
        let err = JsonFileProgressStore::new(&path)
            .save(&[1].into_iter().collect())
            .unwrap_err();
        assert!(matches!(err, ProgressError::Write { .. }));
    }

    #[test]
    fn save_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, r#"{"theme": "dark", "practicedIndices": [1]}"#).unwrap();
        let store = JsonFileProgressStore::new(&path);
        store.save(&[1, 2].into_iter().collect()).unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["theme"], "dark");
        assert_eq!(doc[PROGRESS_KEY], serde_json::json!([1, 2]));
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryProgressStore::with_indices([2]);
        let handle = store.clone();
        store.save(&[2, 5].into_iter().collect()).unwrap();
        assert_eq!(handle.stored(), [2, 5].into_iter().collect());
    }
}
