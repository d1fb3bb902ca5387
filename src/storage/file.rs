//! `file` storage: one JSON document holding every key.
//!
//! On-disk shape of `storage.json`:
//!
//! ```json
//! { "entries": { "theme": "dark", "consultations": "[...]" } }
//! ```
//!
//! Each call reads, modifies and rewrites the whole document. Rewrites go
//! through a temporary sibling and a rename. A document that no longer
//! parses is kept as `storage.json.bak` on the next write.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;
use super::Storage;

#[derive(Default, Serialize, Deserialize)]
struct StorageFile {
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

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

    /// Parsed document. A malformed file is an error here; readers report it.
    fn load(&self) -> Result<StorageFile, AppError> {
        match self.read_raw()? {
            Some(data) => serde_json::from_str(&data)
                .map_err(|e| AppError::Storage(format!("malformed {}: {e}", self.path.display()))),
            None => Ok(StorageFile::default()),
        }
    }

    /// Document to modify. A malformed file is moved aside to
    /// `storage.json.bak` and replaced by an empty document, so later writes
    /// still land.
    fn load_for_update(&self) -> Result<StorageFile, AppError> {
        let Some(data) = self.read_raw()? else {
            return Ok(StorageFile::default());
        };
        match serde_json::from_str(&data) {
            Ok(file) => Ok(file),
            Err(e) => {
                let backup = self.sibling("bak");
                warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "malformed storage file moved aside"
                );
                fs::rename(&self.path, &backup).map_err(|e| {
                    AppError::Storage(format!("cannot move aside {}: {e}", self.path.display()))
                })?;
                Ok(StorageFile::default())
            }
        }
    }

    /// File contents, or `None` when missing or blank.
    fn read_raw(&self) -> Result<Option<String>, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(data) if data.trim().is_empty() => Ok(None),
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!(
                "cannot read {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Write to `storage.json.tmp`, then rename over the real file.
    fn save(&self, file: &StorageFile) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    AppError::Storage(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
        }
        let data = serde_json::to_string_pretty(file)
            .map_err(|e| AppError::Storage(format!("serialise storage: {e}")))?;
        let tmp = self.sibling("tmp");
        fs::write(&tmp, data)
            .map_err(|e| AppError::Storage(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| AppError::Storage(format!("cannot replace {}: {e}", self.path.display())))
    }

    /// `storage.json` → `storage.json.<ext>`.
    fn sibling(&self, ext: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    }
}

impl Storage for FileStorage {
    fn name(&self) -> &str {
        "file"
    }

    fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.load()?.entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut file = self.load_for_update()?;
        file.entries.insert(key.to_string(), value.to_string());
        self.save(&file)
    }

    fn clear(&self, key: &str) -> Result<bool, AppError> {
        let mut file = self.load_for_update()?;
        let removed = file.entries.remove(key).is_some();
        if removed {
            self.save(&file)?;
        }
        Ok(removed)
    }
}
