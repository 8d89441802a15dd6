use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, error, info};
use tempfile::NamedTempFile;

use crate::configuration::types::FilterConfiguration;
use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::ConfigStore;
use crate::storage::types::{ConfigDocument, ConfigSummary};

/// Filesystem-backed [`ConfigStore`] keeping every configuration in one JSON document.
///
/// The document is read fully on every call and rewritten fully on every
/// mutation. Writes go through a temporary file in the same directory followed
/// by a rename, so readers never observe a half-written document.
pub struct FileConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileConfigStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        info!("Configuration store at {}", path.display());
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StorageError> {
        self.write_lock
            .lock()
            .map_err(|_| StorageError::WriteFailed(String::from("store lock poisoned")))
    }

    fn read_document(&self) -> Result<ConfigDocument, StorageError> {
        if !self.path.exists() {
            debug!("{} does not exist yet, using an empty document", self.path.display());
            return Ok(ConfigDocument::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            error!("Failed to read {}: {}", self.path.display(), e);
            StorageError::ReadFailed(format!("{}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            error!("Failed to parse {}: {}", self.path.display(), e);
            StorageError::InvalidDocument(format!("{}: {}", self.path.display(), e))
        })
    }

    fn write_document(&self, document: &ConfigDocument) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| {
            error!("Failed to create store directory {}: {}", dir.display(), e);
            StorageError::WriteFailed(format!("{}: {}", dir.display(), e))
        })?;

        let body = serde_json::to_string_pretty(document)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| {
            error!("Failed to create temp file in {}: {}", dir.display(), e);
            StorageError::WriteFailed(format!("{}: {}", dir.display(), e))
        })?;
        tmp.write_all(body.as_bytes())
            .and_then(|_| tmp.flush())
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        tmp.persist(&self.path).map_err(|e| {
            error!("Failed to replace {}: {}", self.path.display(), e.error);
            StorageError::WriteFailed(format!("{}: {}", self.path.display(), e.error))
        })?;
        debug!(
            "Wrote {} configuration(s) to {}",
            document.configs.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<&str, StorageError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StorageError::InvalidName(String::from("name must not be empty")));
    }
    Ok(name)
}

impl ConfigStore for FileConfigStore {
    fn save(&self, name: &str, config: &FilterConfiguration) -> Result<(), StorageError> {
        let name = validate_name(name)?;
        let _guard = self.guard()?;
        let mut document = self.read_document()?;
        document.configs.insert(name.to_string(), config.clone());
        self.write_document(&document)?;
        info!("Saved configuration '{}'", name);
        Ok(())
    }

    fn load(&self, name: &str) -> Result<FilterConfiguration, StorageError> {
        let name = validate_name(name)?;
        let document = self.read_document()?;
        document
            .configs
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::ConfigNotFound(name.to_string()))
    }

    fn list(&self) -> Result<Vec<ConfigSummary>, StorageError> {
        let document = self.read_document()?;
        Ok(document
            .configs
            .iter()
            .map(|(name, config)| ConfigSummary {
                name: name.clone(),
                description: config.description.clone(),
            })
            .collect())
    }

    fn document(&self) -> Result<ConfigDocument, StorageError> {
        self.read_document()
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let name = validate_name(name)?;
        let _guard = self.guard()?;
        let mut document = self.read_document()?;
        if document.configs.remove(name).is_none() {
            return Err(StorageError::ConfigNotFound(name.to_string()));
        }
        self.write_document(&document)?;
        info!("Deleted configuration '{}'", name);
        Ok(())
    }
}
