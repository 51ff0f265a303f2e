use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::prelude::*;

use super::error::StorageError;
use super::saved::SavedConfiguration;

/// JSON-array file of configurations saved on this machine.
///
/// Clones share one lock, and every read-modify-write holds it, so concurrent
/// saves and deletes never drop each other's records. All methods block.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every stored record, failing on a corrupt file. A missing file is empty.
    fn read_strict(&self) -> Result<Vec<SavedConfiguration>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Every stored record. Unreadable or corrupt files read as empty, after a warning.
    pub fn read_all(&self) -> Vec<SavedConfiguration> {
        let _guard = self.guard();
        self.read_strict().unwrap_or_else(|e| {
            warn!("Ignoring unreadable local store {}: {e}", self.path.display());
            Vec::new()
        })
    }

    fn write_all(&self, configs: &[SavedConfiguration]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(configs)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// A corrupt file is left untouched and reported as an error.
    pub fn append(&self, config: &SavedConfiguration) -> Result<(), StorageError> {
        let _guard = self.guard();
        let mut configs = self.read_strict()?;
        configs.push(config.clone());
        self.write_all(&configs)
    }

    /// Local-origin records for one weapon, in the order they were saved.
    pub fn for_weapon(&self, weapon_id: &str) -> Vec<SavedConfiguration> {
        self.read_all()
            .into_iter()
            .filter(|c| c.is_local && c.weapon_id == weapon_id)
            .collect()
    }

    /// `false` when no record had that id.
    pub fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let _guard = self.guard();
        let mut configs = self.read_strict()?;
        let before = configs.len();
        configs.retain(|c| c.id != id);
        if configs.len() == before {
            return Ok(false);
        }
        self.write_all(&configs)?;
        Ok(true)
    }
}
