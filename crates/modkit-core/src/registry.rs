//! Module registry storage.
//!
//! The orchestrator only talks to [`ModuleStore`]. [`MemoryStore`] backs
//! tests and embedding; [`JsonFileStore`] persists the registry as a JSON
//! file next to the host, written atomically under an advisory lock.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use modkit_fs::{ConfigStore, FileLock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::module::{Module, ModuleQuery};

/// Find, insert, update and delete module records.
pub trait ModuleStore: Send + Sync {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Module>>;

    /// Records matching `query`, in insertion order.
    fn find(&self, query: &ModuleQuery) -> Result<Vec<Module>>;

    /// Insert `module`, or replace the record with the same name.
    fn upsert_by_name(&self, module: Module) -> Result<Module>;

    /// Replace the record with `module.id`; errors if there is none.
    fn update(&self, module: &Module) -> Result<()>;

    /// Delete by id, returning the deleted record.
    fn delete_by_id(&self, id: Uuid) -> Result<Option<Module>>;
}

/// The record list both stores operate on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Records {
    /// Registry format version for forward compatibility
    version: String,
    modules: Vec<Module>,
}

impl Records {
    fn new() -> Self {
        Self {
            version: "1".to_string(),
            modules: Vec::new(),
        }
    }

    fn find(&self, query: &ModuleQuery) -> Vec<Module> {
        self.modules
            .iter()
            .filter(|m| query.matches(m))
            .cloned()
            .collect()
    }

    fn find_by_id(&self, id: Uuid) -> Option<Module> {
        self.modules.iter().find(|m| m.id == id).cloned()
    }

    fn upsert_by_name(&mut self, module: Module) -> Module {
        match self.modules.iter_mut().find(|m| m.name == module.name) {
            Some(existing) => *existing = module.clone(),
            None => self.modules.push(module.clone()),
        }
        module
    }

    fn update(&mut self, module: &Module) -> Result<()> {
        let existing = self
            .modules
            .iter_mut()
            .find(|m| m.id == module.id)
            .ok_or_else(|| Error::NotFound(module.id.to_string()))?;
        *existing = module.clone();
        Ok(())
    }

    fn delete_by_id(&mut self, id: Uuid) -> Option<Module> {
        let pos = self.modules.iter().position(|m| m.id == id)?;
        Some(self.modules.remove(pos))
    }
}

/// In-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    records: Mutex<Records>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Records::new()),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut Records) -> T) -> Result<T> {
        let mut records = self.records.lock().map_err(|_| Error::Store {
            message: "memory store lock poisoned".to_string(),
        })?;
        Ok(f(&mut records))
    }
}

impl ModuleStore for MemoryStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Module>> {
        self.with(|r| r.find_by_id(id))
    }

    fn find(&self, query: &ModuleQuery) -> Result<Vec<Module>> {
        self.with(|r| r.find(query))
    }

    fn upsert_by_name(&self, module: Module) -> Result<Module> {
        self.with(|r| r.upsert_by_name(module))
    }

    fn update(&self, module: &Module) -> Result<()> {
        self.with(|r| r.update(module))?
    }

    fn delete_by_id(&self, id: Uuid) -> Result<Option<Module>> {
        self.with(|r| r.delete_by_id(id))
    }
}

/// Registry persisted as a JSON file.
///
/// Every operation reads the file under an exclusive lock on
/// `<path>.lock`; mutations write it back atomically before the lock is
/// released, so several processes can share one registry.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    store: ConfigStore,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            store: ConfigStore::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Records> {
        match self.store.load::<Records>(&self.path) {
            Ok(records) => Ok(records),
            Err(e) if e.is_not_found() => Ok(Records::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Records) -> T) -> Result<T> {
        let _lock = FileLock::exclusive(&self.path)?;
        let records = self.load()?;
        Ok(f(&records))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Records) -> Result<T>) -> Result<T> {
        let _lock = FileLock::exclusive(&self.path)?;
        let mut records = self.load()?;
        let out = f(&mut records)?;
        self.store.save(&self.path, &records)?;
        Ok(out)
    }
}

impl ModuleStore for JsonFileStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Module>> {
        self.read(|r| r.find_by_id(id))
    }

    fn find(&self, query: &ModuleQuery) -> Result<Vec<Module>> {
        self.read(|r| r.find(query))
    }

    fn upsert_by_name(&self, module: Module) -> Result<Module> {
        self.write(|r| Ok(r.upsert_by_name(module)))
    }

    fn update(&self, module: &Module) -> Result<()> {
        self.write(|r| r.update(module))
    }

    fn delete_by_id(&self, id: Uuid) -> Result<Option<Module>> {
        self.write(|r| Ok(r.delete_by_id(id)))
    }
}
