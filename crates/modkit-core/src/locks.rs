//! Per-module locks.
//!
//! Activation, deactivation, removal and configuration updates of one
//! module never overlap; different modules proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct ModuleLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ModuleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, id: Uuid) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| poisoned())?;
        Ok(locks.entry(id).or_default().clone())
    }

    /// Run `f` while holding the lock of module `id`.
    pub fn with<T>(&self, id: Uuid, f: impl FnOnce() -> T) -> Result<T> {
        let handle = self.handle(id)?;
        let _guard = handle.lock().map_err(|_| poisoned())?;
        Ok(f())
    }

    /// Drop the lock entry of a removed module.
    pub fn forget(&self, id: Uuid) {
        if let Ok(mut locks) = self.locks.lock() {
            locks.remove(&id);
        }
    }

    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> Error {
    Error::Store {
        message: "module lock poisoned".to_string(),
    }
}
