// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Durable session id storage

use parking_lot::Mutex;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::error::Result;

/// A single string slot that outlives the process
pub trait SessionIdStorage: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, id: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Stores the id in a plain text file
pub struct FileSessionIdStorage {
    path: PathBuf,
}

impl FileSessionIdStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionIdStorage for FileSessionIdStorage {
    fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let id = contents.trim();
                (!id.is_empty()).then(|| id.to_string())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read session id from {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn save(&self, id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, id)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Process-local storage
#[derive(Default)]
pub struct MemorySessionIdStorage {
    id: Mutex<Option<String>>,
}

impl MemorySessionIdStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionIdStorage for MemorySessionIdStorage {
    fn load(&self) -> Option<String> {
        self.id.lock().clone()
    }

    fn save(&self, id: &str) -> Result<()> {
        *self.id.lock() = Some(id.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.id.lock() = None;
        Ok(())
    }
}
