// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted state document
//!
//! One JSON document per process holding an opaque blob per system. Writes
//! replace the whole file (write-then-rename); a `.bak` copy is refreshed at
//! most once per calendar day.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from state persistence
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-system opaque blobs, keyed by system name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateDocument {
    pub systems: BTreeMap<String, serde_json::Value>,
}

impl StateDocument {
    /// Store one system's blob
    pub fn set<T: Serialize>(&mut self, system: &str, value: &T) -> Result<(), StateError> {
        self.systems
            .insert(system.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Fetch one system's blob, None when the document has never seen it
    pub fn get<T: DeserializeOwned>(&self, system: &str) -> Result<Option<T>, StateError> {
        match self.systems.get(system) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }
}

/// The state document on disk
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document; a missing file yields an empty document
    pub fn load(&self) -> Result<StateDocument, StateError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "state file doesn't exist");
                return Ok(StateDocument::default());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the whole document, refreshing the daily backup first
    pub fn save(&self, document: &StateDocument, now: DateTime<Utc>) -> Result<(), StateError> {
        if self.backup_due(now) {
            let backup = self.backup_path();
            fs::rename(&self.path, &backup)?;
            tracing::info!(backup = %backup.display(), "rotated daily state backup");
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(document)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".bak");
        PathBuf::from(name)
    }

    /// A backup is due when the primary exists and the backup is missing or
    /// from an earlier day
    fn backup_due(&self, now: DateTime<Utc>) -> bool {
        if !self.path.exists() {
            return false;
        }
        let Ok(metadata) = fs::metadata(self.backup_path()) else {
            return true;
        };
        let Ok(modified) = metadata.modified() else {
            return true;
        };
        let modified: DateTime<Utc> = modified.into();
        modified.date_naive() < now.date_naive()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
