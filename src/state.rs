//! Workspace-scoped key/value memo
//!
//! Remembers previous answers (build tags, compose subsets) so prompts can
//! be pre-filled. Stored as one JSON object under `.docker-workbench/`.

use crate::config::CONFIG_DIR;
use crate::error::{Result, WorkbenchError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const STATE_FILE: &str = "state.json";

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn for_workspace(workspace: &Path) -> Self {
        Self::new(workspace.join(CONFIG_DIR).join(STATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&contents)? {
            Value::Object(map) => Ok(map),
            _ => Err(WorkbenchError::Parse(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    /// Read `key`; a missing file, a missing key or a value of another shape reads as `None`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let map = match self.load() {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable state");
                return None;
            }
        };
        map.get(key)
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
    }

    pub fn update<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let mut map = self.load().unwrap_or_default();
        map.insert(key.to_string(), serde_json::to_value(value)?);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&Value::Object(map))?)?;
        Ok(())
    }
}
