//! Session token storage.
//!
//! The token lives under a single key (`auth.token`) as `{ "token": ".." }`.
//! [`FileTokenStore`] keeps a small JSON key-value file so other keys written
//! by the application survive token updates.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::models::AuthToken;

pub const TOKEN_KEY: &str = "auth.token";

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait TokenStore: Send + Sync {
    fn get_token(&self) -> Result<Option<AuthToken>, TokenStoreError>;
    fn set_token(&self, token: &AuthToken) -> Result<(), TokenStoreError>;
    fn remove_token(&self) -> Result<(), TokenStoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<AuthToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_token(&self) -> Result<Option<AuthToken>, TokenStoreError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set_token(&self, token: &AuthToken) -> Result<(), TokenStoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn remove_token(&self) -> Result<(), TokenStoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// JSON file holding `{ "<key>": <value>, .. }`
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, serde_json::Value>, TokenStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(
        &self,
        entries: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get_token(&self) -> Result<Option<AuthToken>, TokenStoreError> {
        let mut entries = self.read_all()?;
        match entries.remove(TOKEN_KEY) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn set_token(&self, token: &AuthToken) -> Result<(), TokenStoreError> {
        let mut entries = self.read_all()?;
        entries.insert(TOKEN_KEY.to_string(), serde_json::to_value(token)?);
        self.write_all(&entries)?;
        log::debug!("Stored session token in {}", self.path.display());
        Ok(())
    }

    fn remove_token(&self) -> Result<(), TokenStoreError> {
        let mut entries = self.read_all()?;
        if entries.remove(TOKEN_KEY).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}
