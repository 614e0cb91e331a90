//! Device-local persistence for the access token.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Key the token is stored under inside the session document.
pub const TOKEN_STORAGE_KEY: &str = "token";
const APP_DIR_NAME: &str = "wine-cellar";
const SESSION_FILE_NAME: &str = "session.json";

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>>;
    async fn save(&self, token: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Keeps `{"token": "..."}` in a JSON file.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_local_dir>/wine-cellar/session.json`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|base| base.join(APP_DIR_NAME).join(SESSION_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Map<String, Value>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read session file '{}'", self.path.display())
                })
            }
        };
        match serde_json::from_str::<Map<String, Value>>(&raw) {
            Ok(document) => Ok(document),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "token store: ignoring unreadable session file"
                );
                Ok(Map::new())
            }
        }
    }

    async fn write_document(&self, document: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create session directory '{}'", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(document)?;
        tokio::fs::write(&self.path, serialized)
            .await
            .with_context(|| format!("failed to write session file '{}'", self.path.display()))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<String>> {
        let document = self.read_document().await?;
        Ok(document
            .get(TOKEN_STORAGE_KEY)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_owned))
    }

    async fn save(&self, token: &str) -> Result<()> {
        let mut document = self.read_document().await?;
        document.insert(TOKEN_STORAGE_KEY.into(), Value::String(token.to_string()));
        self.write_document(&document).await?;
        debug!(path = %self.path.display(), "token store: token saved");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut document = self.read_document().await?;
        if document.remove(TOKEN_STORAGE_KEY).is_none() {
            return Ok(());
        }
        self.write_document(&document).await?;
        debug!(path = %self.path.display(), "token store: token cleared");
        Ok(())
    }
}

/// Keeps the token in process memory only. For embedders that persist the
/// session themselves, and for tests.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().await.clone())
    }

    async fn save(&self, token: &str) -> Result<()> {
        *self.token.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.token.lock().await.take();
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/token_store_tests.rs"]
mod tests;
