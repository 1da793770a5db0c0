//! Channel configuration document.
//!
//! DESIGN
//! ======
//! The document holds the channel id and the OAuth client id/secret entered
//! through `/setup`. `ConfigStore` owns both the file on disk and the
//! in-memory copy; handlers reach it through `AppState` rather than a global.
//! `save` writes the file and swaps the in-memory copy while holding the write
//! lock, so no reader in this process observes the file and memory disagreeing.
//!
//! Field contents are not validated. A bad client id only surfaces when the
//! OAuth flow runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Credentials entered through `/setup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub channel_id: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read the config document at `path`. `Ok(None)` when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub async fn load(path: &Path) -> Result<Option<ChannelConfig>, ConfigError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ConfigError::Io { path: path.to_path_buf(), source }),
    };
    let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
    Ok(Some(config))
}

/// File-backed config with an in-memory copy shared by all handlers.
#[derive(Clone)]
pub struct ConfigStore {
    path: PathBuf,
    current: Arc<RwLock<Option<ChannelConfig>>>,
}

impl ConfigStore {
    /// Create a store with an already-loaded value.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, current: Option<ChannelConfig>) -> Self {
        Self { path: path.into(), current: Arc::new(RwLock::new(current)) }
    }

    /// Open the store at `path`, loading the document if present.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing document cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let current = load(&path).await?;
        Ok(Self::new(path, current))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current config, `None` while unconfigured.
    pub async fn current(&self) -> Option<ChannelConfig> {
        self.current.read().await.clone()
    }

    pub async fn is_configured(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Persist a new config and make it visible to subsequent reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written; the in-memory copy
    /// is left unchanged in that case.
    pub async fn save(
        &self,
        channel_id: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<ChannelConfig, ConfigError> {
        let config = ChannelConfig {
            channel_id: channel_id.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        };
        let body = serde_json::to_vec(&config).map_err(|source| ConfigError::Parse { path: self.path.clone(), source })?;

        let mut current = self.current.write().await;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|source| ConfigError::Io { path: self.path.clone(), source })?;
        *current = Some(config.clone());
        Ok(config)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
