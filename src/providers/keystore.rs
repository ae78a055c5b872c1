//! Credential storage keyed by provider id.
//!
//! Writes are single-key and last-writer-wins. The file store keeps an
//! in-memory cache and rewrites its JSON map on every change; encryption at
//! rest is left to the platform.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage for per-provider API keys.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Credential for `provider_id`, if one is stored.
    async fn get(&self, provider_id: &str) -> Option<String>;

    /// Store or replace the credential for `provider_id`.
    async fn set(&self, provider_id: &str, credential: &str) -> Result<()>;

    /// Remove the credential for `provider_id`. Missing keys are not an error.
    async fn remove(&self, provider_id: &str) -> Result<()>;

    async fn contains(&self, provider_id: &str) -> bool {
        self.get(provider_id).await.is_some()
    }
}

/// Credentials kept only in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    keys: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, provider_id: &str) -> Option<String> {
        self.keys.read().await.get(provider_id).cloned()
    }

    async fn set(&self, provider_id: &str, credential: &str) -> Result<()> {
        self.keys
            .write()
            .await
            .insert(provider_id.to_string(), credential.to_string());
        Ok(())
    }

    async fn remove(&self, provider_id: &str) -> Result<()> {
        self.keys.write().await.remove(provider_id);
        Ok(())
    }
}

/// Credentials persisted as a JSON map in a single file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    cache: Arc<RwLock<HashMap<String, String>>>,
    path: PathBuf,
}

impl FileCredentialStore {
    /// Open the store, loading any existing keys from `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let cache = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let keys: HashMap<String, String> = serde_json::from_str(&content)?;
            tracing::debug!("Loaded {} credentials from {}", keys.len(), path.display());
            keys
        } else {
            HashMap::new()
        };

        Ok(Self {
            cache: Arc::new(RwLock::new(cache)),
            path: path.to_path_buf(),
        })
    }

    async fn persist(&self, keys: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(keys)?;
        tokio::fs::write(&self.path, content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, provider_id: &str) -> Option<String> {
        self.cache.read().await.get(provider_id).cloned()
    }

    async fn set(&self, provider_id: &str, credential: &str) -> Result<()> {
        let mut cache = self.cache.write().await;
        cache.insert(provider_id.to_string(), credential.to_string());
        self.persist(&cache).await?;
        tracing::info!("Stored credential for provider {}", provider_id);
        Ok(())
    }

    async fn remove(&self, provider_id: &str) -> Result<()> {
        let mut cache = self.cache.write().await;
        if cache.remove(provider_id).is_some() {
            self.persist(&cache).await?;
            tracing::info!("Removed credential for provider {}", provider_id);
        }
        Ok(())
    }
}
