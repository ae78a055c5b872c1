//! Provider catalog.
//!
//! The catalog is an immutable snapshot rebuilt wholesale from the built-ins
//! and the custom provider directory after every add or delete. Readers keep
//! whatever snapshot they fetched; they never see a half-applied change.

use super::{builtin_providers, validate_id, Provider};
use crate::error::{ClipwiseError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, instrument, warn};

/// Built-in plus user-defined providers.
pub struct ProviderRepository {
    custom_dir: Option<PathBuf>,
    catalog: RwLock<Arc<Vec<Provider>>>,
    /// Custom provider id to the file it was loaded from.
    sources: RwLock<HashMap<String, PathBuf>>,
}

impl ProviderRepository {
    /// Catalog backed by `custom_dir`, loaded immediately.
    pub fn new(custom_dir: &Path) -> Result<Self> {
        let repo = Self {
            custom_dir: Some(custom_dir.to_path_buf()),
            catalog: RwLock::new(Arc::new(Vec::new())),
            sources: RwLock::new(HashMap::new()),
        };
        repo.reload()?;
        Ok(repo)
    }

    /// Catalog with built-ins only and no persistence.
    pub fn builtin_only() -> Self {
        Self {
            custom_dir: None,
            catalog: RwLock::new(Arc::new(builtin_providers())),
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuild the catalog from the built-ins and the custom directory.
    #[instrument(skip(self))]
    pub fn reload(&self) -> Result<()> {
        let mut providers = builtin_providers();
        let mut sources = HashMap::new();

        if let Some(dir) = &self.custom_dir {
            for (path, custom) in load_custom_dir(dir)? {
                if providers.iter().any(|p| p.id == custom.id) {
                    warn!("Ignoring custom provider '{}': id is already taken", custom.id);
                    continue;
                }
                sources.insert(custom.id.clone(), path);
                providers.push(custom);
            }
        }

        info!("Loaded {} providers", providers.len());
        let mut catalog = self.catalog.write().map_err(lock_poisoned)?;
        let mut current_sources = self.sources.write().map_err(lock_poisoned)?;
        *catalog = Arc::new(providers);
        *current_sources = sources;
        Ok(())
    }

    /// Current snapshot of all providers.
    pub fn all(&self) -> Arc<Vec<Provider>> {
        self.catalog
            .read()
            .map(|c| Arc::clone(&c))
            .unwrap_or_else(|poisoned| Arc::clone(&poisoned.into_inner()))
    }

    pub fn get(&self, id: &str) -> Option<Provider> {
        self.all().iter().find(|p| p.id == id).cloned()
    }

    pub fn is_builtin(id: &str) -> bool {
        builtin_providers().iter().any(|p| p.id == id)
    }

    /// Look up a provider and apply an optional model override.
    pub fn resolve(&self, id: &str, model_override: Option<&str>) -> Result<Provider> {
        let provider = self
            .get(id)
            .ok_or_else(|| ClipwiseError::ProviderNotFound(id.to_string()))?;

        match model_override.map(str::trim).filter(|m| !m.is_empty()) {
            None => Ok(provider),
            Some(model) => {
                if !provider.available_models.is_empty()
                    && !provider.available_models.iter().any(|m| m == model)
                {
                    return Err(ClipwiseError::ModelNotFound {
                        provider_id: id.to_string(),
                        model: model.to_string(),
                    });
                }
                Ok(provider.with_model(model))
            }
        }
    }

    /// Add or replace a custom provider and reload the catalog.
    #[instrument(skip(self, provider), fields(provider_id = %provider.id))]
    pub fn save_custom(&self, provider: &Provider) -> Result<()> {
        provider.validate()?;

        if Self::is_builtin(&provider.id) {
            return Err(ClipwiseError::InvalidInput(format!(
                "'{}' is a built-in provider id",
                provider.id
            )));
        }

        let dir = self.custom_dir()?;
        std::fs::create_dir_all(dir)?;
        let content = serde_json::to_string_pretty(provider)?;
        let path = dir.join(format!("{}.json", provider.id));
        std::fs::write(&path, content)?;

        // A replaced provider may have come from a differently named file.
        if let Some(old) = self.source_of(&provider.id).filter(|old| *old != path) {
            std::fs::remove_file(&old)?;
        }

        self.reload()
    }

    /// Delete a custom provider. Built-in ids are left untouched.
    ///
    /// Returns whether a provider was removed.
    #[instrument(skip(self))]
    pub fn delete(&self, id: &str) -> Result<bool> {
        validate_id(id)?;
        if Self::is_builtin(id) {
            return Ok(false);
        }

        self.custom_dir()?;
        let Some(path) = self.source_of(id) else {
            return Ok(false);
        };

        std::fs::remove_file(&path)?;
        self.reload()?;
        Ok(true)
    }

    /// File a custom provider was loaded from.
    fn source_of(&self, id: &str) -> Option<PathBuf> {
        self.sources
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    fn custom_dir(&self) -> Result<&Path> {
        self.custom_dir
            .as_deref()
            .ok_or_else(|| ClipwiseError::Config("no custom provider directory configured".into()))
    }
}

fn lock_poisoned<T>(_: T) -> ClipwiseError {
    ClipwiseError::Unknown("provider catalog lock poisoned".into())
}

fn load_custom_dir(dir: &Path) -> Result<Vec<(PathBuf, Provider)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut providers = Vec::new();
    for path in paths {
        let parsed = std::fs::read_to_string(&path)
            .map_err(ClipwiseError::from)
            .and_then(|content| serde_json::from_str::<Provider>(&content).map_err(Into::into))
            .and_then(|provider| provider.validate().map(|_| provider));

        match parsed {
            Ok(provider) => {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                if stem != provider.id {
                    warn!(
                        "Provider file {} declares id '{}'; using the declared id",
                        path.display(),
                        provider.id
                    );
                }
                if providers.iter().any(|(_, p): &(PathBuf, Provider)| p.id == provider.id) {
                    warn!("Duplicate custom provider id '{}' in {}", provider.id, path.display());
                    continue;
                }
                providers.push((path, provider));
            }
            Err(e) => warn!("Skipping provider file {}: {}", path.display(), e),
        }
    }

    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(id: &str) -> Provider {
        let mut provider = builtin_providers().remove(0);
        provider.id = id.to_string();
        provider.display_name = format!("Custom {id}");
        provider.available_models = vec![];
        provider
    }

    #[test]
    fn test_builtin_only() {
        let repo = ProviderRepository::builtin_only();
        assert!(repo.get("openai").is_some());
        assert!(repo.get("missing").is_none());
        assert!(repo.save_custom(&custom("mine")).is_err());
    }

    #[test]
    fn test_save_reload_and_delete_custom() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ProviderRepository::new(dir.path()).unwrap();
        let before = repo.all().len();

        let snapshot = repo.all();
        repo.save_custom(&custom("local-llm")).unwrap();
        assert_eq!(snapshot.len(), before);
        assert_eq!(repo.all().len(), before + 1);
        assert!(dir.path().join("local-llm.json").exists());

        let reopened = ProviderRepository::new(dir.path()).unwrap();
        assert_eq!(
            reopened.get("local-llm").unwrap().display_name,
            "Custom local-llm"
        );

        assert!(repo.delete("local-llm").unwrap());
        assert!(repo.get("local-llm").is_none());
        assert!(!repo.delete("local-llm").unwrap());
    }

    #[test]
    fn test_builtin_ids_cannot_be_replaced_or_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ProviderRepository::new(dir.path()).unwrap();

        assert!(matches!(
            repo.save_custom(&custom("openai")),
            Err(ClipwiseError::InvalidInput(_))
        ));
        assert!(!repo.delete("openai").unwrap());
        assert!(repo.get("openai").is_some());
    }

    #[test]
    fn test_delete_rejects_path_like_ids() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("providers");
        let secrets = root.path().join("credentials.json");
        std::fs::write(&secrets, "{}").unwrap();

        let repo = ProviderRepository::new(&dir).unwrap();
        assert!(matches!(
            repo.delete("../credentials"),
            Err(ClipwiseError::InvalidInput(_))
        ));
        assert!(secrets.exists());
    }

    #[test]
    fn test_delete_uses_the_file_a_provider_came_from() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("other-name.json");
        std::fs::write(&file, serde_json::to_string(&custom("x")).unwrap()).unwrap();

        let repo = ProviderRepository::new(dir.path()).unwrap();
        assert!(repo.get("x").is_some());

        assert!(repo.delete("x").unwrap());
        assert!(!file.exists());
        assert!(repo.get("x").is_none());
        assert!(ProviderRepository::new(dir.path()).unwrap().get("x").is_none());
    }

    #[test]
    fn test_save_replaces_differently_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("other-name.json");
        std::fs::write(&file, serde_json::to_string(&custom("x")).unwrap()).unwrap();

        let repo = ProviderRepository::new(dir.path()).unwrap();
        let mut updated = custom("x");
        updated.display_name = "Renamed".to_string();
        repo.save_custom(&updated).unwrap();

        assert!(!file.exists());
        assert!(dir.path().join("x.json").exists());
        assert_eq!(repo.get("x").unwrap().display_name, "Renamed");
    }

    #[test]
    fn test_invalid_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let repo = ProviderRepository::new(dir.path()).unwrap();
        assert_eq!(repo.all().len(), builtin_providers().len());
    }

    #[test]
    fn test_resolve_model_override() {
        let repo = ProviderRepository::builtin_only();

        let provider = repo.resolve("openai", Some("gpt-4o")).unwrap();
        assert_eq!(provider.model, "gpt-4o");

        let default = repo.resolve("openai", None).unwrap();
        assert_eq!(default.model, "gpt-4o-mini");

        assert!(matches!(
            repo.resolve("openai", Some("made-up")),
            Err(ClipwiseError::ModelNotFound { .. })
        ));
        assert!(matches!(
            repo.resolve("nope", None),
            Err(ClipwiseError::ProviderNotFound(_))
        ));
    }
}
