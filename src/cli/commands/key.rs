//! Key command implementation.

use crate::cli::{KeyAction, Output};
use crate::config::Settings;
use crate::providers::{CredentialStore, FileCredentialStore, ProviderRepository};
use anyhow::Result;

/// Run the key command.
pub async fn run_key(action: &KeyAction, settings: &Settings) -> Result<()> {
    let credentials = FileCredentialStore::open(&settings.credentials_path())?;

    match action {
        KeyAction::Set { provider, key } => {
            let repository = ProviderRepository::new(&settings.providers_dir())?;
            if repository.get(provider).is_none() {
                Output::warning(&format!(
                    "'{}' is not a known provider; storing the key anyway.",
                    provider
                ));
            }
            if key.trim().is_empty() {
                anyhow::bail!("The key is empty");
            }
            credentials.set(provider, key.trim()).await?;
            Output::success(&format!("Stored key for '{}'", provider));
        }

        KeyAction::Remove { provider } => {
            credentials.remove(provider).await?;
            Output::success(&format!("Removed key for '{}'", provider));
        }
    }

    Ok(())
}
