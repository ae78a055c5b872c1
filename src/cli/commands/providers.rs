//! Providers command implementation.

use crate::cli::{Output, ProvidersAction};
use crate::config::Settings;
use crate::providers::{CredentialStore, FileCredentialStore, Provider, ProviderRepository};
use anyhow::{Context, Result};

/// Run the providers command.
pub async fn run_providers(action: &ProvidersAction, settings: &Settings) -> Result<()> {
    let repository = ProviderRepository::new(&settings.providers_dir())?;

    match action {
        ProvidersAction::List => {
            let credentials = FileCredentialStore::open(&settings.credentials_path())?;
            Output::header("Providers");
            for provider in repository.all().iter() {
                let origin = if ProviderRepository::is_builtin(&provider.id) {
                    "built-in"
                } else {
                    "custom"
                };
                let key = if credentials.contains(&provider.id).await {
                    "key set"
                } else {
                    "no key"
                };
                let marker = if provider.id == settings.defaults.provider_id {
                    " (default)"
                } else {
                    ""
                };
                Output::list_item(&format!(
                    "{}{} - {} [{}, {}, model {}]",
                    provider.id, marker, provider.display_name, origin, key, provider.model
                ));
            }
        }

        ProvidersAction::Show { id } => {
            let provider = repository.resolve(id, None)?;
            println!("{}", serde_json::to_string_pretty(&provider)?);
        }

        ProvidersAction::Add { file } => {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let provider: Provider = serde_json::from_str(&content)
                .with_context(|| format!("{} is not a valid provider definition", file.display()))?;
            repository.save_custom(&provider)?;
            Output::success(&format!("Saved provider '{}'", provider.id));
            Output::info(&format!(
                "Store its key with: clipwise key set {} <key>",
                provider.id
            ));
        }

        ProvidersAction::Remove { id } => {
            if ProviderRepository::is_builtin(id) {
                Output::warning(&format!("'{}' is built in and cannot be removed.", id));
            } else if repository.delete(id)? {
                Output::success(&format!("Removed provider '{}'", id));
            } else {
                Output::warning(&format!("No custom provider '{}'", id));
            }
        }
    }

    Ok(())
}
