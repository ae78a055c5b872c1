//! Config command implementation.

use crate::cli::ConfigAction;
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: &Settings, config_path: Option<&str>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            let path = config_path
                .map(Settings::expand_path)
                .unwrap_or_else(Settings::default_config_path);
            println!("{}", path.display());
        }
    }

    Ok(())
}
