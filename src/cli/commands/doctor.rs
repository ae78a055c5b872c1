//! Doctor command - verify system requirements and configuration.

use crate::cli::{format_size, Output};
use crate::config::Settings;
use crate::providers::{CredentialStore, FileCredentialStore, ProviderRepository};
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Clipwise Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    // Check external tools
    println!("{}", style("External Tools").bold());
    let tool_checks = vec![
        check_tool(
            "yt-dlp",
            &settings.download.ytdlp_path,
            "--version",
            install_hint_ytdlp(),
        ),
        check_tool(
            "ffmpeg",
            &settings.transcode.ffmpeg_path,
            "-version",
            install_hint_ffmpeg(),
        ),
    ];
    for check in &tool_checks {
        check.print();
    }
    checks.extend(tool_checks);

    println!();

    // Check providers and keys
    println!("{}", style("AI Provider").bold());
    let provider_checks = check_default_provider(settings).await;
    for check in &provider_checks {
        check.print();
    }
    checks.extend(provider_checks);

    println!();

    // Check directories
    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    // Check configuration
    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Clipwise.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!(
            "All checks passed with {} warning(s).",
            warnings
        ));
    } else {
        Output::success("All checks passed! Clipwise is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, binary: &str, version_arg: &str, hint: &str) -> CheckResult {
    match Command::new(binary).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            // Try to extract version from first line
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            // Truncate long version strings
            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, &format!("'{}' not found", binary), hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check the default provider resolves and has a key.
async fn check_default_provider(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();
    let provider_id = &settings.defaults.provider_id;

    let repository = match ProviderRepository::new(&settings.providers_dir()) {
        Ok(repository) => repository,
        Err(e) => {
            results.push(CheckResult::error(
                "Providers",
                &format!("failed to load: {}", e),
                "Fix or remove the broken JSON file in the providers directory",
            ));
            return results;
        }
    };

    match repository.resolve(provider_id, settings.defaults.model.as_deref()) {
        Ok(provider) => results.push(CheckResult::ok(
            "Default provider",
            &format!("{} ({})", provider.display_name, provider.model),
        )),
        Err(e) => results.push(CheckResult::error(
            "Default provider",
            &e.to_string(),
            "Set defaults.provider_id to one of `clipwise providers list`",
        )),
    }

    let key = match FileCredentialStore::open(&settings.credentials_path()) {
        Ok(store) => store.get(provider_id).await,
        Err(e) => {
            results.push(CheckResult::error(
                "API key",
                &format!("credential store unreadable: {}", e),
                &format!("Check {}", settings.credentials_path().display()),
            ));
            return results;
        }
    };

    results.push(match key {
        Some(key) if !key.trim().is_empty() => {
            CheckResult::ok("API key", &format!("configured ({})", mask_key(&key)))
        }
        _ => CheckResult::warning(
            "API key",
            &format!("none stored for '{}'", provider_id),
            &format!("Set with: clipwise key set {} <key>", provider_id),
        ),
    });

    results
}

/// First and last four characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check data directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok(
            "Data directory",
            &format!("{}", data_dir.display()),
        ));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let downloads_dir = settings.downloads_dir();
    if downloads_dir.exists() {
        let files = std::fs::read_dir(&downloads_dir)
            .map(|entries| entries.filter_map(|e| e.ok()).collect::<Vec<_>>())
            .unwrap_or_default();
        let bytes: u64 = files
            .iter()
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum();
        results.push(CheckResult::ok(
            "Downloads",
            &format!("{} ({} files, {})", downloads_dir.display(), files.len(), format_size(bytes)),
        ));
    } else {
        results.push(CheckResult::warning(
            "Downloads",
            &format!("{} (not created yet)", downloads_dir.display()),
            "Directory will be created on first download",
        ));
    }

    results
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Write one with: clipwise config show > $(clipwise config path)",
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}
