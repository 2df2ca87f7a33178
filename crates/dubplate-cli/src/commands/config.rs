use anyhow::Result;

use dubplate_audit::config::{self, Config};

#[derive(Debug, clap::Subcommand)]
pub enum ConfigAction {
    /// Show the current effective configuration
    Show,
    /// Create a starter config file
    Init,
    /// Print the config file path
    Path,
}

pub fn run_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => show_config(),
        ConfigAction::Init => init_config(),
        ConfigAction::Path => show_path(),
    }
}

/// Show the current effective configuration.
fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!(
        "File exists: {}\n",
        if exists { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!("  bucket_api_token: {}", mask(config.bucket_api_token.as_deref()));
    println!(
        "  bucket_id: {}",
        config.bucket_id.as_deref().unwrap_or("<not set>")
    );
    println!(
        "  catalog_client_id: {}",
        config.catalog_client_id.as_deref().unwrap_or("<not set>")
    );
    println!(
        "  catalog_client_secret: {}",
        mask(config.catalog_client_secret.as_deref())
    );
    println!("  database_path: {}", config.database_path.display());
    println!("  matching.title_threshold: {}", config.matching.title_threshold);
    println!("  matching.artist_threshold: {}", config.matching.artist_threshold);
    println!(
        "  matching.duration_tolerance_secs: {}",
        config.matching.duration_tolerance_secs
    );

    println!("\nPriority: CLI args > ENV vars (DUB_*) > Config file > Defaults");

    Ok(())
}

/// Secrets are reported as set or unset, never echoed.
fn mask(value: Option<&str>) -> &'static str {
    match value {
        Some(_) => "<set>",
        None => "<not set>",
    }
}

/// Initialize config file with defaults.
fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure dubplate.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}

/// Show the config file path.
fn show_path() -> Result<()> {
    let config_path = config::config_file_path();
    println!("{}", config_path.display());
    Ok(())
}
