use anyhow::{Context, Result};
use std::path::PathBuf;

use dubplate_audit::config::Config;

pub mod config;
pub mod reconcile;
pub mod status;
pub mod validate;

pub use config::run_config;
pub use reconcile::run_reconcile;
pub use status::show_status;
pub use validate::run_validate;

/// Load configuration, honouring the --db override, and make sure the
/// database directory exists.
fn load_config(db: Option<PathBuf>) -> Result<Config> {
    let config = match db {
        Some(path) => Config::load_with_db_path(path)?,
        None => Config::load()?,
    };

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    Ok(config)
}

/// Bucket credentials, or a pointer at the config docs when missing.
fn bucket_credentials(config: &Config) -> Result<(String, String)> {
    let token = config
        .bucket_api_token
        .clone()
        .context("bucket_api_token is not set; run `dubplate config init` and edit the file, or set DUB_BUCKET_API_TOKEN")?;
    let bucket_id = config
        .bucket_id
        .clone()
        .context("bucket_id is not set; run `dubplate config init` and edit the file, or set DUB_BUCKET_ID")?;
    Ok((token, bucket_id))
}
