use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Similarity thresholds used by the duplicate and release matchers.
///
/// The defaults match the tuning the bucket was audited with historically,
/// but they are deployment configuration, not constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchThresholds {
    /// Two titles match above this similarity.
    #[serde(default = "default_title_threshold")]
    pub title_threshold: f64,

    /// Two artist names match above this similarity.
    #[serde(default = "default_artist_threshold")]
    pub artist_threshold: f64,

    /// Durations this close (in seconds) count as the same recording.
    /// Only consulted on the duplicate path; release matching is
    /// title/artist only.
    #[serde(default = "default_duration_tolerance")]
    pub duration_tolerance_secs: u32,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            title_threshold: default_title_threshold(),
            artist_threshold: default_artist_threshold(),
            duration_tolerance_secs: default_duration_tolerance(),
        }
    }
}

impl MatchThresholds {
    /// Whether a title similarity clears the bar.
    #[must_use]
    pub fn title_matches(&self, score: f64) -> bool {
        score > self.title_threshold
    }

    /// Whether an artist similarity clears the bar.
    #[must_use]
    pub fn artist_matches(&self, score: f64) -> bool {
        score > self.artist_threshold
    }

    /// Whether two durations are close enough to be the same recording.
    #[must_use]
    pub const fn duration_within(&self, a: u32, b: u32) -> bool {
        a.abs_diff(b) < self.duration_tolerance_secs
    }
}

const fn default_duration_tolerance() -> u32 {
    30
}

fn default_title_threshold() -> f64 {
    0.8
}

fn default_artist_threshold() -> f64 {
    0.6
}

/// Configuration for dubplate.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (DUB_* prefix)
/// 3. Config file (~/.config/dubplate/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bearer token for the fingerprint bucket service (required).
    ///
    /// Can be set via:
    /// - ENV: DUB_BUCKET_API_TOKEN
    /// - Config: bucket_api_token = "..."
    pub bucket_api_token: Option<String>,

    /// Identifier of the bucket to audit (required).
    ///
    /// Can be set via:
    /// - ENV: DUB_BUCKET_ID
    /// - Config: bucket_id = "..."
    pub bucket_id: Option<String>,

    /// Catalog client id for the released-track check (optional; the
    /// check is skipped without it).
    ///
    /// Can be set via:
    /// - ENV: DUB_CATALOG_CLIENT_ID
    /// - Config: catalog_client_id = "..."
    pub catalog_client_id: Option<String>,

    /// Catalog client secret for the released-track check (optional).
    ///
    /// Can be set via:
    /// - ENV: DUB_CATALOG_CLIENT_SECRET
    /// - Config: catalog_client_secret = "..."
    pub catalog_client_secret: Option<String>,

    /// Path to the SQLite metadata database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: DUB_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/dubplate/dubplate.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Similarity thresholds (config file only).
    #[serde(default)]
    pub matching: MatchThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket_api_token: None,
            bucket_id: None,
            catalog_client_id: None,
            catalog_client_secret: None,
            database_path: default_db_path(),
            matching: MatchThresholds::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/dubplate/config.toml
    /// Reads environment variables with DUB_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("dub");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with a custom database path.
    ///
    /// This is used when the --db CLI flag is provided.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }

    /// Whether the released-track check can run at all.
    #[must_use]
    pub const fn has_catalog_credentials(&self) -> bool {
        self.catalog_client_id.is_some() && self.catalog_client_secret.is_some()
    }
}

/// Get the default database path.
///
/// Returns: ~/.local/share/dubplate/dubplate.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dubplate")
        .join("dubplate.db")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/dubplate/config.toml
/// - macOS: ~/Library/Application Support/dubplate/config.toml
/// - Windows: %APPDATA%\dubplate\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dubplate")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Dubplate Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (DUB_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Bearer token for the fingerprint bucket service (required).
# The validation run cannot start without it.
#bucket_api_token = "your-bucket-api-token"

# Identifier of the bucket holding the unreleased-track fingerprints.
#bucket_id = "your-bucket-id"

# Catalog credentials for the released-track check. Optional: without
# them the duplicate audit still runs and the released check is skipped
# with a warning.
#catalog_client_id = "your-catalog-client-id"
#catalog_client_secret = "your-catalog-client-secret"

# Path to the SQLite metadata database.
#
# Can also be set via:
# - CLI: dubplate --db /custom/path.db
# - Environment: DUB_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/dubplate.db"

# Similarity thresholds for the matchers.
#[matching]
#title_threshold = 0.8
#artist_threshold = 0.6
#duration_tolerance_secs = 30
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
