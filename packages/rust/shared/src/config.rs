//! Application configuration for schedkit.
//!
//! User config lives at `~/.schedkit/schedkit.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SchedKitError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "schedkit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".schedkit";

// ---------------------------------------------------------------------------
// Config structs (matching schedkit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Schedule crawl settings.
    #[serde(default)]
    pub crawl: CrawlSettings,

    /// Reference table overrides.
    #[serde(default)]
    pub tables: TablesConfig,
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSettings {
    /// Schedule root; each term is crawled from `<base_url>/<term>`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Terms crawled, in order, by `schedkit crawl` when neither `--term`
    /// nor `--url` is given.
    #[serde(default = "default_terms")]
    pub terms: Vec<String>,

    /// Minimum ms between page requests.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Upper bound on pages followed per term.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            terms: default_terms(),
            rate_limit_ms: default_rate_limit(),
            timeout_secs: default_timeout(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_base_url() -> String {
    "https://apps.fit.edu/schedule/main-campus".into()
}
fn default_terms() -> Vec<String> {
    vec!["spring".into(), "summer".into(), "fall".into()]
}
fn default_rate_limit() -> u64 {
    250
}
fn default_timeout() -> u64 {
    30
}
fn default_max_pages() -> u32 {
    500
}

/// `[tables]` section. Unset paths use the built-in tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TablesConfig {
    /// TOML file replacing the requirement-tag table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags_path: Option<String>,

    /// TOML file replacing the subject-code table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Crawl config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime crawl configuration.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Rate limit in ms between page requests.
    pub rate_limit_ms: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum pages followed along one pagination chain.
    pub max_pages: u32,
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            rate_limit_ms: config.crawl.rate_limit_ms,
            timeout_secs: config.crawl.timeout_secs,
            max_pages: config.crawl.max_pages,
        }
    }
}

impl CrawlSettings {
    /// Start URL for one term, e.g. `.../main-campus/spring`.
    pub fn term_url(&self, term: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url.trim_end_matches('/'), term);
        Url::parse(&raw).map_err(|e| SchedKitError::config(format!("invalid term URL '{raw}': {e}")))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.schedkit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SchedKitError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.schedkit/schedkit.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SchedKitError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SchedKitError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SchedKitError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| SchedKitError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SchedKitError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
