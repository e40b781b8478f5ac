//! Application configuration for BizDir.
//!
//! User config lives at `~/.bizdir/bizdir.toml`. Environment variables
//! (`BIZDIR_BASE_URL`, `BIZDIR_DB_PATH`) override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BizdirError, Result};
use crate::types::DEFAULT_LANG;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "bizdir.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".bizdir";

/// Env var overriding the public base URL.
pub const ENV_BASE_URL: &str = "BIZDIR_BASE_URL";

/// Env var overriding the data store path.
pub const ENV_DB_PATH: &str = "BIZDIR_DB_PATH";

// ---------------------------------------------------------------------------
// Config structs (matching bizdir.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Public site settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Data store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public base URL used for canonical and sitemap `loc` construction.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// `Crawl-delay` value advertised in robots.txt, in seconds.
    #[serde(default = "default_crawl_delay")]
    pub crawl_delay_secs: u64,

    /// Language code for the baseline SEO tier.
    #[serde(default = "default_lang")]
    pub default_lang: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            crawl_delay_secs: default_crawl_delay(),
            default_lang: default_lang(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".into()
}
fn default_crawl_delay() -> u64 {
    10
}
fn default_lang() -> String {
    DEFAULT_LANG.into()
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the libSQL database file. A leading `~` expands to home.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "~/.bizdir/bizdir.db".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.bizdir/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BizdirError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.bizdir/bizdir.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk with env overrides applied.
/// Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    let mut config = if path.exists() {
        load_config_from(&path)?
    } else {
        tracing::debug!(?path, "config file not found, using defaults");
        AppConfig::default()
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Load the application config from a specific file path. No env overrides.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BizdirError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        BizdirError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Apply `BIZDIR_*` environment overrides on top of file/default values.
pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(val) = std::env::var(ENV_BASE_URL) {
        if !val.is_empty() {
            config.site.base_url = val;
        }
    }
    if let Ok(val) = std::env::var(ENV_DB_PATH) {
        if !val.is_empty() {
            config.store.db_path = val;
        }
    }
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BizdirError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BizdirError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BizdirError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the configured base URL parses as an absolute URL.
pub fn validate_base_url(config: &AppConfig) -> Result<()> {
    Url::parse(&config.site.base_url).map_err(|e| {
        BizdirError::config(format!(
            "invalid site.base_url '{}': {e}",
            config.site.base_url
        ))
    })?;
    Ok(())
}

/// Resolve the store path, expanding a leading `~` to the home directory.
pub fn resolve_db_path(config: &AppConfig) -> Result<PathBuf> {
    let raw = &config.store.db_path;
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| BizdirError::config("could not determine home directory"))?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("db_path"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.site.base_url, "http://localhost:3000");
        assert_eq!(parsed.site.crawl_delay_secs, 10);
        assert_eq!(parsed.site.default_lang, DEFAULT_LANG);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[site]
base_url = "https://www.citybiz.example"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.site.base_url, "https://www.citybiz.example");
        assert_eq!(config.site.crawl_delay_secs, 10);
        assert_eq!(config.store.db_path, "~/.bizdir/bizdir.db");
    }

    #[test]
    fn env_override_beats_file_value() {
        // Unique var names would be better, but the override keys are fixed;
        // restore the previous state so other tests are unaffected.
        let prev = std::env::var(ENV_BASE_URL).ok();
        // SAFETY: test-only env mutation, restored below.
        unsafe { std::env::set_var(ENV_BASE_URL, "https://override.example") };

        let mut config = AppConfig::default();
        apply_env_overrides(&mut config);
        assert_eq!(config.site.base_url, "https://override.example");

        unsafe {
            match prev {
                Some(v) => std::env::set_var(ENV_BASE_URL, v),
                None => std::env::remove_var(ENV_BASE_URL),
            }
        }
    }

    #[test]
    fn base_url_validation() {
        let mut config = AppConfig::default();
        assert!(validate_base_url(&config).is_ok());

        config.site.base_url = "not a url".into();
        let result = validate_base_url(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("base_url"));
    }

    #[test]
    fn db_path_tilde_expansion() {
        let config = AppConfig::default();
        let path = resolve_db_path(&config).expect("resolve db path");
        assert!(path.is_absolute());
        assert!(path.ends_with(".bizdir/bizdir.db"));

        let mut config = AppConfig::default();
        config.store.db_path = "/var/lib/bizdir/bizdir.db".into();
        let path = resolve_db_path(&config).expect("resolve absolute path");
        assert_eq!(path, PathBuf::from("/var/lib/bizdir/bizdir.db"));
    }
}
