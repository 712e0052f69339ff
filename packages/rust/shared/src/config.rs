//! Application configuration for AccountPlan.
//!
//! User config lives at `~/.accountplan/accountplan.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AccountPlanError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "accountplan.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".accountplan";

// ---------------------------------------------------------------------------
// Config structs (matching accountplan.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source adapter settings.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Fact extraction settings.
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Upper bound for a single attempt against one source.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Override for the HTTP User-Agent header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub wikipedia: WikipediaConfig,

    #[serde(default)]
    pub duckduckgo: DuckDuckGoConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: None,
            wikipedia: WikipediaConfig::default(),
            duckduckgo: DuckDuckGoConfig::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

/// `[sources.wikipedia]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikipediaConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// REST API root; the adapter appends `/page/summary/{title}`.
    #[serde(default = "default_wikipedia_url")]
    pub base_url: String,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_wikipedia_url(),
        }
    }
}

fn default_wikipedia_url() -> String {
    "https://en.wikipedia.org/api/rest_v1".into()
}

/// `[sources.duckduckgo]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuckDuckGoConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Instant Answer API root.
    #[serde(default = "default_duckduckgo_url")]
    pub base_url: String,
}

impl Default for DuckDuckGoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_duckduckgo_url(),
        }
    }
}

fn default_duckduckgo_url() -> String {
    "https://api.duckduckgo.com".into()
}

fn default_true() -> bool {
    true
}

/// `[extraction]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Earliest year accepted as a founding year.
    #[serde(default = "default_min_year")]
    pub min_year: i32,

    /// Latest year accepted; defaults to the current year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i32>,

    /// Maximum characters between a founding keyword and a year token.
    #[serde(default = "default_keyword_window")]
    pub keyword_window: usize,

    /// Upper bound on the summary fact length.
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    /// Words that mark a nearby year as a founding year.
    #[serde(default = "default_founding_keywords")]
    pub founding_keywords: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_year: default_min_year(),
            max_year: None,
            keyword_window: default_keyword_window(),
            summary_max_chars: default_summary_max_chars(),
            founding_keywords: default_founding_keywords(),
        }
    }
}

fn default_min_year() -> i32 {
    1600
}
fn default_keyword_window() -> usize {
    60
}
fn default_summary_max_chars() -> usize {
    600
}
fn default_founding_keywords() -> Vec<String> {
    ["founded", "established", "incorporated", "formed", "founding"]
        .into_iter()
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Extraction rules (runtime, resolved from config)
// ---------------------------------------------------------------------------

/// Runtime extraction rules with the year range fully resolved.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    pub min_year: i32,
    pub max_year: i32,
    pub keyword_window: usize,
    pub summary_max_chars: usize,
    pub founding_keywords: Vec<String>,
}

impl From<&AppConfig> for ExtractionRules {
    fn from(config: &AppConfig) -> Self {
        let extraction = &config.extraction;
        Self {
            min_year: extraction.min_year,
            max_year: extraction.max_year.unwrap_or_else(|| Utc::now().year()),
            keyword_window: extraction.keyword_window,
            summary_max_chars: extraction.summary_max_chars,
            founding_keywords: extraction.founding_keywords.clone(),
        }
    }
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.accountplan/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AccountPlanError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.accountplan/accountplan.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| AccountPlanError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        AccountPlanError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    validate(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AccountPlanError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| AccountPlanError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AccountPlanError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

fn validate(config: &AppConfig) -> Result<()> {
    if config.sources.timeout_secs == 0 {
        return Err(AccountPlanError::config("sources.timeout_secs must be at least 1"));
    }
    if let Some(max) = config.extraction.max_year {
        if max < config.extraction.min_year {
            return Err(AccountPlanError::config(format!(
                "extraction.max_year ({max}) is before min_year ({})",
                config.extraction.min_year
            )));
        }
    }
    if config.extraction.founding_keywords.iter().all(|k| k.trim().is_empty()) {
        return Err(AccountPlanError::config(
            "extraction.founding_keywords must contain at least one keyword",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("timeout_secs"));
        assert!(toml_str.contains("en.wikipedia.org"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.sources.timeout_secs, 10);
        assert_eq!(parsed.extraction.min_year, 1600);
        assert!(parsed.sources.duckduckgo.enabled);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[sources]
timeout_secs = 3

[sources.duckduckgo]
enabled = false

[extraction]
max_year = 2020
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.sources.timeout_secs, 3);
        assert!(!config.sources.duckduckgo.enabled);
        assert!(config.sources.wikipedia.enabled);
        assert_eq!(config.extraction.keyword_window, 60);

        let rules = ExtractionRules::from(&config);
        assert_eq!(rules.max_year, 2020);
        assert_eq!(rules.founding_keywords.len(), 5);
    }

    #[test]
    fn rules_default_to_current_year() {
        let rules = ExtractionRules::default();
        assert_eq!(rules.max_year, Utc::now().year());
        assert_eq!(rules.min_year, 1600);
    }

    #[test]
    fn load_rejects_inverted_year_range() {
        let dir = std::env::temp_dir().join(format!("ap-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("bad.toml");
        std::fs::write(&path, "[extraction]\nmin_year = 1900\nmax_year = 1800\n")
            .expect("write config");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("max_year"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
