//! Configuration loading from TOML with environment overrides.

use crate::cache::CacheSettings;
use crate::error::Result;
use crate::search::Language;
use crate::types::Threshold;
use anyhow::{Context, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the tracker OAuth token.
pub const TOKEN_ENV: &str = "TRACKER_TOKEN";
/// Environment variable holding the tracker organization id.
pub const ORG_ID_ENV: &str = "TRACKER_ORG_ID";
/// Environment variable holding the issue filter query.
pub const FILTER_ENV: &str = "TRACKER_FILTER";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: f64,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub serve_stale_on_error: bool,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// File this configuration was read from, `None` for built-in defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub filter: String,
    /// Base URL for browsable issue links, e.g. `https://tracker.example.com`
    #[serde(default)]
    pub issue_url_base: Option<String>,
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

fn default_cache_file() -> PathBuf {
    PathBuf::from("issues.json")
}
fn default_ttl_secs() -> u64 {
    60 * 60
}
fn default_fetch_timeout_secs() -> u64 {
    30
}
fn default_top_n() -> usize {
    crate::search::DEFAULT_TOP_N
}
fn default_duplicate_threshold() -> f64 {
    Threshold::DEFAULT.value()
}
fn default_api_url() -> String {
    "https://api.tracker.yandex.net".to_string()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            org_id: None,
            token: None,
            filter: String::new(),
            issue_url_base: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_file: default_cache_file(),
            ttl_secs: default_ttl_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            top_n: default_top_n(),
            duplicate_threshold: default_duplicate_threshold(),
            language: Language::default(),
            serve_stale_on_error: false,
            log_format: LogFormat::default(),
            tracker: TrackerConfig::default(),
            source: None,
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or from the default location when `None`.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// explicit path is an error. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Overlay secrets and the filter from the environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(TOKEN_ENV) {
            self.tracker.token = Some(token);
        }
        if let Some(org_id) = lookup(ORG_ID_ENV) {
            self.tracker.org_id = Some(org_id);
        }
        if let Some(filter) = lookup(FILTER_ENV) {
            self.tracker.filter = filter;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.ttl_secs == 0 {
            bail!("ttl_secs must be greater than zero");
        }
        if self.fetch_timeout_secs == 0 {
            bail!("fetch_timeout_secs must be greater than zero");
        }
        if self.top_n == 0 {
            bail!("top_n must be greater than zero");
        }
        Threshold::new(self.duplicate_threshold).context("Invalid duplicate_threshold")?;
        Ok(())
    }

    pub fn threshold(&self) -> Result<Threshold> {
        Threshold::new(self.duplicate_threshold).context("Invalid duplicate_threshold")
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            path: self.cache_file.clone(),
            ttl: Duration::from_secs(self.ttl_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            filter: self.tracker.filter.clone(),
            serve_stale_on_error: self.serve_stale_on_error,
            link_base: self.tracker.issue_url_base.clone(),
        }
    }
}

/// `<config_dir>/tracker-dedup/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tracker-dedup").join("config.toml"))
}
