//! Application configuration structures.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::ComicSource;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Outbound HTTP settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Latest-identifier cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Notification mail settings
    #[serde(default)]
    pub mail: MailConfig,

    /// Record store settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Template location
    #[serde(default)]
    pub templates: TemplateConfig,

    /// Per-source overrides
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply deployment overrides from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("COMICWATCH_BIND") {
            self.server.addr = addr;
        }
        if let Ok(key) = std::env::var("COMICWATCH_MAIL_API_KEY") {
            self.mail.api_key = Some(key);
        }
        if let Ok(dir) = std::env::var("COMICWATCH_STORAGE_DIR") {
            self.storage.dir = PathBuf::from(dir);
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if self.cache.ttl_secs == 0 {
            return Err(AppError::validation("cache.ttl_secs must be > 0"));
        }
        if self.storage.fetch_limit == 0 {
            return Err(AppError::validation("storage.fetch_limit must be > 0"));
        }
        if self.mail.sender.trim().is_empty() || self.mail.recipient.trim().is_empty() {
            return Err(AppError::validation("mail.sender and mail.recipient are required"));
        }
        if self.server.addr.trim().is_empty() {
            return Err(AppError::validation("server.addr is empty"));
        }
        for source in ComicSource::ALL {
            let entry = self.sources.get(source);
            if entry.enabled {
                url::Url::parse(&entry.url).map_err(|e| {
                    AppError::validation(format!("sources.{source}.url is invalid: {e}"))
                })?;
            }
        }
        if self.sources.enabled().is_empty() {
            return Err(AppError::validation("No sources enabled"));
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Redirects followed before giving up
    #[serde(default = "defaults::max_redirects")]
    pub max_redirects: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_redirects: defaults::max_redirects(),
        }
    }
}

/// Cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a fetched identifier is reused
    #[serde(default = "defaults::ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::ttl(),
        }
    }
}

/// Notification mail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "defaults::mail_address")]
    pub sender: String,

    #[serde(default = "defaults::mail_address")]
    pub recipient: String,

    /// Mailgun-style messages endpoint. Mails are only logged when unset.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Basic auth user for the mail API
    #[serde(default = "defaults::api_user")]
    pub api_user: String,

    /// Basic auth password for the mail API
    #[serde(default)]
    pub api_key: Option<String>,

    /// Friendly names used in the subject line
    #[serde(default = "defaults::display_names")]
    pub display_names: HashMap<String, String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender: defaults::mail_address(),
            recipient: defaults::mail_address(),
            api_url: None,
            api_user: defaults::api_user(),
            api_key: None,
            display_names: defaults::display_names(),
        }
    }
}

/// Record store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    Memory,
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Root directory for the local backend
    #[serde(default = "defaults::storage_dir")]
    pub dir: PathBuf,

    /// Maximum records loaded per cron pass
    #[serde(default = "defaults::fetch_limit")]
    pub fetch_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            dir: defaults::storage_dir(),
            fetch_limit: defaults::fetch_limit(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::addr(),
        }
    }
}

/// Template settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Load `<source>.html` from this directory instead of the built-in set
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Settings for one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: String,

    #[serde(default = "defaults::enabled")]
    pub enabled: bool,
}

/// Settings for every known source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "defaults::xkcd")]
    pub xkcd: SourceConfig,

    #[serde(default = "defaults::smbc")]
    pub smbc: SourceConfig,

    #[serde(default = "defaults::jl8")]
    pub jl8: SourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            xkcd: defaults::xkcd(),
            smbc: defaults::smbc(),
            jl8: defaults::jl8(),
        }
    }
}

impl SourcesConfig {
    pub fn get(&self, source: ComicSource) -> &SourceConfig {
        match source {
            ComicSource::Xkcd => &self.xkcd,
            ComicSource::Smbc => &self.smbc,
            ComicSource::Jl8 => &self.jl8,
        }
    }

    /// Enabled sources in pass order.
    pub fn enabled(&self) -> Vec<ComicSource> {
        ComicSource::ALL
            .into_iter()
            .filter(|s| self.get(*s).enabled)
            .collect()
    }
}

mod defaults {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::SourceConfig;

    // Fetcher defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; comicwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn max_redirects() -> usize {
        10
    }

    // Cache defaults
    pub fn ttl() -> u64 {
        60 * 30
    }

    // Mail defaults
    pub fn mail_address() -> String {
        "comicwatch@localhost".into()
    }
    pub fn api_user() -> String {
        "api".into()
    }
    pub fn display_names() -> HashMap<String, String> {
        HashMap::from([
            ("smbc".to_string(), "SMBC".to_string()),
            ("jl8".to_string(), "JL8".to_string()),
        ])
    }

    // Storage defaults
    pub fn storage_dir() -> PathBuf {
        PathBuf::from("storage")
    }
    pub fn fetch_limit() -> usize {
        100
    }

    // Server defaults
    pub fn addr() -> String {
        "127.0.0.1:8080".into()
    }

    // Source defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn xkcd() -> SourceConfig {
        SourceConfig {
            url: "http://xkcd.com".into(),
            enabled: true,
        }
    }
    pub fn smbc() -> SourceConfig {
        SourceConfig {
            url: "http://smbc-comics.com".into(),
            enabled: true,
        }
    }
    pub fn jl8() -> SourceConfig {
        SourceConfig {
            url: "http://limbero.org/jl8/".into(),
            enabled: true,
        }
    }
}
