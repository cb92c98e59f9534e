use crate::collector::Pacing;
use crate::timeouts::{ms, secs};
use crate::{CollectorError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const API_KEY_ENV: &str = "TWEET_COLLECTOR_API_KEY";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaginationConfig {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,
    #[serde(default = "default_rate_limit_cooldown")]
    pub rate_limit_cooldown_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
    #[serde(default = "default_csv_dir")]
    pub csv_dir: PathBuf,
    #[serde(default = "default_json_pretty")]
    pub json_pretty: bool,
}

fn default_base_url() -> String {
    "https://api.twitterapi.io".to_string()
}
fn default_api_key_header() -> String {
    "X-API-Key".to_string()
}
fn default_request_timeout() -> u64 {
    secs::REQUEST
}
fn default_page_delay() -> u64 {
    ms::PAGE_DELAY
}
fn default_rate_limit_cooldown() -> u64 {
    secs::RATE_LIMIT_COOLDOWN
}
fn default_raw_dir() -> PathBuf {
    PathBuf::from("raw_data")
}
fn default_csv_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_json_pretty() -> bool {
    false
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            api_key_header: default_api_key_header(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            page_delay_ms: default_page_delay(),
            rate_limit_cooldown_secs: default_rate_limit_cooldown(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            raw_dir: default_raw_dir(),
            csv_dir: default_csv_dir(),
            json_pretty: default_json_pretty(),
        }
    }
}

impl PaginationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            page_delay: Duration::from_millis(self.page_delay_ms),
            rate_limit_cooldown: Duration::from_secs(self.rate_limit_cooldown_secs),
        }
    }
}

impl ApiConfig {
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(CollectorError::MissingApiKey)
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    default_config_dir().map(|p| p.join("config.toml"))
}

pub fn default_config_dir() -> Result<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".config"))
        })
        .map(|p| p.join("tweet-collector"))
        .ok_or_else(|| CollectorError::ConfigError("Could not determine config directory".into()))
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        let global_path = default_config_path()?;
        if global_path.exists() {
            let content = std::fs::read_to_string(&global_path)?;
            config = toml::from_str(&content)?;
        }

        let project_path = PathBuf::from(".tweet-collector.toml");
        if project_path.exists() {
            let content = std::fs::read_to_string(&project_path)?;
            let project_layer: ConfigLayer = toml::from_str(&content)?;
            config = config.merge(project_layer);
        }

        config.load_from_env();

        Ok(config)
    }

    pub fn load_with_overrides(&self, cli_overrides: ConfigOverrides) -> Self {
        let mut config = self.clone();

        if let Some(api_key) = cli_overrides.api_key {
            config.api.api_key = Some(api_key);
        }
        if let Some(base_url) = cli_overrides.base_url {
            config.api.base_url = base_url;
        }
        if let Some(raw_dir) = cli_overrides.raw_dir {
            config.output.raw_dir = raw_dir;
        }
        if let Some(csv_dir) = cli_overrides.csv_dir {
            config.output.csv_dir = csv_dir;
        }
        if let Some(pretty) = cli_overrides.json_pretty {
            config.output.json_pretty = pretty;
        }
        if let Some(timeout) = cli_overrides.timeout {
            config.pagination.request_timeout_secs = timeout;
        }

        config
    }

    /// Applies every field present in `layer`, leaving the rest untouched.
    fn merge(mut self, layer: ConfigLayer) -> Self {
        if let Some(api) = layer.api {
            if let Some(base_url) = api.base_url {
                self.api.base_url = base_url;
            }
            if let Some(api_key) = api.api_key {
                self.api.api_key = Some(api_key);
            }
            if let Some(header) = api.api_key_header {
                self.api.api_key_header = header;
            }
        }
        if let Some(pagination) = layer.pagination {
            if let Some(timeout) = pagination.request_timeout_secs {
                self.pagination.request_timeout_secs = timeout;
            }
            if let Some(delay) = pagination.page_delay_ms {
                self.pagination.page_delay_ms = delay;
            }
            if let Some(cooldown) = pagination.rate_limit_cooldown_secs {
                self.pagination.rate_limit_cooldown_secs = cooldown;
            }
        }
        if let Some(output) = layer.output {
            if let Some(raw_dir) = output.raw_dir {
                self.output.raw_dir = raw_dir;
            }
            if let Some(csv_dir) = output.csv_dir {
                self.output.csv_dir = csv_dir;
            }
            if let Some(pretty) = output.json_pretty {
                self.output.json_pretty = pretty;
            }
        }
        self
    }

    fn load_from_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.is_empty()
        {
            self.api.api_key = Some(key);
        }
        if let Ok(base_url) = std::env::var("TWEET_COLLECTOR_BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Ok(dir) = std::env::var("TWEET_COLLECTOR_RAW_DIR") {
            self.output.raw_dir = PathBuf::from(dir);
        }
        if let Ok(timeout) = std::env::var("TWEET_COLLECTOR_TIMEOUT")
            && let Ok(timeout) = timeout.parse()
        {
            self.pagination.request_timeout_secs = timeout;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pagination.request_timeout_secs == 0 {
            return Err(CollectorError::ConfigError(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.api.api_key_header.trim().is_empty() {
            return Err(CollectorError::ConfigError(
                "api_key_header must not be empty".into(),
            ));
        }

        url::Url::parse(&self.api.base_url)
            .map_err(|e| CollectorError::InvalidUrl(format!("{}: {}", self.api.base_url, e)))?;

        Ok(())
    }

    pub fn show_masked(&self) -> String {
        format!(
            r#"API:
  Base URL: {}
  API Key: {}
  Key Header: {}

Pagination:
  Request Timeout: {}s
  Page Delay: {}ms
  Rate Limit Cooldown: {}s

Output:
  Raw Data Dir: {}
  CSV Dir: {}
"#,
            self.api.base_url,
            mask_key(self.api.api_key.as_deref()),
            self.api.api_key_header,
            self.pagination.request_timeout_secs,
            self.pagination.page_delay_ms,
            self.pagination.rate_limit_cooldown_secs,
            self.output.raw_dir.display(),
            self.output.csv_dir.display(),
        )
    }
}

pub(crate) fn mask_key(key: Option<&str>) -> String {
    match key {
        None => "not set".into(),
        Some(k) => {
            let len = k.chars().count();
            if len <= 4 {
                return "****".into();
            }
            let tail: String = k.chars().skip(len - 4).collect();
            format!("****{}", tail)
        }
    }
}

/// A partial config file. Only the keys it actually sets override the
/// layer below it.
#[derive(Debug, Default, Deserialize)]
struct ConfigLayer {
    api: Option<ApiLayer>,
    pagination: Option<PaginationLayer>,
    output: Option<OutputLayer>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiLayer {
    base_url: Option<String>,
    api_key: Option<String>,
    api_key_header: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PaginationLayer {
    request_timeout_secs: Option<u64>,
    page_delay_ms: Option<u64>,
    rate_limit_cooldown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputLayer {
    raw_dir: Option<PathBuf>,
    csv_dir: Option<PathBuf>,
    json_pretty: Option<bool>,
}

#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub raw_dir: Option<PathBuf>,
    pub csv_dir: Option<PathBuf>,
    pub json_pretty: Option<bool>,
    pub timeout: Option<u64>,
}
