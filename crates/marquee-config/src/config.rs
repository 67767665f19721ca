use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that overrides `api.access_token`
pub const API_TOKEN_ENV: &str = "TMDB_API_TOKEN";

const PLACEHOLDER_TOKEN: &str = "YOUR_API_TOKEN";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    /// Region passed to the now-playing listing
    #[serde(default = "default_region")]
    pub region: String,
    /// v4 read access token, sent as a bearer token
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PagingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// How close to the end of the window a reader may get before the next page is requested
    #[serde(default = "default_page_size")]
    pub prefetch_distance: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Watchlist database location; defaults to the data directory
    #[serde(default)]
    pub database_file: Option<PathBuf>,
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_region() -> String {
    "CA".to_string()  // Canada
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_page_size() -> usize {
    20
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            image_base_url: default_image_base_url(),
            region: default_region(),
            access_token: PLACEHOLDER_TOKEN.to_string(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            prefetch_distance: default_page_size(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms() }
    }
}

impl ApiConfig {
    /// Token to authenticate with: environment first, then the config file
    pub fn resolved_token(&self) -> Option<String> {
        std::env::var(API_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.file_token().map(|t| t.to_string()))
    }

    fn file_token(&self) -> Option<&str> {
        let token = self.access_token.trim();
        if token.is_empty() || token == PLACEHOLDER_TOKEN {
            None
        } else {
            Some(token)
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file, falling back to defaults when it does not exist yet
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("api.base_url cannot be empty"));
        }
        if self.api.resolved_token().is_none() {
            return Err(anyhow::anyhow!(
                "No API token configured. Set api.access_token in config.toml or the {} environment variable",
                API_TOKEN_ENV
            ));
        }
        if self.api.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("api.timeout_seconds must be greater than zero"));
        }
        if self.paging.page_size == 0 {
            return Err(anyhow::anyhow!("paging.page_size must be greater than zero"));
        }
        Ok(())
    }

    pub fn is_api_configured(&self) -> bool {
        self.api.resolved_token().is_some()
    }
}
