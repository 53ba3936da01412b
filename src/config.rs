//! Configuration types for raiplay-dl

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Hard ceiling for concurrent episode downloads.
///
/// `max_concurrent_downloads` values above this are clamped so a misconfigured run
/// cannot flood the catalog's CDN.
pub const MAX_CONCURRENT_DOWNLOADS_CEILING: usize = 8;

/// Download behavior configuration (destination, concurrency, format selection)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Default destination directory (default: "downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Maximum concurrent episode downloads in a batch (default: 4)
    ///
    /// The batch worker count is `min(max_concurrent_downloads, selected episodes)`,
    /// clamped to [`MAX_CONCURRENT_DOWNLOADS_CEILING`].
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Format selector handed to the download tool (default: "best[height<=720]/best")
    #[serde(default = "default_format")]
    pub format: String,

    /// Download subtitles alongside the video (default: false)
    #[serde(default)]
    pub write_subtitles: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_concurrent_downloads: default_max_concurrent(),
            format: default_format(),
            write_subtitles: false,
        }
    }
}

/// Episode catalog access configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Site root used to resolve relative catalog and episode links
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout applied to every catalog HTTP request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent to the catalog
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// External tool configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_path: true,
        }
    }
}

/// Main configuration for [`BatchDownloader`](crate::BatchDownloader)
///
/// Every field has a default, so `Config::default()` and an empty JSON object
/// produce the same configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Catalog access settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// External tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Config {
    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let load_err = |reason: String| ConfigError::Load {
            path: path.to_path_buf(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| load_err(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    ///
    /// A concurrency limit above [`MAX_CONCURRENT_DOWNLOADS_CEILING`] is not an error;
    /// it is clamped by [`Config::worker_limit`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.download.max_concurrent_downloads == 0 {
            return Err(ConfigError::invalid(
                "max_concurrent_downloads",
                "must be at least 1",
            ));
        }

        if self.download.format.trim().is_empty() {
            return Err(ConfigError::invalid("format", "must not be empty"));
        }

        url::Url::parse(&self.catalog.base_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.catalog.base_url.clone(),
            reason: e.to_string(),
        })?;

        if self.catalog.request_timeout.is_zero() {
            return Err(ConfigError::invalid(
                "request_timeout",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Effective per-batch worker limit: the configured value clamped to `1..=ceiling`.
    pub fn worker_limit(&self) -> usize {
        let configured = self.download.max_concurrent_downloads;
        if configured > MAX_CONCURRENT_DOWNLOADS_CEILING {
            tracing::warn!(
                configured,
                ceiling = MAX_CONCURRENT_DOWNLOADS_CEILING,
                "max_concurrent_downloads above ceiling, clamping"
            );
        }
        configured.clamp(1, MAX_CONCURRENT_DOWNLOADS_CEILING)
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_max_concurrent() -> usize {
    4
}

fn default_format() -> String {
    "best[height<=720]/best".to_string()
}

fn default_base_url() -> String {
    "https://www.raiplay.it".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("raiplay-dl/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
