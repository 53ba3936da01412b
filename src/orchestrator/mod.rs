//! Batch download orchestration
//!
//! [`BatchDownloader`] fans a season's episodes out over a bounded pool of concurrent
//! fetches, keeps one overall progress counter, and folds every per-task outcome into
//! a [`BatchReport`](crate::types::BatchReport). One failing episode never aborts its
//! siblings. Progress and results are published as [`Event`]s on a broadcast channel.

mod batch;
mod single;
mod task;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::catalog::{EpisodeCatalog, RaiPlayCatalog};
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::fetch::{MediaFetcher, YtDlpFetcher};
use crate::types::Event;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main entry point for downloading episodes
///
/// Cloning is cheap; clones share the catalog, fetcher and event channel.
#[derive(Clone)]
pub struct BatchDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Episode metadata source
    pub(crate) catalog: Arc<dyn EpisodeCatalog>,
    /// Media fetch adapter shared by every worker
    pub(crate) fetcher: Arc<dyn MediaFetcher>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
}

impl std::fmt::Debug for BatchDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchDownloader")
            .field("catalog", &self.catalog.name())
            .field("fetcher", &self.fetcher.name())
            .field("workers", &self.config.worker_limit())
            .finish()
    }
}

impl BatchDownloader {
    /// Create a downloader backed by the RaiPlay catalog and the `yt-dlp` binary.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid, the HTTP client cannot be built, or no
    /// `yt-dlp` binary can be located.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let catalog = RaiPlayCatalog::new(&config.catalog)?;
        let fetcher = YtDlpFetcher::from_config(&config)?;
        tracing::info!(
            ytdlp = %fetcher.binary_path().display(),
            workers = config.worker_limit(),
            "Batch downloader ready"
        );
        Self::with_components(config, Arc::new(catalog), Arc::new(fetcher))
    }

    /// Create a downloader from explicit catalog and fetcher implementations.
    pub fn with_components(
        config: Config,
        catalog: Arc<dyn EpisodeCatalog>,
        fetcher: Arc<dyn MediaFetcher>,
    ) -> Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config: Arc::new(config),
            catalog,
            fetcher,
            event_tx,
        })
    }

    /// Subscribe to download events.
    ///
    /// Events are delivered to every receiver; slow receivers may observe
    /// `RecvError::Lagged` and should keep receiving.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The media fetcher used by this downloader (e.g. for format diagnostics)
    pub fn fetcher(&self) -> &Arc<dyn MediaFetcher> {
        &self.fetcher
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }
}

/// User request to download one season of a show
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeasonRequest {
    /// Catalog page of the show
    pub show_url: String,
    /// Zero-based season index
    pub season_index: usize,
    /// Zero-based position of the first episode to download (0 = all)
    pub start_index: usize,
}

impl SeasonRequest {
    /// Build a request from user input.
    ///
    /// `season_number` is 1-based as shown on the catalog site.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidSeason`] for season 0, [`ConfigError::InvalidUrl`] when
    /// `show_url` is not an absolute http(s) URL.
    pub fn new(
        show_url: impl Into<String>,
        season_number: usize,
        start_index: usize,
    ) -> std::result::Result<Self, ConfigError> {
        let show_url = show_url.into().trim().to_string();
        let parsed = url::Url::parse(&show_url).map_err(|e| ConfigError::InvalidUrl {
            url: show_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: show_url,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let season_index = season_number
            .checked_sub(1)
            .ok_or(ConfigError::InvalidSeason(season_number))?;

        Ok(Self {
            show_url,
            season_index,
            start_index,
        })
    }
}
