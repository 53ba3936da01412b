//! Shared fakes for orchestrator tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;

use crate::catalog::EpisodeCatalog;
use crate::config::Config;
use crate::error::{CatalogError, FetchError};
use crate::fetch::{FetchedMedia, MediaFetcher, ProgressCallback};
use crate::orchestrator::BatchDownloader;
use crate::types::{EpisodeDescriptor, Event, ProgressEvent};

/// `n` episodes named `E1..En` with 1-based ordinals
pub(crate) fn episodes(n: usize) -> Vec<EpisodeDescriptor> {
    (1..=n)
        .map(|i| {
            EpisodeDescriptor::new(
                format!("E{i}"),
                format!("https://www.raiplay.it/video/e{i}.html"),
                i,
            )
        })
        .collect()
}

/// Catalog serving fixed seasons and titles
#[derive(Default)]
pub(crate) struct FakeCatalog {
    pub seasons: Vec<Vec<EpisodeDescriptor>>,
    pub titles: HashMap<String, String>,
}

impl FakeCatalog {
    pub fn with_season(episodes: Vec<EpisodeDescriptor>) -> Self {
        Self {
            seasons: vec![episodes],
            titles: HashMap::new(),
        }
    }

    pub fn with_title(mut self, url: &str, title: &str) -> Self {
        self.titles.insert(url.to_string(), title.to_string());
        self
    }
}

#[async_trait]
impl EpisodeCatalog for FakeCatalog {
    async fn fetch_episodes(
        &self,
        _show_url: &str,
        season_index: usize,
    ) -> Result<Vec<EpisodeDescriptor>, CatalogError> {
        self.seasons
            .get(season_index)
            .cloned()
            .ok_or(CatalogError::SeasonOutOfRange {
                requested: season_index,
                available: self.seasons.len(),
            })
    }

    async fn episode_title(&self, episode_url: &str) -> Result<String, CatalogError> {
        self.titles
            .get(episode_url)
            .cloned()
            .ok_or_else(|| CatalogError::http(episode_url, "404 Not Found"))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Fetcher that emits a noisy progress sequence, optionally failing or panicking
/// for chosen episodes, and records concurrency
#[derive(Default)]
pub(crate) struct FakeFetcher {
    fail_urls: HashSet<String>,
    panic_urls: HashSet<String>,
    delay: Duration,
    delays: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Override the delay for one URL so completions can be reordered
    pub fn with_delay_for(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn failing_on(mut self, url: &str) -> Self {
        self.fail_urls.insert(url.to_string());
        self
    }

    pub fn panicking_on(mut self, url: &str) -> Self {
        self.panic_urls.insert(url.to_string());
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn called_urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn templates(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, template)| template.clone())
            .collect()
    }
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch(
        &self,
        source_url: &str,
        output_template: &Path,
        on_progress: ProgressCallback<'_>,
    ) -> Result<FetchedMedia, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((source_url.to_string(), output_template.to_path_buf()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        on_progress(ProgressEvent::downloading(100, 1000));
        let delay = self.delays.get(source_url).copied().unwrap_or(self.delay);
        tokio::time::sleep(delay).await;
        on_progress(ProgressEvent::downloading(50, 1000));
        on_progress(ProgressEvent::downloading(1000, 0));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panic_urls.contains(source_url) {
            panic!("fake fetcher exploded on {source_url}");
        }
        if self.fail_urls.contains(source_url) {
            return Err(FetchError::Other("simulated network failure".into()));
        }

        let file_path = output_template.with_extension("mp4");
        on_progress(ProgressEvent::finished().with_filename(file_path.to_string_lossy()));
        Ok(FetchedMedia {
            file_path: Some(file_path),
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Build a downloader over fakes with the given worker limit.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) fn create_test_downloader(
    catalog: FakeCatalog,
    fetcher: Arc<FakeFetcher>,
    max_concurrent_downloads: usize,
) -> (BatchDownloader, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    config.download.max_concurrent_downloads = max_concurrent_downloads;

    let downloader = BatchDownloader::with_components(config, Arc::new(catalog), fetcher).unwrap();
    (downloader, temp_dir)
}

/// Drain every event already buffered in `rx`
pub(crate) fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
