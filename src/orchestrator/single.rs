//! Single-episode download path

use std::path::Path;

use super::BatchDownloader;
use super::task::run_contained;
use crate::types::{DownloadTask, EpisodeDescriptor, TaskResult, single_label};
use crate::utils::name_from_url;

impl BatchDownloader {
    /// Download one episode page into `destination_dir`.
    ///
    /// The file is named after the episode's published title; when the catalog cannot
    /// provide one, the last path segment of the URL is used. Never fails: errors are
    /// reported as a failed [`TaskResult`].
    pub async fn run_single(&self, episode_url: &str, destination_dir: &Path) -> TaskResult {
        let name = match self.catalog.episode_title(episode_url).await {
            Ok(title) => title,
            Err(e) => {
                let fallback = name_from_url(episode_url);
                tracing::debug!(url = episode_url, error = %e, fallback = %fallback, "Episode title unavailable");
                fallback
            }
        };

        let label = single_label(&name);
        let task = DownloadTask {
            episode: EpisodeDescriptor::new(name, episode_url, 1),
            destination_dir: destination_dir.to_path_buf(),
            index_in_batch: 1,
            total_in_batch: 1,
        };

        run_contained(task, label, self.fetcher.clone(), self.event_tx.clone()).await
    }
}
