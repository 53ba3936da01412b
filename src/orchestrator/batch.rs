//! Batch scheduling over a bounded worker pool

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::task::run_contained;
use super::{BatchDownloader, SeasonRequest};
use crate::types::{BatchReport, DownloadTask, EpisodeDescriptor, Event, TaskResult};

impl BatchDownloader {
    /// Download `episodes[start_index..]` into `destination_dir`.
    ///
    /// Tasks are submitted in ordinal order and run on
    /// `min(worker_limit, selected episodes)` concurrent workers; results are collected
    /// in completion order. A `start_index` of 0 selects every episode, and one past the
    /// end selects none. Never fails: per-task faults are reported in the returned
    /// [`BatchReport`].
    pub async fn run_batch(
        &self,
        episodes: &[EpisodeDescriptor],
        destination_dir: &Path,
        start_index: usize,
    ) -> BatchReport {
        let selected = episodes.get(start_index..).unwrap_or_default();
        if selected.is_empty() {
            tracing::info!(
                available = episodes.len(),
                start_index,
                "No episodes selected, nothing to download"
            );
            let report = BatchReport::empty();
            self.emit_event(Event::BatchFinished {
                report: report.clone(),
            });
            return report;
        }

        let total = selected.len();
        let workers = self.config.worker_limit().min(total);
        let started_at = Utc::now();

        tracing::info!(
            total,
            workers,
            destination = %destination_dir.display(),
            "Starting batch download"
        );
        self.emit_event(Event::BatchStarted { total, workers });

        let tasks: Vec<DownloadTask> = selected
            .iter()
            .enumerate()
            .map(|(i, episode)| DownloadTask {
                episode: episode.clone(),
                destination_dir: destination_dir.to_path_buf(),
                index_in_batch: i + 1,
                total_in_batch: total,
            })
            .collect();

        let completed = Arc::new(AtomicUsize::new(0));

        let results: Vec<TaskResult> = stream::iter(tasks)
            .map(|task| {
                let fetcher = Arc::clone(&self.fetcher);
                let event_tx = self.event_tx.clone();
                let completed = Arc::clone(&completed);

                async move {
                    let label = task.label();
                    let result = run_contained(task, label, fetcher, event_tx.clone()).await;

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    event_tx
                        .send(Event::BatchProgress {
                            completed: done,
                            total,
                        })
                        .ok();

                    result
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        let report = BatchReport::from_results(&results, started_at);
        tracing::info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            "Batch download finished"
        );
        self.emit_event(Event::BatchFinished {
            report: report.clone(),
        });
        report
    }

    /// Fetch one season from the catalog and download it.
    ///
    /// Catalog errors (unreachable page, season out of range, changed layout) produce an
    /// empty report carrying the reason instead of an error.
    pub async fn download_season(
        &self,
        request: &SeasonRequest,
        destination_dir: &Path,
    ) -> BatchReport {
        let episodes = match self
            .catalog
            .fetch_episodes(&request.show_url, request.season_index)
            .await
        {
            Ok(episodes) => episodes,
            Err(e) => {
                tracing::warn!(
                    show = %request.show_url,
                    season = request.season_index + 1,
                    error = %e,
                    "Episode list unavailable"
                );
                let reason = e.to_string();
                self.emit_event(Event::CatalogUnavailable {
                    reason: reason.clone(),
                });
                let report = BatchReport::unavailable(reason);
                self.emit_event(Event::BatchFinished {
                    report: report.clone(),
                });
                return report;
            }
        };

        tracing::info!(
            catalog = self.catalog.name(),
            episodes = episodes.len(),
            season = request.season_index + 1,
            "Episode list fetched"
        );
        self.run_batch(&episodes, destination_dir, request.start_index)
            .await
    }
}
