//! Per-task execution: one fetch, wrapped so it always yields a [`TaskResult`].

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::error::FetchError;
use crate::fetch::MediaFetcher;
use crate::progress::ProgressAggregator;
use crate::types::{DownloadTask, Event, TaskResult, TaskState};
use crate::utils::output_template;

/// Run one download task on its own tokio task so that even a panicking fetcher
/// yields a failed [`TaskResult`].
pub(super) async fn run_contained(
    task: DownloadTask,
    label: String,
    fetcher: Arc<dyn MediaFetcher>,
    event_tx: broadcast::Sender<Event>,
) -> TaskResult {
    let index = task.index_in_batch;
    let name = task.episode.display_name.clone();

    match tokio::spawn(run_task(task, label, fetcher, event_tx.clone())).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(index, episode = %name, error = %e, "Download task panicked");
            let result = TaskResult::failure(&name, FetchError::Panicked(e.to_string()).to_string());
            finish(&event_tx, index, TaskState::Failed, &result);
            result
        }
    }
}

/// Run one download task to a terminal state.
///
/// Emits `TaskStarted`, forwards aggregated progress as `TaskProgress`, reports the final
/// display name as `TaskCompleted` once the fetcher signals completion, and finishes with
/// `TaskFinished`. Fetch errors become a failed [`TaskResult`]; nothing is propagated.
async fn run_task(
    task: DownloadTask,
    label: String,
    fetcher: Arc<dyn MediaFetcher>,
    event_tx: broadcast::Sender<Event>,
) -> TaskResult {
    let index = task.index_in_batch;
    let name = task.episode.display_name.clone();
    let mut state = TaskState::Pending.advance(TaskState::Downloading);

    event_tx
        .send(Event::TaskStarted {
            index,
            total: task.total_in_batch,
            label: label.clone(),
        })
        .ok();
    tracing::debug!(index, episode = %name, "Task started");

    let aggregator = Mutex::new(ProgressAggregator::new(label));
    let on_progress = |event: crate::types::ProgressEvent| {
        let update = match aggregator.lock() {
            Ok(mut agg) => agg
                .apply(&event)
                .map(|snapshot| (snapshot, agg.display_name().to_string())),
            Err(_) => None,
        };
        let Some((snapshot, display_name)) = update else {
            return;
        };

        event_tx
            .send(Event::TaskProgress {
                index,
                downloaded_bytes: snapshot.downloaded_bytes,
                total_bytes: snapshot.total_bytes,
            })
            .ok();
        // apply() yields nothing once complete, so this fires at most once per task
        if snapshot.is_complete {
            event_tx
                .send(Event::TaskCompleted {
                    index,
                    display_name,
                })
                .ok();
        }
    };

    let template = output_template(&task.destination_dir, &name);
    let outcome = fetcher
        .fetch(&task.episode.source_url, &template, &on_progress)
        .await;
    let result = match outcome {
        Ok(media) => {
            let saved = media.file_path.unwrap_or(template);
            TaskResult::success(&name, saved.display().to_string())
        }
        Err(e) => {
            tracing::warn!(index, episode = %name, error = %e, "Episode download failed");
            TaskResult::failure(&name, e.to_string())
        }
    };

    state = state.advance(result.state());
    finish(&event_tx, index, state, &result);
    result
}

/// Publish the terminal state of a task
fn finish(
    event_tx: &broadcast::Sender<Event>,
    index: usize,
    state: TaskState,
    result: &TaskResult,
) {
    tracing::debug!(index, state = ?state, "Task finished");
    event_tx
        .send(Event::TaskFinished {
            index,
            state,
            result: result.clone(),
        })
        .ok();
}
