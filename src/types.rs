//! Core types for raiplay-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Width of the `=` rule framing the batch summary
const SUMMARY_RULE_WIDTH: usize = 60;

/// One playable episode within a season, as returned by the catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeDescriptor {
    /// Episode title as published by the catalog
    pub display_name: String,
    /// Absolute playback page URL handed to the media fetcher
    pub source_url: String,
    /// 1-based position within the requested season
    pub ordinal: usize,
}

impl EpisodeDescriptor {
    /// Create a new episode descriptor
    pub fn new(display_name: impl Into<String>, source_url: impl Into<String>, ordinal: usize) -> Self {
        Self {
            display_name: display_name.into(),
            source_url: source_url.into(),
            ordinal,
        }
    }
}

/// One unit of batch work: download exactly one episode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadTask {
    /// Episode to download
    pub episode: EpisodeDescriptor,
    /// Directory the asset is written to
    pub destination_dir: PathBuf,
    /// 1-based position of this task within the batch
    pub index_in_batch: usize,
    /// Number of tasks in the batch
    pub total_in_batch: usize,
}

impl DownloadTask {
    /// Short progress label, e.g. `[2/10] Episode title truncated...`
    pub fn label(&self) -> String {
        format!(
            "[{}/{}] {}...",
            self.index_in_batch,
            self.total_in_batch,
            truncate_chars(&self.episode.display_name, 25)
        )
    }
}

/// Label used for standalone (non-batch) downloads
pub(crate) fn single_label(name: &str) -> String {
    format!("Downloading: {}...", truncate_chars(name, 30))
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Phase reported by a progress event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    /// Bytes are being transferred
    Downloading,
    /// The asset is fully written
    Finished,
}

/// Incremental transfer notification for one in-flight task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Current phase
    pub phase: ProgressPhase,
    /// Bytes transferred so far
    pub downloaded_bytes: u64,
    /// Expected size in bytes (0 = unknown)
    pub total_bytes: u64,
    /// File being written, when the fetcher knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl ProgressEvent {
    /// A `Downloading` event
    pub fn downloading(downloaded_bytes: u64, total_bytes: u64) -> Self {
        Self {
            phase: ProgressPhase::Downloading,
            downloaded_bytes,
            total_bytes,
            filename: None,
        }
    }

    /// A `Finished` event with no byte counts
    pub fn finished() -> Self {
        Self {
            phase: ProgressPhase::Finished,
            downloaded_bytes: 0,
            total_bytes: 0,
            filename: None,
        }
    }

    /// Attach the output filename
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Per-task lifecycle state
///
/// `Pending -> Downloading -> {Succeeded, Failed}`; terminal states are absorbing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Scheduled, waiting for a worker
    Pending,
    /// Media fetch in progress
    Downloading,
    /// Finished successfully
    Succeeded,
    /// Finished with an error
    Failed,
}

impl TaskState {
    /// Whether no further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }

    /// Apply a transition, returning the new state.
    ///
    /// Terminal states absorb every transition; any other state moves to `next`.
    pub fn advance(self, next: TaskState) -> TaskState {
        if self.is_terminal() {
            self
        } else {
            next
        }
    }
}

/// Outcome of one task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOutcome {
    /// The asset was downloaded
    Success,
    /// The download failed
    Failure,
}

/// Result of exactly one [`DownloadTask`] (or one single download)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Display name of the episode
    pub episode_name: String,
    /// Success or failure
    pub outcome: TaskOutcome,
    /// Human-readable detail (output file on success, reason on failure)
    pub detail: String,
}

impl TaskResult {
    /// A successful result
    pub fn success(episode_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            episode_name: episode_name.into(),
            outcome: TaskOutcome::Success,
            detail: detail.into(),
        }
    }

    /// A failed result
    pub fn failure(episode_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            episode_name: episode_name.into(),
            outcome: TaskOutcome::Failure,
            detail: detail.into(),
        }
    }

    /// Whether the task succeeded
    pub fn is_success(&self) -> bool {
        self.outcome == TaskOutcome::Success
    }

    /// Terminal task state matching this result
    pub fn state(&self) -> TaskState {
        match self.outcome {
            TaskOutcome::Success => TaskState::Succeeded,
            TaskOutcome::Failure => TaskState::Failed,
        }
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            TaskOutcome::Success => write!(f, "✓ Successfully downloaded: {}", self.episode_name),
            TaskOutcome::Failure => write!(
                f,
                "✗ Error downloading {}: {}",
                self.episode_name, self.detail
            ),
        }
    }
}

/// Deterministic end-of-run summary of a batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Number of tasks dispatched
    pub total: usize,
    /// Number of successful tasks
    pub succeeded: usize,
    /// Number of failed tasks
    pub failed: usize,
    /// Failed results, in completion order
    pub failures: Vec<TaskResult>,
    /// Why the batch did not run, when the catalog or request was unusable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// When the batch started
    pub started_at: DateTime<Utc>,
    /// When the last task completed
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    /// Build a report from results collected in completion order.
    pub fn from_results(results: &[TaskResult], started_at: DateTime<Utc>) -> Self {
        let failures: Vec<TaskResult> = results.iter().filter(|r| !r.is_success()).cloned().collect();
        Self {
            total: results.len(),
            succeeded: results.len() - failures.len(),
            failed: failures.len(),
            failures,
            condition: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// A report for a batch that dispatched nothing
    pub fn empty() -> Self {
        Self::from_results(&[], Utc::now())
    }

    /// An empty report carrying the reason no tasks were scheduled
    pub fn unavailable(condition: impl Into<String>) -> Self {
        Self {
            condition: Some(condition.into()),
            ..Self::empty()
        }
    }

    /// Whether every dispatched task succeeded and the batch was not aborted
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.condition.is_none()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(SUMMARY_RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "BATCH DOWNLOAD SUMMARY:")?;
        writeln!(f, "{rule}")?;
        if let Some(condition) = &self.condition {
            writeln!(f, "Batch not started: {condition}")?;
        }
        writeln!(f, "Total episodes: {}", self.total)?;
        writeln!(f, "✓ Successful: {}", self.succeeded)?;
        write!(f, "✗ Failed: {}", self.failed)?;
        if !self.failures.is_empty() {
            write!(f, "\n\nFailed downloads:")?;
            for failure in &self.failures {
                write!(f, "\n  {failure}")?;
            }
        }
        Ok(())
    }
}

/// Event emitted during a download run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A batch was scheduled
    BatchStarted {
        /// Number of tasks in the batch
        total: usize,
        /// Number of concurrent workers
        workers: usize,
    },

    /// The catalog could not provide an episode list; no tasks were scheduled
    CatalogUnavailable {
        /// Error description
        reason: String,
    },

    /// A task moved from `Pending` to `Downloading`
    TaskStarted {
        /// 1-based position within the batch (1 for single downloads)
        index: usize,
        /// Number of tasks in the batch
        total: usize,
        /// Progress label for the task
        label: String,
    },

    /// Progress update for one task
    TaskProgress {
        /// 1-based position within the batch
        index: usize,
        /// Bytes transferred so far (non-decreasing)
        downloaded_bytes: u64,
        /// Fixed denominator (0 = unknown)
        total_bytes: u64,
    },

    /// The fetcher reported the asset complete (emitted at most once per task)
    TaskCompleted {
        /// 1-based position within the batch
        index: usize,
        /// Written file name when reported, else the task label
        display_name: String,
    },

    /// A task reached a terminal state
    TaskFinished {
        /// 1-based position within the batch
        index: usize,
        /// Terminal state
        state: TaskState,
        /// The task's result
        result: TaskResult,
    },

    /// Overall batch counter advanced by one completed task
    BatchProgress {
        /// Tasks completed so far
        completed: usize,
        /// Tasks in the batch
        total: usize,
    },

    /// Every task completed
    BatchFinished {
        /// Final summary
        report: BatchReport,
    },
}
