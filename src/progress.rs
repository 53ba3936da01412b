//! Per-task progress aggregation.
//!
//! Raw progress events from a media fetcher are noisy: byte counts can briefly go
//! backwards, the expected size can disappear mid-transfer, and events can keep
//! arriving after the file is finished. [`ProgressAggregator`] turns that stream into
//! a display view that only ever moves forward. It performs no I/O.

use serde::Serialize;

use crate::types::{ProgressEvent, ProgressPhase};

/// Display view of one task's progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    /// Bytes transferred, never decreasing
    pub downloaded_bytes: u64,
    /// Denominator fixed by the first event with a known size (0 = unknown)
    pub total_bytes: u64,
    /// Whether a `Finished` event has been seen
    pub is_complete: bool,
}

impl ProgressSnapshot {
    /// Completion percentage in `0.0..=100.0`, if the total size is known
    pub fn percent(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        let pct = self.downloaded_bytes as f64 / self.total_bytes as f64 * 100.0;
        Some(pct.min(100.0))
    }
}

/// Folds one task's [`ProgressEvent`]s into a monotonic [`ProgressSnapshot`]
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    label: String,
    snapshot: ProgressSnapshot,
    filename: Option<String>,
}

impl ProgressAggregator {
    /// Create an aggregator for the task described by `label`
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            snapshot: ProgressSnapshot::default(),
            filename: None,
        }
    }

    /// Fold in one event.
    ///
    /// Returns the updated snapshot, or `None` when the event was ignored because the
    /// task already completed.
    pub fn apply(&mut self, event: &ProgressEvent) -> Option<ProgressSnapshot> {
        if self.snapshot.is_complete {
            return None;
        }

        if self.snapshot.total_bytes == 0 && event.total_bytes > 0 {
            self.snapshot.total_bytes = event.total_bytes;
        }
        self.snapshot.downloaded_bytes = self.snapshot.downloaded_bytes.max(event.downloaded_bytes);

        if let Some(filename) = &event.filename {
            self.filename = Some(filename.clone());
        }

        if event.phase == ProgressPhase::Finished {
            self.snapshot.is_complete = true;
        }

        Some(self.snapshot)
    }

    /// Current snapshot
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot
    }

    /// Whether the task has finished
    pub fn is_complete(&self) -> bool {
        self.snapshot.is_complete
    }

    /// Name to show for the task: the written file once known, else the label
    pub fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or(&self.label)
    }
}
