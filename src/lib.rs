//! # raiplay-dl
//!
//! Batch downloader for RaiPlay shows.
//!
//! ## Design Philosophy
//!
//! raiplay-dl is designed to be:
//! - **Fault tolerant** - One failing episode never aborts the rest of a season
//! - **Polite** - Concurrency is bounded by a configurable, capped worker limit
//! - **Library-first** - The interactive front end is a thin demo over the crate
//! - **Event-driven** - Consumers subscribe to progress events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use raiplay_dl::{BatchDownloader, Config, SeasonRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let downloader = BatchDownloader::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let request = SeasonRequest::new("https://www.raiplay.it/programmi/ilcommissariomontalbano", 1, 0)?;
//!     let report = downloader
//!         .download_season(&request, &downloader.config().download.download_dir)
//!         .await;
//!     println!("{report}");
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Episode catalog access
pub mod catalog;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Media fetch adapters
pub mod fetch;
/// Batch orchestration
pub mod orchestrator;
/// Per-task progress aggregation
pub mod progress;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use catalog::{EpisodeCatalog, RaiPlayCatalog};
pub use config::{CatalogConfig, Config, DownloadConfig, MAX_CONCURRENT_DOWNLOADS_CEILING, ToolsConfig};
pub use error::{CatalogError, ConfigError, Error, FetchError, Result};
pub use fetch::{FetchedMedia, MediaFetcher, YtDlpFetcher};
pub use orchestrator::{BatchDownloader, SeasonRequest};
pub use progress::{ProgressAggregator, ProgressSnapshot};
pub use types::{
    BatchReport, DownloadTask, EpisodeDescriptor, Event, ProgressEvent, ProgressPhase, TaskOutcome,
    TaskResult, TaskState,
};
