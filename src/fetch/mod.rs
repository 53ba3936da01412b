//! Media fetching
//!
//! A [`MediaFetcher`] downloads one asset and reports progress through a callback.
//! [`YtDlpFetcher`] drives the external `yt-dlp` binary; tests substitute fakes.
//!
//! ## Usage
//!
//! ```no_run
//! use raiplay_dl::config::Config;
//! use raiplay_dl::fetch::{MediaFetcher, YtDlpFetcher};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = YtDlpFetcher::from_config(&Config::default())?;
//!     let media = fetcher
//!         .fetch(
//!             "https://www.raiplay.it/video/2024/01/episodio.html",
//!             Path::new("downloads/Episodio.%(ext)s"),
//!             &|event| println!("{event:?}"),
//!         )
//!         .await?;
//!     println!("saved to {:?}", media.file_path);
//!     Ok(())
//! }
//! ```

mod ytdlp;

pub use ytdlp::YtDlpFetcher;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::FetchError;
use crate::types::ProgressEvent;

/// Progress callback handed to [`MediaFetcher::fetch`]
pub type ProgressCallback<'a> = &'a (dyn Fn(ProgressEvent) + Send + Sync);

/// What a successful fetch produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedMedia {
    /// Final file on disk, when the fetcher could determine it
    pub file_path: Option<PathBuf>,
}

/// Downloads a single asset
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download `source_url` to `output_template`.
    ///
    /// # Arguments
    ///
    /// * `source_url` - Playback page of the asset
    /// * `output_template` - Destination path; `%(ext)s` is replaced with the container extension
    /// * `on_progress` - Invoked for every progress event, from the calling task
    ///
    /// # Errors
    ///
    /// Any transport, format or disk failure is returned as a [`FetchError`].
    async fn fetch(
        &self,
        source_url: &str,
        output_template: &Path,
        on_progress: ProgressCallback<'_>,
    ) -> Result<FetchedMedia, FetchError>;

    /// Describe the formats available for `source_url` (diagnostics).
    ///
    /// The default implementation reports that listing is unsupported.
    async fn list_formats(&self, source_url: &str) -> Result<String, FetchError> {
        let _ = source_url;
        Err(FetchError::Other(format!(
            "{} cannot list formats",
            self.name()
        )))
    }

    /// Human-readable name of this fetcher
    fn name(&self) -> &'static str;
}
