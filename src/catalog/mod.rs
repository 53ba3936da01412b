//! Episode catalog access
//!
//! The orchestrator only needs two things from a catalog: the ordered episode list of
//! one season, and the title of a single episode page. [`EpisodeCatalog`] captures that
//! seam so batches can be driven by the real [`RaiPlayCatalog`] or by a fake in tests.

mod raiplay;

pub use raiplay::RaiPlayCatalog;

use async_trait::async_trait;

use crate::error::CatalogError;
use crate::types::EpisodeDescriptor;

/// Source of episode metadata
#[async_trait]
pub trait EpisodeCatalog: Send + Sync {
    /// Fetch the ordered episode list of one season.
    ///
    /// # Arguments
    ///
    /// * `show_url` - Catalog page of the show
    /// * `season_index` - Zero-based season index
    ///
    /// Episodes are returned in catalog order with contiguous 1-based ordinals.
    async fn fetch_episodes(
        &self,
        show_url: &str,
        season_index: usize,
    ) -> Result<Vec<EpisodeDescriptor>, CatalogError>;

    /// Resolve the published title of a single episode page
    async fn episode_title(&self, episode_url: &str) -> Result<String, CatalogError>;

    /// Human-readable name of this catalog implementation
    fn name(&self) -> &'static str;
}
