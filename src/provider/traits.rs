use async_trait::async_trait;
use std::path::Path;

use crate::{error::Result, provider::types::AssetDescriptor};

/// Core trait every stock media source implements
#[async_trait]
pub trait AssetProvider: Send + Sync {
    /// Name recorded in each descriptor's `source` field
    fn name(&self) -> &str;

    /// Search for up to `count` images matching `query`
    ///
    /// A `count` of zero returns an empty list without touching the network.
    /// Results keep the provider's ranking order.
    async fn search(&self, query: &str, count: usize) -> Result<Vec<AssetDescriptor>>;

    /// Stream `url` into `path`
    ///
    /// Returns `false` on any failure instead of erroring; callers treat that
    /// as "asset unavailable". Calling again with the same destination is
    /// safe.
    async fn download_media(&self, url: &str, path: &Path) -> bool;
}
