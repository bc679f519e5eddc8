//! # Asset Providers
//!
//! Stock media search and download. Providers sit behind the
//! [`AssetProvider`] trait so the composition engine never depends on a
//! particular service.
//!
//! ```rust,no_run
//! use clip_composer::{config::Config, provider::{AssetProvider, PixabayProvider}};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default().with_env_overrides();
//! let pixabay = PixabayProvider::new(config.provider.clone())?;
//!
//! let hits = pixabay.search("sunset", 1).await?;
//! if let Some(hit) = hits.first() {
//!     let saved = pixabay.download_media(&hit.medium_url, "sunset.jpg".as_ref()).await;
//!     println!("downloaded: {}", saved);
//! }
//! # Ok(())
//! # }
//! ```

pub mod download;
pub mod pixabay;
pub mod traits;
pub mod types;

pub use pixabay::PixabayProvider;
pub use traits::AssetProvider;
pub use types::{AssetDescriptor, UrlTier};
