//! # Clip-Composer
//!
//! Build short vertical videos from stock images and text overlays.
//!
//! This library lays out image and text layers on a fixed output frame,
//! schedules them on a timeline, and hands the result to an external encoder.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clip_composer::{
//!     composition::{ShortEngine, ShortRequest},
//!     config::Config,
//!     provider::PixabayProvider,
//!     render::FfmpegRenderer,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default().with_env_overrides();
//! let provider = PixabayProvider::new(config.provider.clone())?;
//! let renderer = FfmpegRenderer::new(&config);
//!
//! let engine = ShortEngine::new(config, Box::new(provider), Box::new(renderer));
//! let request = ShortRequest::new("sunset", 3, "output/")
//!     .with_title("Golden Hour")
//!     .with_captions(["Warm", "Warmer", "Gone"]);
//!
//! let video = engine.produce(&request).await?;
//! println!("{:?}", video.path);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`layer`] - Layer geometry, transforms and text measurement
//! - [`composition`] - Layer factory, timeline and the end-to-end engine
//! - [`provider`] - Stock media search and download
//! - [`render`] - Encoding backends
//! - [`config`] - Configuration management
//!
//! ## Composing Without a Provider
//!
//! Layers can be built and scheduled directly:
//!
//! ```rust,no_run
//! use clip_composer::{
//!     composition::{ClipComposer, Timeline},
//!     config::Config,
//!     layer::Position,
//! };
//!
//! # fn main() -> clip_composer::Result<()> {
//! let composer = ClipComposer::new(&Config::default());
//! let background = composer.create_image_layer("beach.jpg", 4.0, true)?;
//! let caption = composer.create_text_layer("Summer", 4.0, Position::Bottom)?;
//!
//! let timeline = Timeline::assemble_scheduled(vec![(0.0, background), (0.0, caption)], "output/")?;
//! assert_eq!(timeline.duration(), 4.0);
//! # Ok(())
//! # }
//! ```

pub mod composition;
pub mod config;
pub mod error;
pub mod layer;
pub mod provider;
pub mod render;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{ClipComposer, ShortEngine, ShortRequest, Timeline},
    config::Config,
    error::{ComposerError, Result},
    layer::{Layer, Position},
};
