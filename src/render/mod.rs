//! # Render Backends
//!
//! Encoding is delegated to an external tool. [`RenderBackend`] is the seam;
//! [`FfmpegRenderer`] is the built-in implementation.

pub mod backend;
pub mod ffmpeg;

pub use backend::{RenderBackend, RenderedVideo};
pub use ffmpeg::FfmpegRenderer;
