//! # Composition
//!
//! The clip composer builds layers, the timeline groups them, and the engine
//! drives the whole search-to-render pipeline.

pub mod composer;
pub mod engine;
pub mod timeline;

// Re-exports for convenience
pub use composer::{ClipComposer, LayerRequest};
pub use engine::{ShortEngine, ShortRequest};
pub use timeline::{Timeline, TimelineEntry};
