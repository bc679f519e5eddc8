//! # Layers
//!
//! Timed, positioned, transformed visual units. A [`LayerSpec`] describes a
//! layer before composition; [`LayerSpec::compose`] turns it into an
//! immutable [`Layer`] with its fade pair applied.

pub mod measure;
pub mod transform;
pub mod types;

pub use measure::{GlyphEstimate, TextMeasure};
pub use transform::{clamp_fades, fit_to_frame, Transform};
pub use types::{validate_duration, Layer, LayerKind, LayerSource, LayerSpec, Point, Position, Size};
