use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::FadeConfig;
use crate::error::{LayerError, Result};
use crate::layer::transform::{self, Transform};

/// Pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Top-left corner of a layer inside the output frame
///
/// Coordinates may be negative when a layer is larger than the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Requested placement of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Center,
    /// Horizontally centred, `margin` pixels below the top edge
    Top,
    /// Horizontally centred, `margin` pixels above the bottom edge
    Bottom,
    /// Explicit top-left coordinates
    Custom { x: i32, y: i32 },
}

impl Position {
    /// Resolve to a top-left coordinate for a layer of `layer` size
    pub fn resolve(&self, frame: Size, layer: Size, margin: u32) -> Point {
        let centred_x = (frame.width as i32 - layer.width as i32).div_euclid(2);

        match *self {
            Position::Center => Point::new(
                centred_x,
                (frame.height as i32 - layer.height as i32).div_euclid(2),
            ),
            Position::Top => Point::new(centred_x, margin as i32),
            Position::Bottom => Point::new(
                centred_x,
                frame.height as i32 - layer.height as i32 - margin as i32,
            ),
            Position::Custom { x, y } => Point::new(x, y),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::Center
    }
}

/// What a layer draws
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum LayerSource {
    /// Literal text
    Text(String),
    /// Path to a downloaded image
    Image(PathBuf),
}

/// Discriminant of [`LayerSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Text,
    Image,
}

impl LayerSource {
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerSource::Text(_) => LayerKind::Text,
            LayerSource::Image(_) => LayerKind::Image,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            LayerSource::Text(text) => Some(text),
            LayerSource::Image(_) => None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            LayerSource::Text(_) => None,
            LayerSource::Image(path) => Some(path),
        }
    }
}

/// A layer that has not been composed yet
///
/// Holds only descriptive parameters. Geometry transforms may be chained on
/// it; [`LayerSpec::compose`] validates the duration, resolves placement,
/// appends the fade pair and hands back an immutable [`Layer`].
#[derive(Debug, Clone)]
pub struct LayerSpec {
    source: LayerSource,
    duration: f64,
    position: Position,
    size: Size,
    transforms: Vec<Transform>,
}

impl LayerSpec {
    pub fn new(source: LayerSource, duration: f64, size: Size) -> Self {
        Self {
            source,
            duration,
            position: Position::Center,
            size,
            transforms: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Append a geometry step; fades are added by `compose`
    pub fn with_transform(mut self, transform: Transform) -> Self {
        if !transform.is_fade() {
            self.transforms.push(transform);
        }
        self
    }

    pub fn with_transforms<I: IntoIterator<Item = Transform>>(self, transforms: I) -> Self {
        transforms
            .into_iter()
            .fold(self, |spec, transform| spec.with_transform(transform))
    }

    /// Unrendered -> Composed
    pub fn compose(self, frame: Size, margin: u32, fades: FadeConfig) -> Result<Layer> {
        validate_duration(self.duration)?;

        let output = transform::output_size(self.size, &self.transforms);
        let origin = self.position.resolve(frame, output, margin);
        let (start_fade, end_fade) = transform::clamp_fades(self.duration, fades);

        let mut transforms = self.transforms;
        transforms.push(Transform::FadeIn { duration: start_fade });
        transforms.push(Transform::FadeOut { duration: end_fade });

        Ok(Layer {
            source: self.source,
            duration: self.duration,
            position: self.position,
            origin,
            size: self.size,
            start_fade,
            end_fade,
            transforms,
        })
    }
}

/// Reject zero, negative and non-finite durations
pub fn validate_duration(duration: f64) -> Result<()> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(LayerError::InvalidDuration { duration }.into());
    }
    Ok(())
}

/// A composed, immutable visual unit ready for a timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    source: LayerSource,
    duration: f64,
    position: Position,
    origin: Point,
    size: Size,
    start_fade: f64,
    end_fade: f64,
    transforms: Vec<Transform>,
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        self.source.kind()
    }

    pub fn source(&self) -> &LayerSource {
        &self.source
    }

    /// Length on screen in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Placement as requested
    pub fn position(&self) -> Position {
        self.position
    }

    /// Resolved top-left corner in the output frame
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Natural size before any resize or crop
    pub fn size(&self) -> Size {
        self.size
    }

    /// Size after the transform pipeline
    pub fn output_size(&self) -> Size {
        transform::output_size(self.size, &self.transforms)
    }

    pub fn start_fade_duration(&self) -> f64 {
        self.start_fade
    }

    pub fn end_fade_duration(&self) -> f64 {
        self.end_fade
    }

    /// Ordered transform pipeline, fades last
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// Whether any geometry step crops the source
    pub fn is_cropped(&self) -> bool {
        self.transforms
            .iter()
            .any(|t| matches!(t, Transform::Crop { .. }))
    }
}
