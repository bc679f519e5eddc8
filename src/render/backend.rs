use async_trait::async_trait;
use std::path::PathBuf;

use crate::{composition::Timeline, error::Result};

/// Represents an encoded video output
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedVideo {
    pub path: PathBuf,
    pub duration: f64,
    pub file_size: u64,
}

/// Turns a timeline into a video file inside its output directory
#[async_trait]
pub trait RenderBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn render(&self, timeline: &Timeline) -> Result<RenderedVideo>;
}
