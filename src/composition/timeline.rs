use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::{
    error::{Result, TimelineError},
    layer::{Layer, LayerKind},
};

/// A layer and the time it enters the timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    /// Offset from the start of the video in seconds
    pub start: f64,
    pub layer: Layer,
}

impl TimelineEntry {
    pub fn end(&self) -> f64 {
        self.start + self.layer.duration()
    }

    /// Whether the layer is on screen at `time`
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start && time < self.end()
    }
}

/// Ordered layers destined for a render backend
///
/// Entries keep the order they were given in; that order is also the
/// stacking order, later entries drawn above earlier ones. Overlap between
/// entries is allowed and left to whoever schedules them.
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    output_dir: PathBuf,
}

impl Timeline {
    /// Place `layers` back to back, each starting when the previous one ends
    pub fn assemble<P: Into<PathBuf>>(layers: Vec<Layer>, output_dir: P) -> Result<Self> {
        if layers.is_empty() {
            return Err(TimelineError::Empty.into());
        }

        let mut cursor = 0.0;
        let entries = layers
            .into_iter()
            .map(|layer| {
                let start = cursor;
                cursor += layer.duration();
                TimelineEntry { start, layer }
            })
            .collect();

        Ok(Self {
            entries,
            output_dir: output_dir.into(),
        })
    }

    /// Use caller-chosen start offsets
    pub fn assemble_scheduled<P: Into<PathBuf>>(entries: Vec<(f64, Layer)>, output_dir: P) -> Result<Self> {
        if entries.is_empty() {
            return Err(TimelineError::Empty.into());
        }

        if let Some((index, (start, _))) = entries
            .iter()
            .enumerate()
            .find(|(_, (start, _))| !start.is_finite() || *start < 0.0)
        {
            return Err(TimelineError::InvalidStart { index, start: *start }.into());
        }

        Ok(Self {
            entries: entries
                .into_iter()
                .map(|(start, layer)| TimelineEntry { start, layer })
                .collect(),
            output_dir: output_dir.into(),
        })
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Layers in insertion order
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.entries.iter().map(|entry| &entry.layer)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for an assembled timeline
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// End time of the last layer to finish
    pub fn duration(&self) -> f64 {
        self.entries
            .iter()
            .map(TimelineEntry::end)
            .fold(0.0, f64::max)
    }

    /// Entries on screen at `time`, bottom to top
    pub fn active_at(&self, time: f64) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter().filter(move |entry| entry.is_active_at(time))
    }

    pub fn count_of_kind(&self, kind: LayerKind) -> usize {
        self.layers().filter(|layer| layer.kind() == kind).count()
    }
}
