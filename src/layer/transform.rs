use serde::{Deserialize, Serialize};

use crate::config::FadeConfig;
use crate::layer::types::Size;

/// One step of a layer's visual pipeline
///
/// Transforms are applied in order by the render backend. Geometry steps
/// (`Resize`, `Crop`) change the layer's output size; fades only ramp
/// opacity and leave the size alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transform {
    /// Scale to an exact size
    Resize { width: u32, height: u32 },

    /// Keep the `width`x`height` window whose top-left corner is at `x`,`y`
    Crop { x: u32, y: u32, width: u32, height: u32 },

    /// Ramp opacity 0 -> 1 over the first `duration` seconds
    FadeIn { duration: f64 },

    /// Ramp opacity 1 -> 0 over the last `duration` seconds
    FadeOut { duration: f64 },
}

impl Transform {
    /// Size of the layer after this step
    pub fn apply_size(&self, input: Size) -> Size {
        match *self {
            Transform::Resize { width, height } => Size::new(width, height),
            Transform::Crop { width, height, .. } => Size::new(width, height),
            Transform::FadeIn { .. } | Transform::FadeOut { .. } => input,
        }
    }

    pub fn is_fade(&self) -> bool {
        matches!(self, Transform::FadeIn { .. } | Transform::FadeOut { .. })
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Transform::Resize { .. } => "resize",
            Transform::Crop { .. } => "crop",
            Transform::FadeIn { .. } => "fade_in",
            Transform::FadeOut { .. } => "fade_out",
        }
    }
}

/// Output size of `natural` after running every step of `transforms`
pub fn output_size(natural: Size, transforms: &[Transform]) -> Size {
    transforms
        .iter()
        .fold(natural, |size, transform| transform.apply_size(size))
}

/// Resize-to-cover followed by a centred crop to exactly `frame`
///
/// The resize keeps the source aspect ratio and makes both axes at least as
/// large as the frame; the crop trims the overflow symmetrically, so only the
/// longer relative axis loses pixels.
pub fn fit_to_frame(natural: Size, frame: Size) -> [Transform; 2] {
    let scale_x = frame.width as f64 / natural.width.max(1) as f64;
    let scale_y = frame.height as f64 / natural.height.max(1) as f64;
    let scale = scale_x.max(scale_y);

    let scaled_width = ((natural.width as f64 * scale).round() as u32).max(frame.width);
    let scaled_height = ((natural.height as f64 * scale).round() as u32).max(frame.height);

    [
        Transform::Resize {
            width: scaled_width,
            height: scaled_height,
        },
        Transform::Crop {
            x: (scaled_width - frame.width) / 2,
            y: (scaled_height - frame.height) / 2,
            width: frame.width,
            height: frame.height,
        },
    ]
}

/// Fade lengths that fit inside `duration`
///
/// When the configured pair would overlap, each fade is capped at half the
/// duration. Inputs that already fit are returned untouched.
pub fn clamp_fades(duration: f64, fades: FadeConfig) -> (f64, f64) {
    let fade_in = fades.fade_in.max(0.0);
    let fade_out = fades.fade_out.max(0.0);

    if fade_in + fade_out <= duration {
        return (fade_in, fade_out);
    }

    let half = duration / 2.0;
    (fade_in.min(half), fade_out.min(half))
}
