use crate::layer::types::Size;

/// Measures the natural size of rendered text
///
/// The real glyph metrics belong to the render backend; the composer only
/// needs a width and height to place the layer.
pub trait TextMeasure: Send + Sync {
    fn measure(&self, text: &str, font_size: u32) -> Size;
}

/// Em-based estimate of text extents
///
/// Narrow characters advance by `narrow_advance` em, East Asian wide
/// characters and emoji by `wide_advance` em. Every line is `line_height`
/// em tall.
#[derive(Debug, Clone, Copy)]
pub struct GlyphEstimate {
    pub narrow_advance: f64,
    pub wide_advance: f64,
    pub line_height: f64,
}

impl Default for GlyphEstimate {
    fn default() -> Self {
        Self {
            narrow_advance: 0.6,
            wide_advance: 1.0,
            line_height: 1.2,
        }
    }
}

impl GlyphEstimate {
    fn line_width(&self, line: &str) -> f64 {
        let wide = line.chars().filter(|&c| is_wide(c)).count();
        let narrow = line.chars().count() - wide;
        narrow as f64 * self.narrow_advance + wide as f64 * self.wide_advance
    }
}

impl TextMeasure for GlyphEstimate {
    fn measure(&self, text: &str, font_size: u32) -> Size {
        let em = font_size as f64;
        let lines: Vec<&str> = text.lines().collect();
        let line_count = lines.len().max(1);

        let widest = lines
            .iter()
            .map(|line| self.line_width(line))
            .fold(0.0_f64, f64::max);

        Size::new(
            (widest * em).round() as u32,
            (line_count as f64 * self.line_height * em).round() as u32,
        )
    }
}

fn is_wide(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x115F
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x1F300..=0x1F64F
            | 0x1F900..=0x1F9FF
            | 0x20000..=0x3FFFD
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_width() {
        let size = GlyphEstimate::default().measure("Hello", 100);
        assert_eq!(size, Size::new(300, 120));
    }

    #[test]
    fn test_wide_characters_take_full_em() {
        let estimate = GlyphEstimate::default();
        let narrow = estimate.measure("abcd", 50);
        let wide = estimate.measure("テスト文", 50);
        assert!(wide.width > narrow.width);
        assert_eq!(wide.width, 200);
    }

    #[test]
    fn test_multiline_uses_widest_line() {
        let size = GlyphEstimate::default().measure("ab\nabcd\na", 10);
        assert_eq!(size.width, 24);
        assert_eq!(size.height, 36);
    }

    #[test]
    fn test_empty_text_is_one_line() {
        let size = GlyphEstimate::default().measure("", 10);
        assert_eq!(size, Size::new(0, 12));
    }
}
