use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    layer::Size,
    provider::UrlTier,
};

/// Environment variable consulted when `provider.api_key` is unset
pub const API_KEY_ENV: &str = "PIXABAY_API_KEY";

/// Main configuration for the clip composer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output frame geometry
    pub frame: FrameConfig,

    /// Default transition lengths
    pub fades: FadeConfig,

    /// Text overlay styling
    pub text: TextConfig,

    /// Stock media provider settings
    pub provider: ProviderConfig,

    /// Render backend settings
    pub render: RenderConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Fill the provider API key from the environment if the file left it empty
    pub fn with_env_overrides(mut self) -> Self {
        if self.provider.api_key.is_none() {
            self.provider.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.frame.validate()?;
        self.fades.validate()?;
        self.text.validate()?;
        self.provider.validate()?;
        self.render.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Target frame of the rendered video (vertical by default)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30.0,
        }
    }
}

impl FrameConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid("frame.size", format!("{}x{}", self.width, self.height)).into());
        }

        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(invalid("frame.fps", self.fps).into());
        }

        Ok(())
    }
}

/// Fade transition lengths in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeConfig {
    pub fade_in: f64,
    pub fade_out: f64,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            fade_in: 0.5,
            fade_out: 0.5,
        }
    }
}

impl FadeConfig {
    fn validate(&self) -> Result<()> {
        if !self.fade_in.is_finite() || self.fade_in < 0.0 {
            return Err(invalid("fades.fade_in", self.fade_in).into());
        }

        if !self.fade_out.is_finite() || self.fade_out < 0.0 {
            return Err(invalid("fades.fade_out", self.fade_out).into());
        }

        Ok(())
    }
}

/// Text overlay styling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Font size in pixels
    pub font_size: u32,

    /// Fill colour, any ffmpeg colour name or hex value
    pub color: String,

    /// Inset from the frame edge for `Top` and `Bottom` placement
    pub margin: u32,

    /// Font file for drawtext; fontconfig default when unset
    pub font_file: Option<PathBuf>,

    /// Outline colour, no outline when unset
    pub stroke_color: Option<String>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_size: 70,
            color: "white".to_string(),
            margin: 100,
            font_file: None,
            stroke_color: Some("black".to_string()),
        }
    }
}

impl TextConfig {
    fn validate(&self) -> Result<()> {
        if self.font_size == 0 {
            return Err(invalid("text.font_size", self.font_size).into());
        }

        if self.color.trim().is_empty() {
            return Err(invalid("text.color", "<empty>").into());
        }

        Ok(())
    }
}

/// Stock media provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Search endpoint
    pub base_url: String,

    /// API key; falls back to `PIXABAY_API_KEY`
    pub api_key: Option<String>,

    /// Which URL of a search hit gets downloaded
    pub url_tier: UrlTier,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    pub safe_search: bool,

    /// "all", "horizontal" or "vertical"
    pub orientation: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pixabay.com/api/".to_string(),
            api_key: None,
            url_tier: UrlTier::Medium,
            timeout_secs: 30,
            safe_search: true,
            orientation: "vertical".to_string(),
        }
    }
}

impl ProviderConfig {
    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(invalid("provider.base_url", "<empty>").into());
        }

        if self.timeout_secs == 0 {
            return Err(invalid("provider.timeout_secs", self.timeout_secs).into());
        }

        if !matches!(self.orientation.as_str(), "all" | "horizontal" | "vertical") {
            return Err(invalid("provider.orientation", &self.orientation).into());
        }

        Ok(())
    }
}

/// FFmpeg render backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub ffmpeg_binary: String,

    /// Video codec passed to `-c:v`
    pub codec: String,

    /// Constant rate factor (0-51, lower is better)
    pub crf: u8,

    /// Encoder threads
    pub threads: usize,

    /// Output file name; timestamped when unset
    pub file_name: Option<String>,

    /// Canvas colour behind all layers
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: "ffmpeg".to_string(),
            codec: "libx264".to_string(),
            crf: 23,
            threads: num_cpus::get(),
            file_name: None,
            background: "black".to_string(),
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.crf > 51 {
            return Err(invalid("render.crf", self.crf).into());
        }

        if self.threads == 0 {
            return Err(invalid("render.threads", self.threads).into());
        }

        if self.ffmpeg_binary.trim().is_empty() {
            return Err(invalid("render.ffmpeg_binary", "<empty>").into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.frame.width = 720;
        original_config.fades.fade_out = 0.25;

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded_config.frame.width, 720);
        assert_eq!(loaded_config.fades, original_config.fades);
        assert_eq!(loaded_config.provider.url_tier, UrlTier::Medium);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[fades]\nfade_in = 1.0\nfade_out = 0.0\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.fades.fade_in, 1.0);
        assert_eq!(config.frame.height, 1920);
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/definitely/not/here.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_frame() {
        let mut config = Config::default();
        config.frame.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_fade_rejected() {
        let mut config = Config::default();
        config.fades.fade_in = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_crf_range() {
        let mut config = Config::default();
        config.render.crf = 52;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_api_key_not_overridden() {
        let mut config = Config::default();
        config.provider.api_key = Some("from-file".to_string());
        let config = config.with_env_overrides();
        assert_eq!(config.provider.api_key.as_deref(), Some("from-file"));
    }
}
