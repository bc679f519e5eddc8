use thiserror::Error;

/// Main error type for the clip-composer library
#[derive(Error, Debug)]
pub enum ComposerError {
    #[error("Layer error: {0}")]
    Layer(#[from] LayerError),

    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    #[error("Asset provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Errors raised while building a single layer
#[derive(Error, Debug, PartialEq)]
pub enum LayerError {
    #[error("Invalid layer duration: {duration}s (must be greater than zero)")]
    InvalidDuration { duration: f64 },

    #[error("Asset not found or not a readable image: {path}")]
    AssetNotFound { path: String },
}

/// Errors raised while assembling a timeline
#[derive(Error, Debug, PartialEq)]
pub enum TimelineError {
    #[error("Timeline has no layers to render")]
    Empty,

    #[error("Invalid start offset for layer {index}: {start}s")]
    InvalidStart { index: usize, start: f64 },
}

/// Stock media provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("No API key configured for provider: {provider}")]
    MissingApiKey { provider: String },

    #[error("Request to {provider} failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("{provider} returned HTTP status {status}")]
    BadStatus { provider: String, status: u16 },

    #[error("Unexpected response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Render backend errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("FFmpeg binary not available: {binary}")]
    FfmpegUnavailable { binary: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Rendered output not found: {path}")]
    OutputMissing { path: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using ComposerError
pub type Result<T> = std::result::Result<T, ComposerError>;

impl ComposerError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Provider(ProviderError::RequestFailed { .. }) => true,
            Self::Provider(ProviderError::BadStatus { status, .. }) => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Layer(LayerError::AssetNotFound { path }) => {
                format!("Could not load image '{}'. Please check the file exists and is a PNG or JPEG.", path)
            }
            Self::Timeline(TimelineError::Empty) => {
                "Nothing to render: no layers were produced. Check that at least one asset downloaded.".to_string()
            }
            Self::Provider(ProviderError::MissingApiKey { provider }) => {
                format!("No API key for {}. Set it in the config file or the PIXABAY_API_KEY environment variable.", provider)
            }
            Self::Render(RenderError::FfmpegUnavailable { binary }) => {
                format!("Could not run '{}'. Please install FFmpeg or point render.ffmpeg_binary at it.", binary)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
