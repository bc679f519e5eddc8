use serde::{Deserialize, Serialize};

/// Which of a search hit's URLs to download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlTier {
    /// Thumbnail, roughly 150px
    Preview,
    /// Web format, roughly 640px
    #[default]
    Medium,
    /// Up to 1280px
    Large,
}

/// One normalized stock media search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub id: String,
    pub preview_url: String,
    pub medium_url: String,
    pub large_url: String,
    pub page_url: String,
    pub width: u32,
    pub height: u32,
    pub tags: Vec<String>,
    /// Provider name, e.g. "Pixabay"
    pub source: String,
}

impl AssetDescriptor {
    pub fn url(&self, tier: UrlTier) -> &str {
        match tier {
            UrlTier::Preview => &self.preview_url,
            UrlTier::Medium => &self.medium_url,
            UrlTier::Large => &self.large_url,
        }
    }

    /// Local file name for the asset at `tier`: `<source>_<id>.<ext>`
    ///
    /// The extension comes from the URL path and defaults to `jpg`.
    pub fn file_name(&self, tier: UrlTier) -> String {
        let extension = reqwest::Url::parse(self.url(tier))
            .ok()
            .and_then(|url| {
                url.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
            .and_then(|segment| {
                segment
                    .rsplit_once('.')
                    .map(|(_, ext)| ext.to_ascii_lowercase())
            })
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "jpg".to_string());

        format!("{}_{}.{}", sanitize(&self.source), sanitize(&self.id), extension)
    }
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> AssetDescriptor {
        AssetDescriptor {
            id: "123".to_string(),
            preview_url: "https://cdn.example.com/p/preview_150.png".to_string(),
            medium_url: "https://cdn.example.com/m/photo_640.JPG?x=1".to_string(),
            large_url: "https://cdn.example.com/l/photo".to_string(),
            page_url: "https://example.com/photos/123".to_string(),
            width: 640,
            height: 960,
            tags: vec!["sunset".to_string()],
            source: "Pixabay".to_string(),
        }
    }

    #[test]
    fn test_url_tiers() {
        let asset = descriptor();
        assert!(asset.url(UrlTier::Preview).ends_with("preview_150.png"));
        assert!(asset.url(UrlTier::Medium).contains("photo_640"));
        assert!(asset.url(UrlTier::Large).ends_with("/l/photo"));
    }

    #[test]
    fn test_file_name_uses_url_extension() {
        let asset = descriptor();
        assert_eq!(asset.file_name(UrlTier::Medium), "pixabay_123.jpg");
        assert_eq!(asset.file_name(UrlTier::Preview), "pixabay_123.png");
    }

    #[test]
    fn test_file_name_defaults_to_jpg() {
        assert_eq!(descriptor().file_name(UrlTier::Large), "pixabay_123.jpg");
    }

    #[test]
    fn test_file_name_sanitizes_id() {
        let mut asset = descriptor();
        asset.id = "../evil id".to_string();
        assert_eq!(asset.file_name(UrlTier::Medium), "pixabay____evil_id.jpg");
    }
}
