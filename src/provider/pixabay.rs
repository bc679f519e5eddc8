use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    config::ProviderConfig,
    error::{ProviderError, Result},
    provider::{download, AssetDescriptor, AssetProvider},
};

/// Pixabay image search
///
/// Raw API hits are mapped to [`AssetDescriptor`]s here; nothing downstream
/// sees the provider's JSON.
pub struct PixabayProvider {
    client: Client,
    config: ProviderConfig,
}

impl PixabayProvider {
    pub const SOURCE: &'static str = "Pixabay";

    /// The API accepts `per_page` only within this range
    const PER_PAGE_MIN: usize = 3;
    const PER_PAGE_MAX: usize = 200;

    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("clip-composer/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::RequestFailed {
                provider: Self::SOURCE.to_string(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self::with_client(config, client))
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(config: ProviderConfig, client: Client) -> Self {
        Self { client, config }
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey { provider: Self::SOURCE.to_string() }.into())
    }

    /// Request URL for a search of `count` results
    pub fn search_url(&self, query: &str, count: usize) -> Result<Url> {
        let per_page = count.clamp(Self::PER_PAGE_MIN, Self::PER_PAGE_MAX).to_string();
        let params = [
            ("key", self.api_key()?),
            ("q", query),
            ("image_type", "photo"),
            ("per_page", per_page.as_str()),
            ("safesearch", if self.config.safe_search { "true" } else { "false" }),
            ("orientation", self.config.orientation.as_str()),
        ];

        Url::parse_with_params(&self.config.base_url, &params).map_err(|e| {
            ProviderError::InvalidResponse {
                provider: Self::SOURCE.to_string(),
                reason: format!("Bad base URL '{}': {}", self.config.base_url, e),
            }
            .into()
        })
    }
}

#[async_trait]
impl AssetProvider for PixabayProvider {
    fn name(&self) -> &str {
        Self::SOURCE
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<AssetDescriptor>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let url = self.search_url(query, count)?;
        debug!("Searching {} for '{}' ({} results)", Self::SOURCE, query, count);

        let response = self.client.get(url).send().await.map_err(|e| ProviderError::RequestFailed {
            provider: Self::SOURCE.to_string(),
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(ProviderError::BadStatus {
                provider: Self::SOURCE.to_string(),
                status: response.status().as_u16(),
            }.into());
        }

        let body: SearchResponse = response.json().await.map_err(|e| ProviderError::InvalidResponse {
            provider: Self::SOURCE.to_string(),
            reason: e.to_string(),
        })?;

        let assets = descriptors_from_response(body, count);
        info!("{} returned {} result(s) for '{}'", Self::SOURCE, assets.len(), query);
        Ok(assets)
    }

    async fn download_media(&self, url: &str, path: &Path) -> bool {
        match download::stream_to_file(&self.client, Self::SOURCE, url, path).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Download of {} failed: {}", url, e);
                false
            }
        }
    }
}

/// Search endpoint payload
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

/// One hit as the API sends it
#[derive(Debug, Deserialize)]
pub struct RawHit {
    pub id: RawId,
    #[serde(rename = "previewURL", default)]
    pub preview_url: String,
    #[serde(rename = "webformatURL", default)]
    pub webformat_url: String,
    #[serde(rename = "largeImageURL", default)]
    pub large_image_url: String,
    #[serde(rename = "pageURL", default)]
    pub page_url: String,
    #[serde(rename = "webformatWidth", default)]
    pub webformat_width: u32,
    #[serde(rename = "webformatHeight", default)]
    pub webformat_height: u32,
    /// Comma separated
    #[serde(default)]
    pub tags: String,
}

/// Ids arrive as numbers from the live API and as strings from some mirrors
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for RawId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawId::Number(n) => write!(f, "{}", n),
            RawId::Text(s) => f.write_str(s),
        }
    }
}

impl From<RawHit> for AssetDescriptor {
    fn from(hit: RawHit) -> Self {
        AssetDescriptor {
            id: hit.id.to_string(),
            preview_url: hit.preview_url,
            medium_url: hit.webformat_url,
            large_url: hit.large_image_url,
            page_url: hit.page_url,
            width: hit.webformat_width,
            height: hit.webformat_height,
            tags: hit
                .tags
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
            source: PixabayProvider::SOURCE.to_string(),
        }
    }
}

/// Map a search payload to at most `count` descriptors, in API order
pub fn descriptors_from_response(response: SearchResponse, count: usize) -> Vec<AssetDescriptor> {
    response
        .hits
        .into_iter()
        .take(count)
        .map(AssetDescriptor::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_support;
    use tempfile::tempdir;

    const FIXTURE: &str = r#"{
        "total": 2,
        "totalHits": 2,
        "hits": [
            {
                "id": "123",
                "previewURL": "http://example.com/preview.jpg",
                "webformatURL": "http://example.com/medium.jpg",
                "largeImageURL": "http://example.com/large.jpg",
                "pageURL": "http://example.com/page",
                "webformatWidth": 800,
                "webformatHeight": 600,
                "tags": "test, image"
            },
            {
                "id": 456,
                "previewURL": "http://example.com/p2.jpg",
                "webformatURL": "http://example.com/m2.jpg",
                "largeImageURL": "http://example.com/l2.jpg",
                "pageURL": "http://example.com/page2",
                "webformatWidth": 640,
                "webformatHeight": 427,
                "tags": "sunset,,sky "
            }
        ]
    }"#;

    fn config_with_key(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            base_url: base_url.to_string(),
            api_key: Some("test-key".to_string()),
            ..ProviderConfig::default()
        }
    }

    fn provider(base_url: &str) -> PixabayProvider {
        PixabayProvider::with_client(config_with_key(base_url), test_support::client())
    }

    #[test]
    fn test_parse_hits() {
        let response: SearchResponse = serde_json::from_str(FIXTURE).unwrap();
        let assets = descriptors_from_response(response, 10);

        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].id, "123");
        assert_eq!(assets[0].source, "Pixabay");
        assert_eq!(assets[0].medium_url, "http://example.com/medium.jpg");
        assert_eq!(assets[0].tags, vec!["test", "image"]);
        assert_eq!(assets[1].id, "456");
        assert_eq!(assets[1].tags, vec!["sunset", "sky"]);
        assert_eq!((assets[1].width, assets[1].height), (640, 427));
    }

    #[test]
    fn test_parse_truncates_to_count() {
        let response: SearchResponse = serde_json::from_str(FIXTURE).unwrap();
        let assets = descriptors_from_response(response, 1);
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "123");
    }

    #[test]
    fn test_search_url_clamps_per_page() {
        let provider = provider("https://pixabay.com/api/");

        let url = provider.search_url("sunset beach", 1).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("per_page".to_string(), "3".to_string())));
        assert!(pairs.contains(&("q".to_string(), "sunset beach".to_string())));
        assert!(pairs.contains(&("key".to_string(), "test-key".to_string())));

        let url = provider.search_url("sunset", 500).unwrap();
        assert!(url.query().unwrap().contains("per_page=200"));
    }

    #[test]
    fn test_missing_api_key() {
        let provider = PixabayProvider::with_client(ProviderConfig::default(), test_support::client());
        let err = provider.search_url("sunset", 3).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ComposerError::Provider(ProviderError::MissingApiKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_zero_count_skips_request() {
        // Unroutable base URL: any request would fail
        let provider = provider("http://127.0.0.1:9/api/");
        let assets = provider.search("sunset", 0).await.unwrap();
        assert!(assets.is_empty());
    }

    #[tokio::test]
    async fn test_search_against_server() {
        let base = test_support::serve(vec![
            test_support::Route::json("/api/", FIXTURE),
        ]).await;

        let provider = provider(&format!("{}/api/", base));
        let assets = provider.search("test", 1).await.unwrap();

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "123");
        assert_eq!(assets[0].source, "Pixabay");
    }

    #[tokio::test]
    async fn test_search_bad_status() {
        let base = test_support::serve(vec![]).await;
        let provider = provider(&format!("{}/api/", base));

        let err = provider.search("test", 3).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::ComposerError::Provider(ProviderError::BadStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_download_media_writes_file() {
        let base = test_support::serve(vec![
            test_support::Route::bytes("/image.jpg", b"test_content".to_vec()),
        ]).await;

        let dir = tempdir().unwrap();
        let save_path = dir.path().join("nested").join("test_image.jpg");
        let provider = provider(&format!("{}/api/", base));

        let ok = provider.download_media(&format!("{}/image.jpg", base), &save_path).await;

        assert!(ok);
        assert_eq!(std::fs::read(&save_path).unwrap(), b"test_content");
        assert!(!download::partial_path(&save_path).exists());

        // Retrying on the same destination is harmless
        let ok = provider.download_media(&format!("{}/image.jpg", base), &save_path).await;
        assert!(ok);
        assert_eq!(std::fs::read(&save_path).unwrap(), b"test_content");
    }

    #[tokio::test]
    async fn test_download_media_failure_returns_false() {
        let base = test_support::serve(vec![]).await;
        let dir = tempdir().unwrap();
        let save_path = dir.path().join("missing.jpg");
        let provider = provider(&format!("{}/api/", base));

        assert!(!provider.download_media(&format!("{}/nope.jpg", base), &save_path).await);
        assert!(!provider.download_media("not a url", &save_path).await);
        assert!(!save_path.exists());
        assert!(!download::partial_path(&save_path).exists());
    }
}
