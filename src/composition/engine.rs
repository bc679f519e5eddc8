use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info, warn};

use crate::{
    composition::{ClipComposer, LayerRequest, Timeline},
    config::Config,
    error::{ComposerError, LayerError, Result},
    layer::{validate_duration, Layer, Position},
    provider::{AssetDescriptor, AssetProvider},
    render::{RenderBackend, RenderedVideo},
};

/// What to make: a search query plus the text to lay over it
#[derive(Debug, Clone)]
pub struct ShortRequest {
    pub query: String,

    /// Number of search results to request
    pub count: usize,

    /// Caption `i` is shown at the bottom of scene `i`
    pub captions: Vec<String>,

    /// Seconds each scene stays on screen
    pub scene_duration: f64,

    /// Centred over the first scene
    pub title: Option<String>,

    /// Receives downloaded assets and the rendered video
    pub output_dir: PathBuf,
}

impl ShortRequest {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(query: S, count: usize, output_dir: P) -> Self {
        Self {
            query: query.into(),
            count,
            captions: Vec::new(),
            scene_duration: 3.0,
            title: None,
            output_dir: output_dir.into(),
        }
    }

    pub fn with_captions<I, S>(mut self, captions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.captions = captions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_scene_duration(mut self, seconds: f64) -> Self {
        self.scene_duration = seconds;
        self
    }
}

/// Orchestrates search, download, composition and rendering
///
/// The engine follows a clear pipeline:
/// 1. Search - Ask the provider for matching images
/// 2. Download - Fetch each hit, skipping the ones that fail
/// 3. Composition - Build image and text layers in parallel
/// 4. Assembly - Schedule the layers into a timeline
/// 5. Render - Hand the timeline to the render backend
pub struct ShortEngine {
    config: Config,
    composer: Arc<ClipComposer>,
    provider: Box<dyn AssetProvider>,
    renderer: Box<dyn RenderBackend>,
}

impl ShortEngine {
    pub fn new(config: Config, provider: Box<dyn AssetProvider>, renderer: Box<dyn RenderBackend>) -> Self {
        let composer = Arc::new(ClipComposer::new(&config));
        Self {
            config,
            composer,
            provider,
            renderer,
        }
    }

    pub fn composer(&self) -> &ClipComposer {
        &self.composer
    }

    /// Run the whole pipeline and return the rendered video
    pub async fn produce(&self, request: &ShortRequest) -> Result<RenderedVideo> {
        info!("🎬 Starting short for '{}'", request.query);
        info!("   Provider: {}", self.provider.name());
        info!("   Renderer: {}", self.renderer.name());
        info!("   Output: {:?}", request.output_dir);

        let timeline = self.build_timeline(request).await?;

        // Pipeline Step 5: Render
        info!("🎞️  Step 5: Rendering with {}...", self.renderer.name());
        let video = self.renderer.render(&timeline).await?;

        info!("🎉 Short complete! Output saved to: {:?}", video.path);
        Ok(video)
    }

    /// Steps 1-4: everything up to, but not including, rendering
    pub async fn build_timeline(&self, request: &ShortRequest) -> Result<Timeline> {
        validate_duration(request.scene_duration)?;

        // Pipeline Step 1: Search
        let assets = self.search(request).await?;

        // Pipeline Step 2: Download
        let downloaded = self.download_assets(&assets, &request.output_dir).await;

        // Pipeline Step 3: Composition
        let scheduled = self.compose_scenes(request, downloaded).await?;

        // Pipeline Step 4: Assembly
        let timeline = Timeline::assemble_scheduled(scheduled, &request.output_dir)?;

        info!("   ✅ Timeline assembled:");
        info!("      Layers: {}", timeline.len());
        info!("      Duration: {:.1}s", timeline.duration());

        Ok(timeline)
    }

    // ==========================================
    // PIPELINE STEP 1: SEARCH
    // ==========================================

    async fn search(&self, request: &ShortRequest) -> Result<Vec<AssetDescriptor>> {
        info!("🔍 Step 1: Searching {} for '{}'...", self.provider.name(), request.query);

        let assets = self.provider.search(&request.query, request.count).await?;

        info!("   ✅ {} result(s)", assets.len());
        for asset in &assets {
            debug!("      {} {}x{} [{}]", asset.id, asset.width, asset.height, asset.tags.join(", "));
        }

        Ok(assets)
    }

    // ==========================================
    // PIPELINE STEP 2: DOWNLOAD
    // ==========================================

    /// Download each asset, keeping only the ones that arrived
    async fn download_assets(&self, assets: &[AssetDescriptor], output_dir: &Path) -> Vec<PathBuf> {
        info!("⬇️  Step 2: Downloading {} asset(s)...", assets.len());

        let tier = self.config.provider.url_tier;
        let assets_dir = output_dir.join("assets");
        let mut downloaded = Vec::with_capacity(assets.len());

        for asset in assets {
            let path = assets_dir.join(asset.file_name(tier));
            let url = asset.url(tier);

            if self.provider.download_media(url, &path).await {
                debug!("      {} -> {:?}", asset.id, path);
                downloaded.push(path);
            } else {
                warn!("Skipping asset {} from {}: download failed", asset.id, asset.source);
            }
        }

        info!("   ✅ {}/{} downloaded", downloaded.len(), assets.len());
        downloaded
    }

    // ==========================================
    // PIPELINE STEP 3: COMPOSITION
    // ==========================================

    /// Image probing and parallel decoding run off the async workers
    async fn compose_scenes(&self, request: &ShortRequest, images: Vec<PathBuf>) -> Result<Vec<(f64, Layer)>> {
        info!("🎨 Step 3: Composing {} scene(s)...", images.len());

        let composer = Arc::clone(&self.composer);
        let request = request.clone();

        let scheduled = task::spawn_blocking(move || schedule_scenes(&composer, &request, &images))
            .await
            .map_err(|e| ComposerError::generic(format!("Scene composition task failed: {}", e)))??;

        info!("   ✅ {} layer(s) composed", scheduled.len());
        Ok(scheduled)
    }
}

/// One fitted scene per readable image, packed back to back
///
/// Unreadable images are skipped along with the caption and title that
/// belonged to their scene. Caption `i` stays tied to downloaded image `i`.
fn schedule_scenes(composer: &ClipComposer, request: &ShortRequest, images: &[PathBuf]) -> Result<Vec<(f64, Layer)>> {
    let duration = request.scene_duration;

    let image_requests: Vec<LayerRequest> = images
        .iter()
        .map(|path| LayerRequest::Image {
            path: path.clone(),
            duration,
            fit_to_frame: true,
        })
        .collect();

    let mut scheduled = Vec::new();
    let mut slot = 0;

    for (scene, result) in composer.create_layers(&image_requests).into_iter().enumerate() {
        let image = match result {
            Ok(layer) => layer,
            Err(ComposerError::Layer(LayerError::AssetNotFound { path })) => {
                warn!("Skipping scene {}: {} is not a readable image", scene, path);
                continue;
            }
            Err(e) => return Err(e),
        };

        let start = slot as f64 * duration;
        slot += 1;
        scheduled.push((start, image));

        if let Some(caption) = request.captions.get(scene) {
            scheduled.push((start, composer.create_text_layer(caption, duration, Position::Bottom)?));
        }

        if scene == 0 {
            if let Some(title) = &request.title {
                scheduled.push((start, composer.create_text_layer(title, duration, Position::Center)?));
            }
        }
    }

    if request.captions.len() > images.len() {
        debug!(
            "Dropping {} caption(s) without a scene",
            request.captions.len() - images.len()
        );
    }

    Ok(scheduled)
}
