// Minimal walkthrough of the composer: lays out a title card and captions,
// prints the ffmpeg invocation, and optionally runs the full pipeline.
//
// Environment:
//   CLIP_COMPOSER_CONFIG   TOML config file (defaults otherwise)
//   CLIP_COMPOSER_VERBOSE  any value enables debug logging
//   CLIP_COMPOSER_QUERY    search term; when set the short is actually produced
//   CLIP_COMPOSER_OUTPUT   output directory (default "output")
//   PIXABAY_API_KEY        required for CLIP_COMPOSER_QUERY

use std::path::PathBuf;

use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use clip_composer::{
    composition::{ClipComposer, ShortEngine, ShortRequest, Timeline},
    config::Config,
    layer::Position,
    provider::PixabayProvider,
    render::FfmpegRenderer,
    Result,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let log_level = if std::env::var_os("CLIP_COMPOSER_VERBOSE").is_some() {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match EnvFilter::try_from_default_env() {
        Ok(filter) => tracing_subscriber::fmt().with_env_filter(filter).init(),
        Err(_) => tracing_subscriber::fmt().with_max_level(log_level).init(),
    }

    info!("Starting clip-composer v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run().await {
        error!("{}", e.user_message());
        return Err(e.into());
    }

    Ok(())
}

async fn run() -> Result<()> {
    // Load configuration
    let config = match std::env::var_os("CLIP_COMPOSER_CONFIG") {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Config::from_file(&path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    }
    .with_env_overrides();
    config.validate()?;

    let output_dir = std::env::var_os("CLIP_COMPOSER_OUTPUT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("output"));

    // Step 1: text-only timeline
    println!("🎬 clip-composer dry run");
    println!("\n1. Composing text layers...");
    let composer = ClipComposer::new(&config);
    let layers = vec![
        composer.create_text_layer("Golden Hour", 2.0, Position::Center)?,
        composer.create_text_layer("Five minutes of light", 3.0, Position::Bottom)?,
        composer.create_text_layer("Then it is gone", 3.0, Position::Top)?,
    ];
    for layer in &layers {
        let origin = layer.origin();
        println!(
            "   {:?} {}x{} at ({}, {}) for {:.1}s",
            layer.source().text().unwrap_or_default(),
            layer.size().width,
            layer.size().height,
            origin.x,
            origin.y,
            layer.duration()
        );
    }

    // Step 2: assembly
    println!("\n2. Assembling timeline...");
    let timeline = Timeline::assemble(layers, &output_dir)?;
    println!("   {} layers, {:.1}s total", timeline.len(), timeline.duration());

    // Step 3: encoder invocation
    println!("\n3. ffmpeg invocation:");
    let renderer = FfmpegRenderer::new(&config);
    let output = renderer.output_path(&timeline);
    let args = renderer.build_args(&timeline, &output);
    println!("   {} {}", config.render.ffmpeg_binary, args.join(" "));

    // Step 4: the real thing, only when asked
    let Some(query) = std::env::var_os("CLIP_COMPOSER_QUERY") else {
        println!("\nSet CLIP_COMPOSER_QUERY to search, download and render a short.");
        return Ok(());
    };
    let query = query.to_string_lossy().into_owned();

    println!("\n4. Producing short for '{}'...", query);
    let provider = PixabayProvider::new(config.provider.clone())?;
    let engine = ShortEngine::new(config.clone(), Box::new(provider), Box::new(renderer));
    let request = ShortRequest::new(query.as_str(), 3, &output_dir)
        .with_title(query.as_str())
        .with_captions(["Scene one", "Scene two", "Scene three"]);

    let video = engine.produce(&request).await?;
    println!(
        "   ✅ {:?} ({:.1}s, {} bytes)",
        video.path, video.duration, video.file_size
    );

    Ok(())
}
