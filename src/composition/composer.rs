use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;

use crate::{
    config::{Config, FadeConfig, TextConfig},
    error::{LayerError, Result},
    layer::{
        transform, types::validate_duration, GlyphEstimate, Layer, LayerSource, LayerSpec,
        Position, Size, TextMeasure, Transform,
    },
};

/// Builds composed layers from text and image sources
///
/// Every constructor is independent and touches no shared state, so a single
/// composer can be used from many threads at once.
pub struct ClipComposer {
    frame: Size,
    fades: FadeConfig,
    text: TextConfig,
    measure: Box<dyn TextMeasure>,
}

/// One layer to build in a batch
#[derive(Debug, Clone, PartialEq)]
pub enum LayerRequest {
    Text {
        text: String,
        duration: f64,
        position: Position,
    },
    Image {
        path: PathBuf,
        duration: f64,
        fit_to_frame: bool,
    },
}

impl ClipComposer {
    pub fn new(config: &Config) -> Self {
        Self {
            frame: config.frame.size(),
            fades: config.fades,
            text: config.text.clone(),
            measure: Box::new(GlyphEstimate::default()),
        }
    }

    /// Replace the text measurement backend
    pub fn with_measure<M: TextMeasure + 'static>(mut self, measure: M) -> Self {
        self.measure = Box::new(measure);
        self
    }

    /// Target output frame
    pub fn frame(&self) -> Size {
        self.frame
    }

    /// Build a text layer placed at `position` with the fade pair applied
    pub fn create_text_layer(&self, text: &str, duration: f64, position: Position) -> Result<Layer> {
        validate_duration(duration)?;

        let size = self.measure.measure(text, self.text.font_size);
        let layer = LayerSpec::new(LayerSource::Text(text.to_string()), duration, size)
            .with_position(position)
            .compose(self.frame, self.text.margin, self.fades)?;

        debug!(
            "Text layer {:?}: {}x{} at ({}, {}) for {:.2}s",
            text,
            size.width,
            size.height,
            layer.origin().x,
            layer.origin().y,
            duration
        );

        Ok(layer)
    }

    /// Build an image layer from a file on disk
    ///
    /// With `fit_to_frame` the image is scaled to cover the output frame and
    /// centre-cropped to exactly its size. Otherwise it keeps its natural size
    /// and is centred.
    pub fn create_image_layer<P: AsRef<Path>>(&self, path: P, duration: f64, fit_to_frame: bool) -> Result<Layer> {
        let path = path.as_ref();
        validate_duration(duration)?;

        let natural = read_dimensions(path)?;
        let mut spec = LayerSpec::new(LayerSource::Image(path.to_path_buf()), duration, natural);

        if fit_to_frame {
            spec = spec.with_transforms(transform::fit_to_frame(natural, self.frame));
        }

        let layer = spec.compose(self.frame, 0, self.fades)?;
        debug!(
            "Image layer {:?}: natural {}x{}, output {}x{}, fitted: {}",
            path,
            natural.width,
            natural.height,
            layer.output_size().width,
            layer.output_size().height,
            fit_to_frame
        );

        Ok(layer)
    }

    /// Build an image layer resized to `size` without cropping
    pub fn create_image_layer_sized<P: AsRef<Path>>(&self, path: P, duration: f64, size: Size) -> Result<Layer> {
        let path = path.as_ref();
        validate_duration(duration)?;

        let natural = read_dimensions(path)?;
        let mut spec = LayerSpec::new(LayerSource::Image(path.to_path_buf()), duration, natural);
        if size != natural {
            spec = spec.with_transform(Transform::Resize {
                width: size.width,
                height: size.height,
            });
        }

        spec.compose(self.frame, 0, self.fades)
    }

    /// Build one layer per request in parallel
    ///
    /// Results line up with `requests` regardless of which finishes first.
    pub fn create_layers(&self, requests: &[LayerRequest]) -> Vec<Result<Layer>> {
        requests
            .par_iter()
            .map(|request| self.create_layer(request))
            .collect()
    }

    pub fn create_layer(&self, request: &LayerRequest) -> Result<Layer> {
        match request {
            LayerRequest::Text { text, duration, position } => {
                self.create_text_layer(text, *duration, *position)
            }
            LayerRequest::Image { path, duration, fit_to_frame } => {
                self.create_image_layer(path, *duration, *fit_to_frame)
            }
        }
    }
}

/// Natural size of the image at `path`, sniffing the format from its bytes
fn read_dimensions(path: &Path) -> Result<Size> {
    let not_found = || LayerError::AssetNotFound {
        path: path.display().to_string(),
    };

    let (width, height) = image::io::Reader::open(path)
        .map_err(|_| not_found())?
        .with_guessed_format()
        .map_err(|_| not_found())?
        .into_dimensions()
        .map_err(|_| not_found())?;

    if width == 0 || height == 0 {
        return Err(not_found().into());
    }

    Ok(Size::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComposerError;
    use crate::layer::{LayerKind, Point};
    use image::RgbImage;
    use tempfile::{tempdir, TempDir};

    fn composer() -> ClipComposer {
        ClipComposer::new(&Config::default())
    }

    fn write_image(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.path().join(name);
        RgbImage::new(width, height).save(&path).unwrap();
        path
    }

    fn is_invalid_duration(result: Result<Layer>) -> bool {
        matches!(result, Err(ComposerError::Layer(LayerError::InvalidDuration { .. })))
    }

    struct FixedMeasure(Size);

    impl TextMeasure for FixedMeasure {
        fn measure(&self, _text: &str, _font_size: u32) -> Size {
            self.0
        }
    }

    #[test]
    fn test_create_text_layer_center() {
        let composer = composer().with_measure(FixedMeasure(Size::new(500, 100)));
        let layer = composer.create_text_layer("Hello", 3.0, Position::Center).unwrap();

        assert_eq!(layer.kind(), LayerKind::Text);
        assert_eq!(layer.source().text(), Some("Hello"));
        assert_eq!(layer.duration(), 3.0);
        assert_eq!(layer.size(), Size::new(500, 100));
        assert_eq!(layer.origin(), Point::new(290, 910));

        let frame = composer.frame();
        assert_eq!(layer.origin().x * 2 + 500, frame.width as i32);
        assert_eq!(layer.origin().y * 2 + 100, frame.height as i32);

        let fades: Vec<&Transform> = layer.transforms().iter().filter(|t| t.is_fade()).collect();
        assert_eq!(fades.len(), 2);
        assert!(matches!(fades[0], Transform::FadeIn { .. }));
        assert!(matches!(fades[1], Transform::FadeOut { .. }));
    }

    #[test]
    fn test_create_text_layer_japanese() {
        let layer = composer().create_text_layer("テストテキスト", 3.0, Position::Bottom).unwrap();
        assert!(layer.size().width > 0);
        assert_eq!(layer.transforms().len(), 2);
    }

    #[test]
    fn test_text_duration_is_exact() {
        let composer = composer();
        for duration in [0.001, 0.3, 1.0, 2.75, 3.0, 17.123456] {
            let layer = composer.create_text_layer("x", duration, Position::Top).unwrap();
            assert_eq!(layer.duration(), duration);
            assert!(layer.start_fade_duration() + layer.end_fade_duration() <= duration);
        }
    }

    #[test]
    fn test_text_rejects_non_positive_duration() {
        let composer = composer();
        assert!(is_invalid_duration(composer.create_text_layer("x", 0.0, Position::Center)));
        assert!(is_invalid_duration(composer.create_text_layer("x", -2.0, Position::Center)));
    }

    #[test]
    fn test_short_text_layer_clamps_fades() {
        let layer = composer().create_text_layer("quick", 0.6, Position::Center).unwrap();
        assert_eq!(layer.start_fade_duration(), 0.3);
        assert_eq!(layer.end_fade_duration(), 0.3);
    }

    #[test]
    fn test_short_image_layer_clamps_fades() {
        let dir = TempDir::new().unwrap();
        let path = write_image(&dir, "flash.png", 320, 240);
        let composer = composer();

        for fit in [true, false] {
            let layer = composer.create_image_layer(&path, 0.4, fit).unwrap();
            assert_eq!(layer.duration(), 0.4);
            assert_eq!(layer.start_fade_duration(), 0.2);
            assert_eq!(layer.end_fade_duration(), 0.2);
            assert!(layer.start_fade_duration() + layer.end_fade_duration() <= layer.duration());
        }
    }

    #[test]
    fn test_custom_position() {
        let layer = composer()
            .create_text_layer("x", 1.0, Position::Custom { x: 12, y: 34 })
            .unwrap();
        assert_eq!(layer.origin(), Point::new(12, 34));
    }

    #[test]
    fn test_image_layer_natural_size() {
        let dir = tempdir().unwrap();
        let path = write_image(&dir, "photo.png", 1080, 1920);

        let layer = composer().create_image_layer(&path, 3.0, false).unwrap();

        assert_eq!(layer.kind(), LayerKind::Image);
        assert_eq!(layer.source().path(), Some(path.as_path()));
        assert_eq!(layer.size(), Size::new(1080, 1920));
        assert_eq!(layer.output_size(), Size::new(1080, 1920));
        assert!(!layer.is_cropped());
        assert_eq!(layer.duration(), 3.0);
        assert_eq!(layer.transforms().len(), 2);
    }

    #[test]
    fn test_image_layer_jpeg_with_any_extension() {
        let dir = tempdir().unwrap();
        let jpeg = write_image(&dir, "photo.jpg", 64, 48);
        let renamed = dir.path().join("photo.bin");
        std::fs::copy(&jpeg, &renamed).unwrap();

        let layer = composer().create_image_layer(&renamed, 1.0, false).unwrap();
        assert_eq!(layer.size(), Size::new(64, 48));
    }

    #[test]
    fn test_image_layer_fit_to_frame() {
        let dir = tempdir().unwrap();
        let composer = composer();

        for (name, width, height) in [("wide.png", 1920, 1080), ("square.png", 500, 500), ("tall.png", 300, 1200)] {
            let path = write_image(&dir, name, width, height);
            let layer = composer.create_image_layer(&path, 2.0, true).unwrap();

            let output = layer.output_size();
            assert_eq!(output, composer.frame(), "source {}", name);
            assert_eq!(output.width * 1920, output.height * 1080);
            assert_eq!(layer.size(), Size::new(width, height));
            assert_eq!(layer.origin(), Point::new(0, 0));

            let names: Vec<&str> = layer.transforms().iter().map(|t| t.name()).collect();
            assert_eq!(names, vec!["resize", "crop", "fade_in", "fade_out"]);
        }
    }

    #[test]
    fn test_image_layer_missing_file() {
        let err = composer().create_image_layer("does/not/exist.jpg", 3.0, false).unwrap_err();
        assert!(matches!(err, ComposerError::Layer(LayerError::AssetNotFound { .. })));
    }

    #[test]
    fn test_image_layer_not_an_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, b"definitely not jpeg").unwrap();

        let err = composer().create_image_layer(&path, 3.0, true).unwrap_err();
        assert!(matches!(err, ComposerError::Layer(LayerError::AssetNotFound { .. })));
    }

    #[test]
    fn test_image_duration_checked_before_io() {
        let composer = composer();
        assert!(is_invalid_duration(composer.create_image_layer("missing.jpg", 0.0, false)));
        assert!(is_invalid_duration(composer.create_image_layer("missing.jpg", -1.0, true)));
    }

    #[test]
    fn test_image_layer_sized() {
        let dir = tempdir().unwrap();
        let path = write_image(&dir, "logo.png", 100, 50);

        let layer = composer().create_image_layer_sized(&path, 1.5, Size::new(400, 200)).unwrap();
        assert_eq!(layer.output_size(), Size::new(400, 200));
        assert!(!layer.is_cropped());
        assert_eq!(layer.origin(), Point::new(340, 860));
    }

    #[test]
    fn test_create_layers_preserves_order() {
        let dir = tempdir().unwrap();
        let image = write_image(&dir, "a.png", 40, 30);

        let mut requests = Vec::new();
        for i in 0..16 {
            requests.push(LayerRequest::Text {
                text: format!("caption {}", i),
                duration: 1.0 + i as f64,
                position: Position::Bottom,
            });
            requests.push(LayerRequest::Image {
                path: image.clone(),
                duration: 1.0 + i as f64,
                fit_to_frame: true,
            });
        }
        requests.push(LayerRequest::Text {
            text: "bad".to_string(),
            duration: 0.0,
            position: Position::Center,
        });

        let results = composer().create_layers(&requests);
        assert_eq!(results.len(), requests.len());

        for (request, result) in requests.iter().zip(&results).take(32) {
            let layer = result.as_ref().unwrap();
            match request {
                LayerRequest::Text { text, duration, .. } => {
                    assert_eq!(layer.source().text(), Some(text.as_str()));
                    assert_eq!(layer.duration(), *duration);
                }
                LayerRequest::Image { duration, .. } => {
                    assert_eq!(layer.kind(), LayerKind::Image);
                    assert_eq!(layer.duration(), *duration);
                }
            }
        }

        assert!(results.last().unwrap().is_err());
    }
}
