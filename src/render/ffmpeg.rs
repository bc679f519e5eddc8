use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::{
    composition::{Timeline, TimelineEntry},
    config::{Config, FrameConfig, RenderConfig, TextConfig},
    error::{RenderError, Result},
    layer::{LayerSource, Position, Transform},
    render::{RenderBackend, RenderedVideo},
};

/// Render backend driving an external `ffmpeg` process
///
/// Every image layer becomes a looped still input whose transform pipeline is
/// translated into a filter chain and overlaid on a solid canvas; text layers
/// become `drawtext` filters reading from small text files written next to
/// the output.
pub struct FfmpegRenderer {
    render: RenderConfig,
    frame: FrameConfig,
    text: TextConfig,
}

impl FfmpegRenderer {
    pub fn new(config: &Config) -> Self {
        Self {
            render: config.render.clone(),
            frame: config.frame.clone(),
            text: config.text.clone(),
        }
    }

    pub async fn check_ffmpeg_available(&self) -> bool {
        Command::new(&self.render.ffmpeg_binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Where the encoded file for `timeline` goes
    pub fn output_path(&self, timeline: &Timeline) -> PathBuf {
        let file_name = self.render.file_name.clone().unwrap_or_else(|| {
            format!("short_{}.mp4", chrono::Local::now().format("%Y%m%d_%H%M%S"))
        });
        timeline.output_dir().join(file_name)
    }

    /// Text file read by the `drawtext` filter of entry `index`
    pub fn text_file_path(&self, timeline: &Timeline, index: usize) -> PathBuf {
        timeline
            .output_dir()
            .join("text")
            .join(format!("layer_{:03}.txt", index))
    }

    /// Full ffmpeg argument list for encoding `timeline` into `output`
    pub fn build_args(&self, timeline: &Timeline, output: &Path) -> Vec<String> {
        let total = timeline.duration();
        let mut args: Vec<String> = ["-y", "-hide_banner", "-loglevel", "error"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        args.extend([
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            format!(
                "color=c={}:s={}x{}:r={}:d={}",
                self.render.background,
                self.frame.width,
                self.frame.height,
                self.frame.fps,
                secs(total)
            ),
        ]);

        let mut graph = Vec::new();
        let mut current = "[0:v]".to_string();
        let mut next_input = 1;

        for (index, entry) in timeline.entries().iter().enumerate() {
            let label = format!("[v{}]", index);

            match entry.layer.source() {
                LayerSource::Image(path) => {
                    args.extend([
                        "-loop".to_string(),
                        "1".to_string(),
                        "-framerate".to_string(),
                        self.frame.fps.to_string(),
                        "-t".to_string(),
                        secs(entry.layer.duration()),
                        "-i".to_string(),
                        path.display().to_string(),
                    ]);

                    let layer_label = format!("[l{}]", index);
                    graph.push(format!(
                        "[{}:v]{}{}",
                        next_input,
                        image_filters(entry).join(","),
                        layer_label
                    ));
                    graph.push(format!(
                        "{}{}overlay=x={}:y={}:eof_action=pass:enable='{}'{}",
                        current,
                        layer_label,
                        entry.layer.origin().x,
                        entry.layer.origin().y,
                        enable_expr(entry),
                        label
                    ));
                    next_input += 1;
                }
                LayerSource::Text(_) => {
                    let text_file = self.text_file_path(timeline, index);
                    graph.push(format!("{}{}{}", current, self.drawtext(entry, &text_file), label));
                }
            }

            current = label;
        }

        graph.push(format!("{}format=yuv420p[vout]", current));

        args.extend([
            "-filter_complex".to_string(),
            graph.join(";"),
            "-map".to_string(),
            "[vout]".to_string(),
            "-c:v".to_string(),
            self.render.codec.clone(),
            "-crf".to_string(),
            self.render.crf.to_string(),
            "-r".to_string(),
            self.frame.fps.to_string(),
            "-threads".to_string(),
            self.render.threads.to_string(),
            "-t".to_string(),
            secs(total),
            output.display().to_string(),
        ]);

        args
    }

    fn drawtext(&self, entry: &TimelineEntry, text_file: &Path) -> String {
        let mut options = vec![
            format!("textfile='{}'", escape_filter_path(text_file)),
            "expansion=none".to_string(),
            format!("fontsize={}", self.text.font_size),
            format!("fontcolor={}", self.text.color),
        ];
        options.extend(self.text_anchor(entry));

        if let Some(font_file) = &self.text.font_file {
            options.push(format!("fontfile='{}'", escape_filter_path(font_file)));
        }

        if let Some(stroke) = &self.text.stroke_color {
            options.push(format!("bordercolor={}", stroke));
            options.push("borderw=3".to_string());
        }

        options.push(format!("alpha='{}'", alpha_expr(entry)));
        options.push(format!("enable='{}'", enable_expr(entry)));

        format!("drawtext={}", options.join(":"))
    }

    /// `drawtext` coordinates for a text entry
    ///
    /// Anchored positions are resolved by ffmpeg against the rendered text
    /// size, so the glyph estimate used for layout never shifts the output.
    /// Custom positions keep their composed origin.
    fn text_anchor(&self, entry: &TimelineEntry) -> [String; 2] {
        let margin = self.text.margin;
        let centred = "x=(w-text_w)/2".to_string();

        match entry.layer.position() {
            Position::Center => [centred, "y=(h-text_h)/2".to_string()],
            Position::Top => [centred, format!("y={}", margin)],
            Position::Bottom => [centred, format!("y=h-text_h-{}", margin)],
            Position::Custom { .. } => {
                let origin = entry.layer.origin();
                [format!("x={}", origin.x), format!("y={}", origin.y)]
            }
        }
    }

    /// Write the text files the `drawtext` filters read
    async fn write_text_files(&self, timeline: &Timeline) -> Result<()> {
        for (index, entry) in timeline.entries().iter().enumerate() {
            if let LayerSource::Text(text) = entry.layer.source() {
                let path = self.text_file_path(timeline, index);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, text).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RenderBackend for FfmpegRenderer {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn render(&self, timeline: &Timeline) -> Result<RenderedVideo> {
        info!("Rendering {} layers ({:.1}s) with ffmpeg", timeline.len(), timeline.duration());

        if !self.check_ffmpeg_available().await {
            return Err(RenderError::FfmpegUnavailable {
                binary: self.render.ffmpeg_binary.clone(),
            }.into());
        }

        tokio::fs::create_dir_all(timeline.output_dir()).await?;
        self.write_text_files(timeline).await?;

        let output = self.output_path(timeline);
        let args = self.build_args(timeline, &output);
        debug!("ffmpeg {}", args.join(" "));

        let result = Command::new(&self.render.ffmpeg_binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            warn!("ffmpeg exited with {}", result.status);
            return Err(RenderError::EncodingFailed {
                reason: format!(
                    "ffmpeg exited with {}: {}",
                    result.status,
                    tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
                ),
            }.into());
        }

        let metadata = tokio::fs::metadata(&output).await.map_err(|_| RenderError::OutputMissing {
            path: output.display().to_string(),
        })?;

        info!("Video saved: {:?} ({:.1} MB)", output, metadata.len() as f64 / 1024.0 / 1024.0);

        Ok(RenderedVideo {
            path: output,
            duration: timeline.duration(),
            file_size: metadata.len(),
        })
    }
}

/// Seconds with millisecond precision
fn secs(value: f64) -> String {
    format!("{:.3}", value)
}

fn enable_expr(entry: &TimelineEntry) -> String {
    format!("between(t,{},{})", secs(entry.start), secs(entry.end()))
}

/// Filter chain for one image input, in transform order
fn image_filters(entry: &TimelineEntry) -> Vec<String> {
    let duration = entry.layer.duration();
    let mut filters = vec!["format=rgba".to_string()];

    for transform in entry.layer.transforms() {
        match *transform {
            Transform::Resize { width, height } => filters.push(format!("scale={}:{}", width, height)),
            Transform::Crop { x, y, width, height } => {
                filters.push(format!("crop={}:{}:{}:{}", width, height, x, y))
            }
            Transform::FadeIn { duration: fade } if fade > 0.0 => {
                filters.push(format!("fade=t=in:st=0:d={}:alpha=1", secs(fade)))
            }
            Transform::FadeOut { duration: fade } if fade > 0.0 => filters.push(format!(
                "fade=t=out:st={}:d={}:alpha=1",
                secs(duration - fade),
                secs(fade)
            )),
            Transform::FadeIn { .. } | Transform::FadeOut { .. } => {}
        }
    }

    filters.push(format!("setpts=PTS-STARTPTS+{}/TB", secs(entry.start)));
    filters
}

/// Opacity ramp for drawtext over the entry's fade windows
fn alpha_expr(entry: &TimelineEntry) -> String {
    let start = entry.start;
    let end = entry.end();
    let fade_in = entry.layer.start_fade_duration();
    let fade_out = entry.layer.end_fade_duration();

    let mut expr = "1".to_string();
    if fade_out > 0.0 {
        expr = format!(
            "if(gt(t,{}),({}-t)/{},{})",
            secs(end - fade_out),
            secs(end),
            secs(fade_out),
            expr
        );
    }
    if fade_in > 0.0 {
        expr = format!(
            "if(lt(t,{}),(t-{})/{},{})",
            secs(start + fade_in),
            secs(start),
            secs(fade_in),
            expr
        );
    }
    expr
}

fn escape_filter_path(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "/")
        .replace('\'', "'\\''")
}
