//! Media engine seam.
//!
//! The pipeline only talks to [`MediaEngine`], so it can run against a fake
//! in tests and against FFmpeg in production.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use reel_models::{SubtitleCue, Timeline};

use crate::audio::concat_audio;
use crate::command::{check_ffmpeg, check_ffprobe, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::probe_duration;
use crate::render::{FfmpegRenderer, RenderOutcome, RenderSettings};

#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Playable length of an audio or video file, in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;

    /// Join narration files in order into `output`.
    async fn concat_audio(&self, inputs: &[PathBuf], output: &Path) -> MediaResult<()>;

    /// Render the timeline over the narration into `output_dir`.
    async fn render(
        &self,
        timeline: &Timeline<'_>,
        narration_audio: &Path,
        cues: &[SubtitleCue],
        output_dir: &Path,
    ) -> MediaResult<RenderOutcome>;
}

/// [`MediaEngine`] backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    runner: FfmpegRunner,
    renderer: FfmpegRenderer,
}

impl FfmpegEngine {
    pub fn new(settings: RenderSettings) -> Self {
        let renderer = FfmpegRenderer::new(settings);
        let runner = match renderer.settings().ffmpeg_timeout_secs {
            Some(secs) => FfmpegRunner::new().with_timeout(secs),
            None => FfmpegRunner::new(),
        };
        Self { runner, renderer }
    }

    /// Fail early when either binary is missing from PATH.
    pub fn check_available() -> MediaResult<()> {
        check_ffmpeg()?;
        check_ffprobe()?;
        Ok(())
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        probe_duration(path).await
    }

    async fn concat_audio(&self, inputs: &[PathBuf], output: &Path) -> MediaResult<()> {
        concat_audio(&self.runner, inputs, output).await
    }

    async fn render(
        &self,
        timeline: &Timeline<'_>,
        narration_audio: &Path,
        cues: &[SubtitleCue],
        output_dir: &Path,
    ) -> MediaResult<RenderOutcome> {
        self.renderer
            .render(timeline, narration_audio, cues, output_dir)
            .await
    }
}
