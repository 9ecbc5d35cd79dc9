//! Final video render.
//!
//! Three FFmpeg stages:
//! 1. every timeline segment is normalised to the output frame in its own pass
//! 2. the normalised segments are joined with the concat demuxer
//! 3. one pass loops or cuts the joined track to the narration length, burns
//!    subtitles and muxes the narration audio

use std::path::{Path, PathBuf};

use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info};

use reel_models::{AssetKind, EncodingConfig, OutputFormat, SubtitleCue, Timeline, TimelineSegment};

use crate::audio::concat_list;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{normalize_filter, subtitle_filter, SubtitleStyle};
use crate::probe::probe_duration;
use crate::reconcile::Reconciliation;
use crate::subtitles::write_srt;

/// File name of the rendered artifact inside the run directory.
pub const OUTPUT_FILE_NAME: &str = "video.mp4";

/// Default number of concurrent segment passes.
pub const DEFAULT_MAX_FFMPEG_PROCESSES: usize = 2;

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub format: OutputFormat,
    pub encoding: EncodingConfig,
    pub subtitle_style: SubtitleStyle,
    /// Upper bound on concurrent segment passes
    pub max_ffmpeg_processes: usize,
    /// Per-command timeout
    pub ffmpeg_timeout_secs: Option<u64>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            encoding: EncodingConfig::default(),
            subtitle_style: SubtitleStyle::default(),
            max_ffmpeg_processes: DEFAULT_MAX_FFMPEG_PROCESSES,
            ffmpeg_timeout_secs: None,
        }
    }
}

/// Result of a successful render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutcome {
    pub artifact: PathBuf,
    /// Probed length of the joined visual track before reconciliation
    pub visual_duration: f64,
    /// Probed narration length, also the artifact length
    pub audio_duration: f64,
    pub reconciliation: Reconciliation,
}

/// Renders a timeline with the FFmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    settings: RenderSettings,
    runner: FfmpegRunner,
}

impl FfmpegRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        let runner = match settings.ffmpeg_timeout_secs {
            Some(secs) => FfmpegRunner::new().with_timeout(secs),
            None => FfmpegRunner::new(),
        };
        Self { settings, runner }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Render `timeline` over `narration_audio` into `output_dir/video.mp4`.
    pub async fn render(
        &self,
        timeline: &Timeline<'_>,
        narration_audio: &Path,
        cues: &[SubtitleCue],
        output_dir: &Path,
    ) -> MediaResult<RenderOutcome> {
        if timeline.is_empty() {
            return Err(MediaError::empty_input("timeline has no segments"));
        }

        tokio::fs::create_dir_all(output_dir).await?;

        let audio_duration = probe_duration(narration_audio).await?;

        info!(
            segments = timeline.len(),
            timeline_duration = timeline.visual_duration(),
            audio_duration,
            "Rendering video"
        );

        let scratch = tempfile::Builder::new()
            .prefix(".render-")
            .tempdir_in(output_dir)?;

        let segment_paths = self.normalize_segments(timeline, scratch.path()).await?;

        let visual = scratch.path().join("visual.mp4");
        self.concat_segments(&segment_paths, &visual, scratch.path())
            .await?;

        // Frame-aligned cuts can leave the joined track shorter than the assigned total
        let visual_duration = probe_duration(&visual).await?;
        let reconciliation = Reconciliation::plan(visual_duration, audio_duration)?;
        debug!(visual_duration, ?reconciliation, "Visual track measured");

        let srt = if cues.is_empty() {
            None
        } else {
            let path = scratch.path().join("captions.srt");
            write_srt(&path, cues).await?;
            Some(path)
        };

        let artifact = output_dir.join(OUTPUT_FILE_NAME);
        let cmd = self.final_command(
            &visual,
            narration_audio,
            srt.as_deref(),
            reconciliation,
            audio_duration,
            &artifact,
        );
        self.runner
            .run_with_progress(&cmd, move |p| {
                debug!(percent = p.percentage(audio_duration), "Final render progress");
            })
            .await?;

        info!(artifact = %artifact.display(), "Render complete");

        Ok(RenderOutcome {
            artifact,
            visual_duration,
            audio_duration,
            reconciliation,
        })
    }

    /// Normalise all segments, at most `max_ffmpeg_processes` at a time.
    async fn normalize_segments(
        &self,
        timeline: &Timeline<'_>,
        dir: &Path,
    ) -> MediaResult<Vec<PathBuf>> {
        let limit = self.settings.max_ffmpeg_processes.max(1);

        let jobs = timeline.segments.iter().map(|segment| {
            let output = dir.join(format!("segment_{:04}.mp4", segment.order));
            async move {
                let source = &segment.asset.source_ref;
                if !tokio::fs::try_exists(source).await.unwrap_or(false) {
                    return Err(MediaError::FileNotFound(source.clone()));
                }
                let cmd = self.segment_command(segment, &output);
                self.runner.run(&cmd).await?;
                debug!(order = segment.order, "Segment normalised");
                Ok(output)
            }
        }).collect::<Vec<_>>();

        futures::stream::iter(jobs)
            .buffered(limit)
            .try_collect::<Vec<PathBuf>>()
            .await
    }

    fn segment_command(&self, segment: &TimelineSegment<'_>, output: &Path) -> FfmpegCommand {
        let duration = format!("{:.3}", segment.assigned_duration);
        let input_args = match segment.kind() {
            AssetKind::Image => vec!["-loop".to_string(), "1".to_string(), "-t".to_string(), duration],
            AssetKind::Video => vec!["-t".to_string(), duration],
        };

        FfmpegCommand::new(output)
            .input_with_args(input_args, &segment.asset.source_ref)
            .video_filter(normalize_filter(&self.settings.format))
            .duration(segment.assigned_duration)
            .no_audio()
            .video_encoding(&self.settings.encoding)
    }

    async fn concat_segments(
        &self,
        segments: &[PathBuf],
        output: &Path,
        dir: &Path,
    ) -> MediaResult<()> {
        let list_path = dir.join("segments.txt");
        tokio::fs::write(&list_path, concat_list(segments)?).await?;

        // Segments share codec and frame parameters, so copy is safe
        let cmd = FfmpegCommand::new(output)
            .input_with_args(["-f", "concat", "-safe", "0"], &list_path)
            .stream_copy();
        self.runner.run(&cmd).await
    }

    fn final_command(
        &self,
        visual: &Path,
        narration_audio: &Path,
        srt: Option<&Path>,
        reconciliation: Reconciliation,
        audio_duration: f64,
        artifact: &Path,
    ) -> FfmpegCommand {
        let loop_args = match reconciliation.stream_loop() {
            Some(n) => vec!["-stream_loop".to_string(), n.to_string()],
            None => Vec::new(),
        };

        let mut cmd = FfmpegCommand::new(artifact)
            .input_with_args(loop_args, visual)
            .input(narration_audio)
            .map("0:v:0")
            .map("1:a:0");

        if let Some(srt) = srt {
            cmd = cmd.video_filter(subtitle_filter(srt, &self.settings.subtitle_style));
        }

        cmd.video_encoding(&self.settings.encoding)
            .audio_encoding(&self.settings.encoding)
            .duration(audio_duration)
            .output_args(["-movflags", "+faststart"])
    }
}
