//! Run configuration.
//!
//! One explicit value handed to every stage. Nothing reads the environment
//! after [`PipelineConfig::from_env`] returns.

use std::path::PathBuf;
use std::time::Duration;

use reel_media::{RenderSettings, DEFAULT_MAX_CHARS};
use reel_models::composition::{
    DEFAULT_IMAGE_MAX, DEFAULT_IMAGE_MIN, DEFAULT_MAX_ASSETS_PER_PARAGRAPH, DEFAULT_VIDEO_MAX,
    DEFAULT_VIDEO_MIN,
};
use reel_models::{AssetSize, CompositionConfig, Orientation, OutputFormat};
use reel_providers::VoiceSelector;

use crate::retry::RetryConfig;

/// Default number of script paragraphs.
pub const DEFAULT_PARAGRAPHS: usize = 3;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parent of every run directory
    pub work_dir: PathBuf,
    /// Paragraphs requested from the script generator
    pub paragraphs: usize,
    pub composition: CompositionConfig,
    pub orientation: Orientation,
    pub size: AssetSize,
    /// Retry policy for transient provider failures
    pub retry: RetryConfig,
    /// Maximum concurrent stock downloads
    pub max_download_parallel: usize,
    /// Maximum concurrent FFmpeg segment passes
    pub max_ffmpeg_processes: usize,
    pub ffmpeg_timeout_secs: Option<u64>,
    /// Longest subtitle line after equalization
    pub subtitle_max_chars: usize,
    pub voice: VoiceSelector,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("output"),
            paragraphs: DEFAULT_PARAGRAPHS,
            composition: CompositionConfig::default(),
            orientation: Orientation::default(),
            size: AssetSize::default(),
            retry: RetryConfig::default(),
            max_download_parallel: 4,
            max_ffmpeg_processes: 2,
            ffmpeg_timeout_secs: None,
            subtitle_max_chars: DEFAULT_MAX_CHARS,
            voice: VoiceSelector::Random,
            seed: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<f64>().ok());
        let count = |key: &str| lookup(key).and_then(|s| s.trim().parse::<usize>().ok());

        let composition = CompositionConfig {
            image_min: parsed("REEL_IMAGE_MIN").unwrap_or(DEFAULT_IMAGE_MIN),
            image_max: parsed("REEL_IMAGE_MAX").unwrap_or(DEFAULT_IMAGE_MAX),
            video_min: parsed("REEL_VIDEO_MIN").unwrap_or(DEFAULT_VIDEO_MIN),
            video_max: parsed("REEL_VIDEO_MAX").unwrap_or(DEFAULT_VIDEO_MAX),
            max_assets_per_paragraph: count("REEL_MAX_ASSETS_PER_PARAGRAPH")
                .unwrap_or(DEFAULT_MAX_ASSETS_PER_PARAGRAPH),
            budget_policy: lookup("REEL_BUDGET_POLICY")
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        };

        let retry = RetryConfig::new("provider")
            .with_max_retries(
                lookup("REEL_MAX_RETRIES")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(3),
            )
            .with_delay(Duration::from_millis(
                lookup("REEL_RETRY_DELAY_MS")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(1000),
            ));

        Self {
            work_dir: lookup("REEL_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output")),
            paragraphs: count("REEL_PARAGRAPHS").unwrap_or(DEFAULT_PARAGRAPHS),
            composition,
            orientation: lookup("REEL_ORIENTATION")
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            size: lookup("REEL_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            retry,
            max_download_parallel: count("REEL_MAX_DOWNLOAD_PARALLEL").unwrap_or(4),
            max_ffmpeg_processes: count("REEL_MAX_FFMPEG").unwrap_or(2),
            ffmpeg_timeout_secs: lookup("REEL_FFMPEG_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok()),
            subtitle_max_chars: count("REEL_SUBTITLE_MAX_CHARS").unwrap_or(DEFAULT_MAX_CHARS),
            voice: lookup("REEL_VOICE")
                .map(|s| VoiceSelector::parse(&s))
                .unwrap_or(VoiceSelector::Random),
            seed: lookup("REEL_SEED").and_then(|s| s.trim().parse().ok()),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.paragraphs == 0 {
            return Err("paragraphs must be at least 1".to_string());
        }
        if self.max_download_parallel == 0 {
            return Err("max_download_parallel must be at least 1".to_string());
        }
        if self.max_ffmpeg_processes == 0 {
            return Err("max_ffmpeg_processes must be at least 1".to_string());
        }
        if self.subtitle_max_chars == 0 {
            return Err("subtitle_max_chars must be at least 1".to_string());
        }
        self.composition.validate().map_err(|e| e.to_string())
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::for_orientation(self.orientation)
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            format: self.output_format(),
            max_ffmpeg_processes: self.max_ffmpeg_processes,
            ffmpeg_timeout_secs: self.ffmpeg_timeout_secs,
            ..Default::default()
        }
    }
}
