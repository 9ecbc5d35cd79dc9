//! FFmpeg CLI wrapper for the reelgen renderer.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - Progress parsing from `-progress pipe:2`
//! - Timeouts via tokio
//! - Media probing through ffprobe
//! - Narration concatenation, subtitle equalization and the final render
//! - A [`MediaEngine`] seam so callers can run without FFmpeg installed

pub mod audio;
pub mod command;
pub mod engine;
pub mod error;
pub mod filters;
pub mod probe;
pub mod progress;
pub mod reconcile;
pub mod render;
pub mod subtitles;

pub use audio::concat_audio;
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use engine::{FfmpegEngine, MediaEngine};
pub use error::{MediaError, MediaResult};
pub use filters::SubtitleStyle;
pub use probe::{probe_duration, probe_media, MediaInfo};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use reconcile::Reconciliation;
pub use render::{FfmpegRenderer, RenderOutcome, RenderSettings, OUTPUT_FILE_NAME};
pub use subtitles::{equalize, write_srt, DEFAULT_MAX_CHARS};
