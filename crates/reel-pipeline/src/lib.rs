//! Topic-to-video run orchestration.
//!
//! A run writes its script, narration, downloads, subtitles, report and the
//! final video under `<work_dir>/<video_id>/`. Providers and the media engine
//! are trait objects, so the whole flow can run against fakes.

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod retry;
pub mod review;
pub mod workspace;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::{init_tracing, RunLogger};
pub use pipeline::{asset_counts, Pipeline, Providers};
pub use report::{Degradation, RunOutcome, RunReport};
pub use retry::{retry_async, retry_async_when, RetryConfig, RetryResult};
pub use review::{decider_for, ConsoleDecider};
pub use workspace::RunWorkspace;
