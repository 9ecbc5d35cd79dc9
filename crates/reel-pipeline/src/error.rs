//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Every paragraph failed narration, so there is nothing to render.
    #[error("No narration produced: {0}")]
    NoNarration(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("Provider error: {0}")]
    Provider(#[from] reel_providers::ProviderError),

    #[error("Media error: {0}")]
    Media(#[from] reel_media::MediaError),

    #[error("Compositor error: {0}")]
    Compositor(#[from] reel_compositor::CompositorError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn no_narration(msg: impl Into<String>) -> Self {
        Self::NoNarration(msg.into())
    }

    pub fn task_failed(msg: impl Into<String>) -> Self {
        Self::TaskFailed(msg.into())
    }
}
