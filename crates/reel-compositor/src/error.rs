//! Compositor error types.

use thiserror::Error;

use reel_models::CompositionConfigError;

pub type CompositorResult<T> = Result<T, CompositorError>;

#[derive(Debug, Error)]
pub enum CompositorError {
    #[error("Invalid composition config: {0}")]
    InvalidConfig(#[from] CompositionConfigError),

    #[error("Paragraph {index} has an invalid narration duration: {duration}")]
    InvalidNarration { index: usize, duration: f64 },

    #[error("Review aborted: {0}")]
    ReviewAborted(String),
}

impl CompositorError {
    pub fn review_aborted(msg: impl Into<String>) -> Self {
        Self::ReviewAborted(msg.into())
    }
}
