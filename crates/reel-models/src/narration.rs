//! Narration segment model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Synthesized narration for one paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NarrationSegment {
    /// Paragraph index in narration order
    pub index: usize,
    /// Paragraph text that was spoken
    pub text: String,
    /// Audio file on disk
    pub audio_ref: PathBuf,
    /// Audio length in seconds
    pub audio_duration: f64,
}

impl NarrationSegment {
    pub fn new(
        index: usize,
        text: impl Into<String>,
        audio_ref: impl Into<PathBuf>,
        audio_duration: f64,
    ) -> Self {
        Self {
            index,
            text: text.into(),
            audio_ref: audio_ref.into(),
            audio_duration,
        }
    }
}

/// Total narration length of a set of segments.
pub fn total_duration(segments: &[NarrationSegment]) -> f64 {
    segments.iter().map(|s| s.audio_duration).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_duration() {
        let segments = vec![
            NarrationSegment::new(0, "a", "p0/audio.mp3", 4.0),
            NarrationSegment::new(1, "b", "p1/audio.mp3", 5.5),
            NarrationSegment::new(2, "c", "p2/audio.mp3", 3.0),
        ];
        assert!((total_duration(&segments) - 12.5).abs() < 1e-9);
        assert_eq!(total_duration(&[]), 0.0);
    }
}
