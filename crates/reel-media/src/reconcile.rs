//! Matching the visual track length to the narration length.
//!
//! The visual track is never stretched and frames are never dropped. A short
//! track is looped whole and cut at the narration length; a long track is cut.

use serde::Serialize;

use crate::error::{MediaError, MediaResult};

/// Differences below this many seconds are treated as equal.
pub const DURATION_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Reconciliation {
    /// Lengths already match
    PassThrough,
    /// Repeat the track `extra_loops` more times, then cut to the narration
    Loop { extra_loops: u32 },
    /// Cut the track to the narration
    Truncate,
}

impl Reconciliation {
    /// Decide how a `visual`-second track covers `audio` seconds.
    pub fn plan(visual: f64, audio: f64) -> MediaResult<Self> {
        if !visual.is_finite() || visual <= 0.0 {
            return Err(MediaError::empty_input(format!(
                "visual track has no duration ({visual})"
            )));
        }
        if !audio.is_finite() || audio <= 0.0 {
            return Err(MediaError::empty_input(format!(
                "narration has no duration ({audio})"
            )));
        }

        if (visual - audio).abs() < DURATION_TOLERANCE {
            Ok(Self::PassThrough)
        } else if visual < audio {
            let plays = (audio / visual).ceil() as u32;
            Ok(Self::Loop {
                extra_loops: plays.saturating_sub(1).max(1),
            })
        } else {
            Ok(Self::Truncate)
        }
    }

    /// Value for FFmpeg's `-stream_loop` input option, if looping.
    pub fn stream_loop(&self) -> Option<u32> {
        match self {
            Self::Loop { extra_loops } => Some(*extra_loops),
            _ => None,
        }
    }

    /// Length of the track before the final cut.
    pub fn looped_duration(&self, visual: f64) -> f64 {
        match self {
            Self::Loop { extra_loops } => visual * (*extra_loops as f64 + 1.0),
            _ => visual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_track_loops_to_narration() {
        let plan = Reconciliation::plan(8.0, 12.0).unwrap();
        assert_eq!(plan, Reconciliation::Loop { extra_loops: 1 });
        assert_eq!(plan.stream_loop(), Some(1));
        assert!(plan.looped_duration(8.0) >= 12.0);
    }

    #[test]
    fn test_long_track_truncated() {
        let plan = Reconciliation::plan(15.0, 10.0).unwrap();
        assert_eq!(plan, Reconciliation::Truncate);
        assert_eq!(plan.stream_loop(), None);
        assert_eq!(plan.looped_duration(15.0), 15.0);
    }

    #[test]
    fn test_exact_multiple_needs_enough_loops() {
        let plan = Reconciliation::plan(4.0, 12.0).unwrap();
        assert_eq!(plan, Reconciliation::Loop { extra_loops: 2 });
        assert!((plan.looped_duration(4.0) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_measured_track_shorter_than_assigned_still_covers() {
        let audio = 16.0;
        let measured = 7.9;

        // Planning from the assigned 8s would loop once and fall short
        let nominal = Reconciliation::plan(8.0, audio).unwrap();
        assert!(nominal.looped_duration(measured) < audio);

        let plan = Reconciliation::plan(measured, audio).unwrap();
        assert_eq!(plan, Reconciliation::Loop { extra_loops: 2 });
        assert!(plan.looped_duration(measured) >= audio);
    }

    #[test]
    fn test_equal_lengths_pass_through() {
        let plan = Reconciliation::plan(10.0, 10.0004).unwrap();
        assert_eq!(plan, Reconciliation::PassThrough);
    }

    #[test]
    fn test_empty_visual_rejected() {
        assert!(Reconciliation::plan(0.0, 10.0).is_err());
        assert!(Reconciliation::plan(5.0, f64::NAN).is_err());
    }
}
