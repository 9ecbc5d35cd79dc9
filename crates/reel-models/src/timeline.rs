//! Timelines produced by the compositor.
//!
//! Segments borrow the assets they place. A timeline is never edited after
//! composition; regeneration builds a new one.

use serde::Serialize;

use crate::asset::{AssetKind, VisualAsset};

/// One asset placed on the timeline for a fixed duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSegment<'a> {
    pub asset: &'a VisualAsset,
    /// On-screen time in seconds
    pub assigned_duration: f64,
    /// Position in the timeline, starting at 0
    pub order: usize,
    /// Paragraph the segment illustrates
    pub paragraph_index: usize,
}

impl TimelineSegment<'_> {
    pub fn kind(&self) -> AssetKind {
        self.asset.kind
    }
}

/// Ordered visual segments plus the narration length they should cover.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline<'a> {
    pub segments: Vec<TimelineSegment<'a>>,
    /// Total narration duration in seconds
    pub target_duration: f64,
}

impl<'a> Timeline<'a> {
    /// Empty timeline for a narration of the given length.
    pub fn new(target_duration: f64) -> Self {
        Self {
            segments: Vec::new(),
            target_duration,
        }
    }

    /// Build a timeline from already-ordered segments.
    pub fn from_segments(segments: Vec<TimelineSegment<'a>>, target_duration: f64) -> Self {
        Self {
            segments,
            target_duration,
        }
    }

    /// Sum of assigned durations.
    pub fn visual_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.assigned_duration).sum()
    }

    pub fn segments_for_paragraph(
        &self,
        paragraph_index: usize,
    ) -> impl Iterator<Item = &TimelineSegment<'a>> {
        self.segments
            .iter()
            .filter(move |s| s.paragraph_index == paragraph_index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visual_duration_and_filter() {
        let img = VisualAsset::image("a.jpg");
        let vid = VisualAsset::video("b.mp4", 8.0);
        let segments = vec![
            TimelineSegment {
                asset: &img,
                assigned_duration: 3.5,
                order: 0,
                paragraph_index: 0,
            },
            TimelineSegment {
                asset: &vid,
                assigned_duration: 6.0,
                order: 1,
                paragraph_index: 1,
            },
        ];
        let timeline = Timeline::from_segments(segments, 12.0);

        assert_eq!(timeline.len(), 2);
        assert!((timeline.visual_duration() - 9.5).abs() < 1e-9);
        assert_eq!(timeline.segments_for_paragraph(1).count(), 1);
        assert_eq!(timeline.segments[1].kind(), AssetKind::Video);
        assert!(Timeline::new(5.0).is_empty());
    }
}
