//! Summary statistics shown to the operator before a timeline is accepted.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use reel_models::{AssetKind, Timeline};

/// One row of the segment table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRow {
    pub order: usize,
    pub paragraph_index: usize,
    pub kind: AssetKind,
    pub path: String,
    pub duration: f64,
}

/// Image/video split and coverage of a timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineStats {
    pub image_count: usize,
    pub video_count: usize,
    pub image_duration: f64,
    pub video_duration: f64,
    pub total_assigned: f64,
    pub target_duration: f64,
    pub rows: Vec<SegmentRow>,
}

impl TimelineStats {
    pub fn from_timeline(timeline: &Timeline<'_>) -> Self {
        let mut stats = Self {
            image_count: 0,
            video_count: 0,
            image_duration: 0.0,
            video_duration: 0.0,
            total_assigned: 0.0,
            target_duration: timeline.target_duration,
            rows: Vec::with_capacity(timeline.len()),
        };

        for segment in &timeline.segments {
            match segment.kind() {
                AssetKind::Image => {
                    stats.image_count += 1;
                    stats.image_duration += segment.assigned_duration;
                }
                AssetKind::Video => {
                    stats.video_count += 1;
                    stats.video_duration += segment.assigned_duration;
                }
            }
            stats.total_assigned += segment.assigned_duration;
            stats.rows.push(SegmentRow {
                order: segment.order,
                paragraph_index: segment.paragraph_index,
                kind: segment.kind(),
                path: segment.asset.source_ref.display().to_string(),
                duration: segment.assigned_duration,
            });
        }

        stats
    }

    pub fn segment_count(&self) -> usize {
        self.image_count + self.video_count
    }

    /// Share of assigned time spent on images, in percent.
    pub fn image_share(&self) -> f64 {
        percent(self.image_duration, self.total_assigned)
    }

    /// Share of assigned time spent on videos, in percent.
    pub fn video_share(&self) -> f64 {
        percent(self.video_duration, self.total_assigned)
    }

    /// Assigned visual time as a percentage of narration time.
    pub fn coverage(&self) -> f64 {
        percent(self.total_assigned, self.target_duration)
    }

    /// Render the segment table followed by the summary lines.
    pub fn render(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["#", "Paragraph", "Type", "Path", "Duration (s)"]);

        for row in &self.rows {
            table.add_row(vec![
                Cell::new(row.order),
                Cell::new(row.paragraph_index),
                Cell::new(row.kind),
                Cell::new(&row.path),
                Cell::new(format!("{:.2}", row.duration)).set_alignment(CellAlignment::Right),
            ]);
        }

        format!(
            "{}\nImages: {} ({:.1}% of visual time)\nVideos: {} ({:.1}% of visual time)\nVisual {:.2}s / narration {:.2}s ({:.1}%)",
            table,
            self.image_count,
            self.image_share(),
            self.video_count,
            self.video_share(),
            self.total_assigned,
            self.target_duration,
            self.coverage(),
        )
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{TimelineSegment, VisualAsset};

    #[test]
    fn test_stats_split() {
        let img = VisualAsset::image("p0/img/0.jpg");
        let vid = VisualAsset::video("p0/video/0.mp4", 9.0);
        let timeline = Timeline::from_segments(
            vec![
                TimelineSegment {
                    asset: &img,
                    assigned_duration: 3.0,
                    order: 0,
                    paragraph_index: 0,
                },
                TimelineSegment {
                    asset: &vid,
                    assigned_duration: 9.0,
                    order: 1,
                    paragraph_index: 0,
                },
            ],
            24.0,
        );

        let stats = TimelineStats::from_timeline(&timeline);
        assert_eq!(stats.segment_count(), 2);
        assert!((stats.image_share() - 25.0).abs() < 1e-9);
        assert!((stats.video_share() - 75.0).abs() < 1e-9);
        assert!((stats.coverage() - 50.0).abs() < 1e-9);

        let rendered = stats.render();
        assert!(rendered.contains("p0/video/0.mp4"));
        assert!(rendered.contains("Videos: 1 (75.0% of visual time)"));
    }

    #[test]
    fn test_empty_timeline_shares() {
        let stats = TimelineStats::from_timeline(&Timeline::new(0.0));
        assert_eq!(stats.image_share(), 0.0);
        assert_eq!(stats.coverage(), 0.0);
    }
}
