//! Run report and outcome.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use reel_compositor::{ExcludedAsset, PlacementReport, TimelineStats};
use reel_media::RenderOutcome;
use reel_models::{AssetKind, VideoId};

use crate::error::PipelineResult;

/// Something the run worked around instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// TTS or probing failed; the paragraph is not narrated.
    NarrationSkipped { paragraph: usize, error: String },
    SearchFailed {
        paragraph: usize,
        asset_kind: AssetKind,
        error: String,
    },
    DownloadFailed {
        paragraph: usize,
        url: String,
        error: String,
    },
    /// A video the compositor could not place.
    AssetExcluded(ExcludedAsset),
    /// No visual covers this paragraph's narration.
    ParagraphUncovered { paragraph: usize },
    /// Transcription failed; the video is rendered without captions.
    SubtitlesUnavailable { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub video_id: VideoId,
    pub topic: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub seed: Option<u64>,
    pub voice: Option<String>,
    /// Timelines composed before one was accepted
    pub attempts: usize,
    pub accepted: Option<TimelineStats>,
    pub placement: Option<PlacementReport>,
    pub degradations: Vec<Degradation>,
    pub render: Option<RenderOutcome>,
}

impl RunReport {
    pub fn new(video_id: VideoId, topic: impl Into<String>, seed: Option<u64>) -> Self {
        Self {
            video_id,
            topic: topic.into(),
            started_at: Utc::now(),
            finished_at: None,
            seed,
            voice: None,
            attempts: 0,
            accepted: None,
            placement: None,
            degradations: Vec::new(),
            render: None,
        }
    }

    pub fn degrade(&mut self, degradation: Degradation) {
        self.degradations.push(degradation);
    }

    /// Record the compositor's view of the accepted timeline.
    pub fn record_placement(&mut self, placement: &PlacementReport) {
        for excluded in &placement.excluded {
            self.degrade(Degradation::AssetExcluded(excluded.clone()));
        }
        for &paragraph in &placement.uncovered {
            self.degrade(Degradation::ParagraphUncovered { paragraph });
        }
        self.placement = Some(placement.clone());
    }

    /// Paragraphs no visual covers.
    pub fn uncovered(&self) -> Vec<usize> {
        self.degradations
            .iter()
            .filter_map(|d| match d {
                Degradation::ParagraphUncovered { paragraph } => Some(*paragraph),
                _ => None,
            })
            .collect()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub async fn write(&self, path: &Path) -> PipelineResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

/// What a successful run hands back.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub video_id: VideoId,
    pub artifact: PathBuf,
    pub report: RunReport,
}
