//! Budgeted allocation of visual assets to narration paragraphs.
//!
//! Paragraphs are processed strictly in narration order against a single
//! `remaining` budget that starts at the total narration duration:
//!
//! 1. `available = min(remaining, audio)`
//! 2. `max_assets = min(eligible pool size, max_assets_per_paragraph)`
//! 3. `per_asset_cap = image_max` for a single asset, otherwise
//!    `min(available / max_assets, image_max)`
//! 4. shuffle the eligible pool and keep the first `max_assets`
//! 5. draw a duration per selected asset and subtract it from `remaining`,
//!    stopping once `remaining` falls to the policy threshold
//! 6. subtract the paragraph's audio duration from `remaining`
//! 7. stop once `remaining <= 0`
//!
//! The RNG is the only source of randomness, so a seeded RNG reproduces a
//! timeline exactly.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use reel_models::{
    AssetId, AssetKind, CompositionConfig, NarrationSegment, Timeline, TimelineSegment,
    VisualAsset,
};

use crate::error::{CompositorError, CompositorResult};

/// Read-only view of one paragraph: its narration and its asset pool.
#[derive(Debug, Clone, Copy)]
pub struct ParagraphInput<'a> {
    pub narration: &'a NarrationSegment,
    pub pool: &'a [VisualAsset],
}

impl<'a> ParagraphInput<'a> {
    pub fn new(narration: &'a NarrationSegment, pool: &'a [VisualAsset]) -> Self {
        Self { narration, pool }
    }
}

/// Why an asset was left out of a paragraph's pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Video without a known playable length
    UnknownDuration,
    /// Video whose reported length is NaN or infinite
    NonFiniteDuration,
    /// Video shorter than the configured video minimum
    BelowVideoMin { duration: f64, video_min: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedAsset {
    pub paragraph_index: usize,
    pub asset_id: AssetId,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

/// Budget arithmetic for one processed paragraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParagraphPlacement {
    pub paragraph_index: usize,
    pub pool_size: usize,
    pub eligible: usize,
    pub max_assets: usize,
    /// `None` when nothing could be placed
    pub per_asset_cap: Option<f64>,
    pub placed: usize,
    pub budget_before: f64,
    pub budget_after: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlacementReport {
    pub paragraphs: Vec<ParagraphPlacement>,
    pub excluded: Vec<ExcludedAsset>,
    /// Paragraphs with no visual coverage, including any never reached
    pub uncovered: Vec<usize>,
}

/// One compositor run: the timeline plus how it was built.
#[derive(Debug, Clone)]
pub struct Composition<'a> {
    pub timeline: Timeline<'a>,
    pub report: PlacementReport,
}

/// Timeline compositor.
///
/// Holds only validated configuration. Each [`compose`](Self::compose) call
/// owns its own budget, so calls are independent of each other.
#[derive(Debug, Clone)]
pub struct Compositor {
    config: CompositionConfig,
}

impl Compositor {
    pub fn new(config: CompositionConfig) -> CompositorResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CompositionConfig {
        &self.config
    }

    /// Build a timeline for the given paragraphs.
    ///
    /// Inputs are borrowed and never mutated. Empty pools and ineligible
    /// videos degrade coverage but are not errors.
    pub fn compose<'a, R>(
        &self,
        paragraphs: &[ParagraphInput<'a>],
        rng: &mut R,
    ) -> CompositorResult<Composition<'a>>
    where
        R: Rng + ?Sized,
    {
        for p in paragraphs {
            let duration = p.narration.audio_duration;
            if !duration.is_finite() || duration < 0.0 {
                return Err(CompositorError::InvalidNarration {
                    index: p.narration.index,
                    duration,
                });
            }
        }

        let target: f64 = paragraphs.iter().map(|p| p.narration.audio_duration).sum();
        let mut remaining = target;
        let mut segments: Vec<TimelineSegment<'a>> = Vec::new();
        let mut report = PlacementReport::default();

        for (position, paragraph) in paragraphs.iter().enumerate() {
            let index = paragraph.narration.index;
            let audio = paragraph.narration.audio_duration;
            let budget_before = remaining;

            let eligible = self.eligible_pool(index, paragraph.pool, &mut report.excluded);
            let eligible_count = eligible.len();
            let available = remaining.min(audio);
            let max_assets = eligible_count.min(self.config.max_assets_per_paragraph);

            let mut placed = 0;
            let mut per_asset_cap = None;

            if max_assets == 0 {
                warn!(
                    paragraph = index,
                    pool_size = paragraph.pool.len(),
                    "No eligible assets, paragraph will have no visuals"
                );
            } else {
                let cap = if max_assets <= 1 {
                    self.config.image_max
                } else {
                    (available / max_assets as f64).min(self.config.image_max)
                };
                per_asset_cap = Some(cap);

                let mut selection = eligible;
                selection.shuffle(rng);
                selection.truncate(max_assets);

                let threshold = self.config.budget_policy.placement_threshold(audio);
                for asset in selection {
                    let assigned = self.draw_duration(asset, cap, rng);
                    if assigned <= 0.0 {
                        // Nothing left to show for a zero-length paragraph
                        continue;
                    }
                    segments.push(TimelineSegment {
                        asset,
                        assigned_duration: assigned,
                        order: segments.len(),
                        paragraph_index: index,
                    });
                    placed += 1;
                    remaining -= assigned;

                    if remaining <= threshold {
                        break;
                    }
                }
            }

            remaining -= audio;

            debug!(
                paragraph = index,
                max_assets,
                placed,
                budget_before,
                budget_after = remaining,
                "Paragraph composed"
            );

            report.paragraphs.push(ParagraphPlacement {
                paragraph_index: index,
                pool_size: paragraph.pool.len(),
                eligible: eligible_count,
                max_assets,
                per_asset_cap,
                placed,
                budget_before,
                budget_after: remaining,
            });

            if placed == 0 {
                report.uncovered.push(index);
            }

            if remaining <= 0.0 {
                let skipped = &paragraphs[position + 1..];
                if !skipped.is_empty() {
                    info!(
                        skipped = skipped.len(),
                        "Budget exhausted, remaining paragraphs get no visuals"
                    );
                }
                report
                    .uncovered
                    .extend(skipped.iter().map(|p| p.narration.index));
                break;
            }
        }

        let timeline = Timeline::from_segments(segments, target);
        info!(
            segments = timeline.len(),
            visual_duration = timeline.visual_duration(),
            target_duration = target,
            "Timeline composed"
        );

        Ok(Composition { timeline, report })
    }

    /// Filter a pool down to assets that can be placed.
    ///
    /// Images are always eligible. Videos need a finite length of at least
    /// `video_min`.
    fn eligible_pool<'a>(
        &self,
        paragraph_index: usize,
        pool: &'a [VisualAsset],
        excluded: &mut Vec<ExcludedAsset>,
    ) -> Vec<&'a VisualAsset> {
        let mut eligible = Vec::with_capacity(pool.len());

        for asset in pool {
            let reason = match (asset.kind, asset.intrinsic_duration) {
                (AssetKind::Image, _) => None,
                (AssetKind::Video, None) => Some(ExclusionReason::UnknownDuration),
                (AssetKind::Video, Some(d)) if !d.is_finite() => {
                    Some(ExclusionReason::NonFiniteDuration)
                }
                (AssetKind::Video, Some(d)) if d < self.config.video_min => {
                    Some(ExclusionReason::BelowVideoMin {
                        duration: d,
                        video_min: self.config.video_min,
                    })
                }
                (AssetKind::Video, Some(_)) => None,
            };

            match reason {
                None => eligible.push(asset),
                Some(reason) => {
                    debug!(
                        paragraph = paragraph_index,
                        asset_id = %asset.id,
                        ?reason,
                        "Excluding video from pool"
                    );
                    excluded.push(ExcludedAsset {
                        paragraph_index,
                        asset_id: asset.id.clone(),
                        reason,
                    });
                }
            }
        }

        eligible
    }

    /// Draw an on-screen duration for one asset.
    ///
    /// When the upper bound falls below the type minimum the draw collapses
    /// to the upper bound, so the per-asset cap always wins.
    fn draw_duration<R>(&self, asset: &VisualAsset, cap: f64, rng: &mut R) -> f64
    where
        R: Rng + ?Sized,
    {
        let (min, max) = match asset.kind {
            AssetKind::Image => (self.config.image_min, cap),
            AssetKind::Video => {
                let intrinsic = asset.intrinsic_duration.unwrap_or(self.config.video_max);
                (
                    self.config.video_min,
                    cap.min(intrinsic).min(self.config.video_max),
                )
            }
        };

        let upper = max.max(0.0);
        let lower = min.min(upper);
        if lower >= upper {
            upper
        } else {
            rng.gen_range(lower..=upper)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn compositor() -> Compositor {
        Compositor::new(CompositionConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CompositionConfig {
            image_min: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            Compositor::new(config),
            Err(CompositorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_single_asset_uses_image_max_cap() {
        let narration = NarrationSegment::new(0, "a", "p0/audio.mp3", 20.0);
        let pool = vec![VisualAsset::image("p0/img/0.jpg")];
        let paragraphs = [ParagraphInput::new(&narration, &pool)];
        let mut rng = StdRng::seed_from_u64(1);

        let composition = compositor().compose(&paragraphs, &mut rng).unwrap();
        let placement = &composition.report.paragraphs[0];
        assert_eq!(placement.per_asset_cap, Some(5.0));
        assert_eq!(placement.placed, 1);

        let d = composition.timeline.segments[0].assigned_duration;
        assert!((3.0..=5.0).contains(&d));
    }

    #[test]
    fn test_cap_below_minimum_collapses_to_cap() {
        // available 4.0 over 2 assets gives a cap of 2.0, below image_min
        let narration = NarrationSegment::new(0, "a", "p0/audio.mp3", 4.0);
        let pool = vec![VisualAsset::image("0.jpg"), VisualAsset::image("1.jpg")];
        let paragraphs = [ParagraphInput::new(&narration, &pool)];
        let mut rng = StdRng::seed_from_u64(3);

        let composition = compositor().compose(&paragraphs, &mut rng).unwrap();
        for segment in &composition.timeline.segments {
            assert!((segment.assigned_duration - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_short_and_unknown_videos_excluded() {
        let narration = NarrationSegment::new(0, "a", "p0/audio.mp3", 30.0);
        let mut unknown = VisualAsset::video("u.mp4", 8.0);
        unknown.intrinsic_duration = None;
        let pool = vec![
            VisualAsset::video("short.mp4", 2.0),
            unknown,
            VisualAsset::video("nan.mp4", f64::NAN),
            VisualAsset::video("ok.mp4", 9.0),
        ];
        let paragraphs = [ParagraphInput::new(&narration, &pool)];
        let mut rng = StdRng::seed_from_u64(5);

        let composition = compositor().compose(&paragraphs, &mut rng).unwrap();
        assert_eq!(composition.report.excluded.len(), 3);
        assert_eq!(composition.timeline.len(), 1);
        assert_eq!(
            composition.timeline.segments[0].asset.source_ref,
            std::path::PathBuf::from("ok.mp4")
        );
        assert!(matches!(
            composition.report.excluded[0].reason,
            ExclusionReason::BelowVideoMin { .. }
        ));
    }

    #[test]
    fn test_invalid_narration_rejected() {
        let narration = NarrationSegment::new(2, "a", "p2/audio.mp3", f64::INFINITY);
        let paragraphs = [ParagraphInput::new(&narration, &[])];
        let mut rng = StdRng::seed_from_u64(0);

        let err = compositor().compose(&paragraphs, &mut rng).unwrap_err();
        assert!(matches!(err, CompositorError::InvalidNarration { index: 2, .. }));
    }

    #[test]
    fn test_no_paragraphs() {
        let mut rng = StdRng::seed_from_u64(0);
        let composition = compositor().compose(&[], &mut rng).unwrap();
        assert!(composition.timeline.is_empty());
        assert_eq!(composition.timeline.target_duration, 0.0);
    }
}
