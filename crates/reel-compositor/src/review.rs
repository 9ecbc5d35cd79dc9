//! Accept/regenerate control loop.
//!
//! The loop has no attempt limit. It ends when the decider accepts or fails.

use std::collections::VecDeque;

use rand::Rng;
use tracing::info;

use crate::compose::{Composition, Compositor, ParagraphInput};
use crate::error::{CompositorError, CompositorResult};
use crate::stats::TimelineStats;

/// Operator verdict on a composed timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Regenerate,
}

/// Source of accept/regenerate decisions.
pub trait ReviewDecider {
    /// Decide on the timeline summarised by `stats`. `attempt` starts at 1.
    fn decide(&mut self, stats: &TimelineStats, attempt: usize) -> CompositorResult<Decision>;
}

/// Accepts the first timeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoAccept;

impl ReviewDecider for AutoAccept {
    fn decide(&mut self, _stats: &TimelineStats, _attempt: usize) -> CompositorResult<Decision> {
        Ok(Decision::Accept)
    }
}

/// Replays a fixed sequence of decisions.
///
/// Running out of decisions aborts the review.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecider {
    decisions: VecDeque<Decision>,
    seen: Vec<TimelineStats>,
}

impl ScriptedDecider {
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            decisions: decisions.into_iter().collect(),
            seen: Vec::new(),
        }
    }

    /// Stats of every timeline this decider was shown, in order.
    pub fn seen(&self) -> &[TimelineStats] {
        &self.seen
    }
}

impl ReviewDecider for ScriptedDecider {
    fn decide(&mut self, stats: &TimelineStats, _attempt: usize) -> CompositorResult<Decision> {
        self.seen.push(stats.clone());
        self.decisions
            .pop_front()
            .ok_or_else(|| CompositorError::review_aborted("scripted decisions exhausted"))
    }
}

/// The accepted composition and how many timelines were built to get it.
#[derive(Debug, Clone)]
pub struct Reviewed<'a> {
    pub composition: Composition<'a>,
    pub stats: TimelineStats,
    pub attempts: usize,
}

/// Compose, show stats, and regenerate until the decider accepts.
///
/// Every attempt is a fresh `compose` call on the same inputs; only the RNG
/// state differs between attempts.
pub fn review_until_accepted<'a, R, D>(
    compositor: &Compositor,
    paragraphs: &[ParagraphInput<'a>],
    rng: &mut R,
    decider: &mut D,
) -> CompositorResult<Reviewed<'a>>
where
    R: Rng + ?Sized,
    D: ReviewDecider + ?Sized,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        let composition = compositor.compose(paragraphs, rng)?;
        let stats = TimelineStats::from_timeline(&composition.timeline);

        match decider.decide(&stats, attempts)? {
            Decision::Accept => {
                info!(
                    attempts,
                    segments = stats.segment_count(),
                    visual_duration = stats.total_assigned,
                    "Timeline accepted"
                );
                return Ok(Reviewed {
                    composition,
                    stats,
                    attempts,
                });
            }
            Decision::Regenerate => {
                info!(attempt = attempts, "Timeline rejected, regenerating");
            }
        }
    }
}
