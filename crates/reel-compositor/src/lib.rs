//! Timeline compositor.
//!
//! Turns per-paragraph narration durations and pools of fetched assets into
//! an ordered, timed [`Timeline`](reel_models::Timeline) under a running
//! duration budget, and drives the operator accept/regenerate loop.
//!
//! # Example
//!
//! ```no_run
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use reel_compositor::{AutoAccept, Compositor, ParagraphInput, review_until_accepted};
//! use reel_models::{CompositionConfig, NarrationSegment, VisualAsset};
//!
//! let narration = NarrationSegment::new(0, "Tides.", "p0/audio.mp3", 4.0);
//! let pool = vec![VisualAsset::image("p0/img/0.jpg")];
//! let paragraphs = [ParagraphInput::new(&narration, &pool)];
//!
//! let compositor = Compositor::new(CompositionConfig::default()).unwrap();
//! let mut rng = StdRng::seed_from_u64(7);
//! let reviewed = review_until_accepted(&compositor, &paragraphs, &mut rng, &mut AutoAccept).unwrap();
//! assert_eq!(reviewed.attempts, 1);
//! ```

pub mod compose;
pub mod error;
pub mod review;
pub mod stats;

pub use compose::{
    Composition, Compositor, ExcludedAsset, ExclusionReason, ParagraphInput, ParagraphPlacement,
    PlacementReport,
};
pub use error::{CompositorError, CompositorResult};
pub use review::{
    review_until_accepted, AutoAccept, Decision, ReviewDecider, Reviewed, ScriptedDecider,
};
pub use stats::{SegmentRow, TimelineStats};
