//! Shared data models for the reelgen pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Visual assets and narration segments
//! - Generated scripts
//! - Timelines produced by the compositor
//! - Composition, stock-search and output configuration
//! - Subtitle cues and SRT formatting

pub mod asset;
pub mod composition;
pub mod encoding;
pub mod narration;
pub mod output;
pub mod script;
pub mod stock;
pub mod subtitle;
pub mod timeline;
pub mod video;

// Re-export common types
pub use asset::{AssetId, AssetKind, VisualAsset};
pub use composition::{BudgetPolicy, CompositionConfig, CompositionConfigError};
pub use encoding::EncodingConfig;
pub use narration::NarrationSegment;
pub use output::OutputFormat;
pub use script::{Script, ScriptParagraph};
pub use stock::{AssetSize, Orientation, StockParseError};
pub use subtitle::{SubtitleCue, SubtitleError};
pub use timeline::{Timeline, TimelineSegment};
pub use video::VideoId;
