//! Visual asset models.
//!
//! Assets are fetched per paragraph by the stock-media stage and are
//! read-only from then on. The compositor borrows them; it never owns them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for a visual asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    /// Generate a new random asset ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of visual asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Still image, no intrinsic duration
    Image,
    /// Video clip with a playable length
    Video,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Video => "video",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fetched image or video clip available to one paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VisualAsset {
    pub id: AssetId,
    pub kind: AssetKind,
    /// Local file the asset was downloaded to
    pub source_ref: PathBuf,
    /// URL the asset was downloaded from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Playable length in seconds (videos only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intrinsic_duration: Option<f64>,
    /// Search tags the asset was found with
    #[serde(default)]
    pub tags: Vec<String>,
}

impl VisualAsset {
    /// Create an asset with a fresh ID.
    ///
    /// A video whose length is unknown keeps `intrinsic_duration: None`; the
    /// compositor will not place it.
    pub fn new(
        kind: AssetKind,
        source_ref: impl Into<PathBuf>,
        intrinsic_duration: Option<f64>,
    ) -> Self {
        Self {
            id: AssetId::new(),
            kind,
            source_ref: source_ref.into(),
            source_url: None,
            intrinsic_duration,
            tags: Vec::new(),
        }
    }

    /// Create an image asset.
    pub fn image(source_ref: impl Into<PathBuf>) -> Self {
        Self::new(AssetKind::Image, source_ref, None)
    }

    /// Create a video asset with its playable length.
    pub fn video(source_ref: impl Into<PathBuf>, intrinsic_duration: f64) -> Self {
        Self::new(AssetKind::Video, source_ref, Some(intrinsic_duration))
    }

    /// Attach the source URL.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Attach search tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn is_image(&self) -> bool {
        self.kind == AssetKind::Image
    }

    pub fn is_video(&self) -> bool {
        self.kind == AssetKind::Video
    }
}
