//! Rendered output frame format.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::stock::Orientation;

/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 30;

/// Fixed frame size and rate every segment is normalised to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OutputFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl OutputFormat {
    /// 1920x1080 landscape.
    pub const LANDSCAPE: OutputFormat = OutputFormat {
        width: 1920,
        height: 1080,
        fps: DEFAULT_FPS,
    };

    /// 1080x1920 portrait (shorts/reels).
    pub const PORTRAIT: OutputFormat = OutputFormat {
        width: 1080,
        height: 1920,
        fps: DEFAULT_FPS,
    };

    /// 1080x1080 square.
    pub const SQUARE: OutputFormat = OutputFormat {
        width: 1080,
        height: 1080,
        fps: DEFAULT_FPS,
    };

    /// Frame format matching a stock-search orientation.
    pub fn for_orientation(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Landscape => Self::LANDSCAPE,
            Orientation::Portrait => Self::PORTRAIT,
            Orientation::Square => Self::SQUARE,
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::LANDSCAPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_orientation() {
        let portrait = OutputFormat::for_orientation(Orientation::Portrait);
        assert_eq!((portrait.width, portrait.height), (1080, 1920));
        assert_eq!(OutputFormat::default(), OutputFormat::LANDSCAPE);
    }
}
