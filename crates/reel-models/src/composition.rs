//! Compositor configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default minimum on-screen time for a stock video (seconds).
pub const DEFAULT_VIDEO_MIN: f64 = 5.0;
/// Default maximum on-screen time for a stock video (seconds).
pub const DEFAULT_VIDEO_MAX: f64 = 10.0;
/// Default minimum on-screen time for a stock image (seconds).
pub const DEFAULT_IMAGE_MIN: f64 = 3.0;
/// Default maximum on-screen time for a stock image (seconds).
pub const DEFAULT_IMAGE_MAX: f64 = 5.0;
/// Default number of assets placed per paragraph.
pub const DEFAULT_MAX_ASSETS_PER_PARAGRAPH: usize = 3;

/// Rejected composition settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompositionConfigError {
    #[error("{field} must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{kind}_min ({min}) exceeds {kind}_max ({max})")]
    InvertedWindow {
        kind: &'static str,
        min: f64,
        max: f64,
    },

    #[error("max_assets_per_paragraph must be at least 1")]
    NoAssetsPerParagraph,

    #[error("Unknown budget policy: {0}")]
    UnknownBudgetPolicy(String),
}

/// Threshold the running budget is compared against while placing assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPolicy {
    /// Stop placing assets for a paragraph once the remaining budget is at or
    /// below that paragraph's narration duration. The threshold therefore
    /// moves from paragraph to paragraph.
    #[default]
    PerParagraph,
    /// Stop placing assets only once the remaining budget reaches zero.
    FixedZero,
}

impl BudgetPolicy {
    /// Threshold for the in-paragraph stop check.
    pub fn placement_threshold(&self, paragraph_duration: f64) -> f64 {
        match self {
            BudgetPolicy::PerParagraph => paragraph_duration,
            BudgetPolicy::FixedZero => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPolicy::PerParagraph => "per_paragraph",
            BudgetPolicy::FixedZero => "fixed_zero",
        }
    }
}

impl std::str::FromStr for BudgetPolicy {
    type Err = CompositionConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per_paragraph" | "per-paragraph" => Ok(BudgetPolicy::PerParagraph),
            "fixed_zero" | "fixed-zero" | "zero" => Ok(BudgetPolicy::FixedZero),
            other => Err(CompositionConfigError::UnknownBudgetPolicy(other.to_string())),
        }
    }
}

/// Duration bounds and limits used when composing a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompositionConfig {
    pub image_min: f64,
    pub image_max: f64,
    pub video_min: f64,
    pub video_max: f64,
    pub max_assets_per_paragraph: usize,
    #[serde(default)]
    pub budget_policy: BudgetPolicy,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            image_min: DEFAULT_IMAGE_MIN,
            image_max: DEFAULT_IMAGE_MAX,
            video_min: DEFAULT_VIDEO_MIN,
            video_max: DEFAULT_VIDEO_MAX,
            max_assets_per_paragraph: DEFAULT_MAX_ASSETS_PER_PARAGRAPH,
            budget_policy: BudgetPolicy::default(),
        }
    }
}

impl CompositionConfig {
    /// Returns a new config with a different budget policy.
    pub fn with_budget_policy(mut self, policy: BudgetPolicy) -> Self {
        self.budget_policy = policy;
        self
    }

    /// Validate the duration windows.
    pub fn validate(&self) -> Result<(), CompositionConfigError> {
        let bounds = [
            ("image_min", self.image_min),
            ("image_max", self.image_max),
            ("video_min", self.video_min),
            ("video_max", self.video_max),
        ];
        for (field, value) in bounds {
            if !value.is_finite() || value <= 0.0 {
                return Err(CompositionConfigError::NotPositive { field, value });
            }
        }

        if self.image_min > self.image_max {
            return Err(CompositionConfigError::InvertedWindow {
                kind: "image",
                min: self.image_min,
                max: self.image_max,
            });
        }

        if self.video_min > self.video_max {
            return Err(CompositionConfigError::InvertedWindow {
                kind: "video",
                min: self.video_min,
                max: self.video_max,
            });
        }

        if self.max_assets_per_paragraph == 0 {
            return Err(CompositionConfigError::NoAssetsPerParagraph);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CompositionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.budget_policy, BudgetPolicy::PerParagraph);
    }

    #[test]
    fn test_inverted_window_rejected() {
        let config = CompositionConfig {
            image_min: 6.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(CompositionConfigError::InvertedWindow {
                kind: "image",
                min: 6.0,
                max: 5.0
            })
        );

        let config = CompositionConfig {
            video_max: 1.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "video_min (5) exceeds video_max (1)");
    }

    #[test]
    fn test_non_positive_bound_rejected() {
        let config = CompositionConfig {
            video_min: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CompositionConfigError::NotPositive { field: "video_min", .. })
        ));
    }

    #[test]
    fn test_zero_assets_rejected() {
        let config = CompositionConfig {
            max_assets_per_paragraph: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(CompositionConfigError::NoAssetsPerParagraph)
        );
    }

    #[test]
    fn test_budget_policy_threshold() {
        assert_eq!(BudgetPolicy::PerParagraph.placement_threshold(4.0), 4.0);
        assert_eq!(BudgetPolicy::FixedZero.placement_threshold(4.0), 0.0);
        assert_eq!("fixed-zero".parse::<BudgetPolicy>().unwrap(), BudgetPolicy::FixedZero);
        assert_eq!(
            "Sometimes".parse::<BudgetPolicy>(),
            Err(CompositionConfigError::UnknownBudgetPolicy("sometimes".to_string()))
        );
    }
}
