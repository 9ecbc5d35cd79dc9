//! Stock-media search settings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Requested orientation of stock assets (and of the rendered video).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
    Square,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Square => "square",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = StockParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "landscape" => Ok(Orientation::Landscape),
            "portrait" => Ok(Orientation::Portrait),
            "square" => Ok(Orientation::Square),
            _ => Err(StockParseError::Orientation(s.to_string())),
        }
    }
}

/// Requested minimum size of stock assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssetSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl AssetSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetSize::Small => "small",
            AssetSize::Medium => "medium",
            AssetSize::Large => "large",
        }
    }
}

impl fmt::Display for AssetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AssetSize {
    type Err = StockParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" => Ok(AssetSize::Small),
            "medium" => Ok(AssetSize::Medium),
            "large" => Ok(AssetSize::Large),
            _ => Err(StockParseError::Size(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum StockParseError {
    #[error("Unknown orientation: {0}")]
    Orientation(String),
    #[error("Unknown asset size: {0}")]
    Size(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_orientation() {
        assert_eq!("Portrait".parse::<Orientation>().unwrap(), Orientation::Portrait);
        assert!("diagonal".parse::<Orientation>().is_err());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!("large".parse::<AssetSize>().unwrap(), AssetSize::Large);
        assert_eq!(AssetSize::default().to_string(), "medium");
    }
}
