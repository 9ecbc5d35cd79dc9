//! Narration script models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One narrated paragraph and the image tags chosen for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScriptParagraph {
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A validated script for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    pub topic: String,
    pub paragraphs: Vec<ScriptParagraph>,
}

impl Script {
    pub fn new(topic: impl Into<String>, paragraphs: Vec<ScriptParagraph>) -> Self {
        Self {
            topic: topic.into(),
            paragraphs,
        }
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Full narration text, paragraphs joined by blank lines.
    pub fn full_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
