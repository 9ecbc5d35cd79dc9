//! Subtitle cues and SRT formatting.
//!
//! SRT timestamps use the `HH:MM:SS,mmm` form. Parsing accepts `.` as the
//! millisecond separator too, since some transcription services emit it.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One timed caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubtitleCue {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    pub text: String,
}

impl SubtitleCue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Cue length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubtitleError {
    #[error("Invalid SRT timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Malformed SRT block near line {line}: {reason}")]
    MalformedBlock { line: usize, reason: String },

    #[error("Cue ends before it starts at {start} -> {end}")]
    InvertedCue { start: f64, end: f64 },
}

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
pub fn format_srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let mins = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, ms)
}

/// Parse an SRT timestamp (`HH:MM:SS,mmm` or `HH:MM:SS.mmm`) to seconds.
pub fn parse_srt_timestamp(ts: &str) -> Result<f64, SubtitleError> {
    let invalid = || SubtitleError::InvalidTimestamp(ts.to_string());
    let normalized = ts.trim().replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();
    if parts.len() != 3 {
        return Err(invalid());
    }

    let hours: u64 = parts[0].parse().map_err(|_| invalid())?;
    let mins: u64 = parts[1].parse().map_err(|_| invalid())?;
    let secs: f64 = parts[2].parse().map_err(|_| invalid())?;
    if mins >= 60 || !(0.0..60.0).contains(&secs) {
        return Err(invalid());
    }

    Ok(hours as f64 * 3600.0 + mins as f64 * 60.0 + secs)
}

/// Parse SRT content into ordered cues.
///
/// Multi-line cue text is joined with a single space.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleCue>, SubtitleError> {
    let mut cues = Vec::new();
    let lines: Vec<&str> = content.lines().map(|l| l.trim_end_matches('\r')).collect();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].trim().is_empty() {
            i += 1;
            continue;
        }

        // Optional numeric counter
        if lines[i].trim().parse::<u64>().is_ok() {
            i += 1;
        }

        let timing_line = lines.get(i).ok_or_else(|| SubtitleError::MalformedBlock {
            line: i + 1,
            reason: "missing timing line".to_string(),
        })?;
        let (start, end) = timing_line
            .split_once("-->")
            .ok_or_else(|| SubtitleError::MalformedBlock {
                line: i + 1,
                reason: format!("expected '-->' in '{}'", timing_line.trim()),
            })?;
        let start = parse_srt_timestamp(start)?;
        let end = parse_srt_timestamp(end)?;
        if end < start {
            return Err(SubtitleError::InvertedCue { start, end });
        }
        i += 1;

        let mut text = Vec::new();
        while i < lines.len() && !lines[i].trim().is_empty() {
            text.push(lines[i].trim());
            i += 1;
        }

        cues.push(SubtitleCue::new(start, end, text.join(" ")));
    }

    Ok(cues)
}

/// Render cues as SRT content with 1-based counters.
pub fn to_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_timestamp(cue.start),
            format_srt_timestamp(cue.end),
            cue.text
        ));
    }
    out
}
