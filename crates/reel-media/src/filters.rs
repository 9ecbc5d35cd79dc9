//! FFmpeg video filter definitions.

use std::path::Path;

use reel_models::OutputFormat;

/// Scale to cover the frame, center-crop, and unify rate and pixel format.
pub fn normalize_filter(format: &OutputFormat) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1,fps={fps},format=yuv420p",
        w = format.width,
        h = format.height,
        fps = format.fps
    )
}

/// Burned-in caption style, expressed as ASS `force_style` fields.
///
/// Colours are ASS `&HAABBGGRR` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleStyle {
    pub font_name: String,
    pub font_size: u32,
    pub primary_colour: String,
    pub outline_colour: String,
    pub outline: u32,
    /// Numpad-style alignment, 5 is middle-center
    pub alignment: u8,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_name: "Arial".to_string(),
            font_size: 24,
            // Yellow text, black outline
            primary_colour: "&H0000FFFF".to_string(),
            outline_colour: "&H00000000".to_string(),
            outline: 2,
            alignment: 5,
        }
    }
}

impl SubtitleStyle {
    pub fn to_force_style(&self) -> String {
        format!(
            "FontName={},FontSize={},PrimaryColour={},OutlineColour={},BorderStyle=1,Outline={},Shadow=0,Alignment={}",
            self.font_name,
            self.font_size,
            self.primary_colour,
            self.outline_colour,
            self.outline,
            self.alignment
        )
    }
}

/// `subtitles` filter burning an SRT file with the given style.
pub fn subtitle_filter(srt_path: &Path, style: &SubtitleStyle) -> String {
    format!(
        "subtitles=filename='{}':charenc=UTF-8:force_style='{}'",
        escape_filter_path(srt_path),
        style.to_force_style()
    )
}

/// Escape a path for use as a filter option value.
pub fn escape_filter_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let mut escaped = String::with_capacity(normalized.len() + 8);
    for ch in normalized.chars() {
        match ch {
            ':' | '\'' | ',' | ';' | '[' | ']' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}
