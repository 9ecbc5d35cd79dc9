//! Subtitle equalization.
//!
//! Long transcription cues are reflowed into short captions that fit on one
//! line of burned-in text. Each long cue is word-wrapped and its time span is
//! divided between the pieces in proportion to their length, so the overall
//! timing never moves.

use std::path::Path;

use tracing::debug;

use reel_models::subtitle::to_srt;
use reel_models::SubtitleCue;

use crate::error::MediaResult;

/// Default maximum characters per caption.
pub const DEFAULT_MAX_CHARS: usize = 10;

/// Split every cue longer than `max_chars` characters.
///
/// The first cue's start and the last cue's end are unchanged, and every
/// split cue's pieces exactly tile the original span.
pub fn equalize(cues: &[SubtitleCue], max_chars: usize) -> Vec<SubtitleCue> {
    let max_chars = max_chars.max(1);
    let mut out = Vec::with_capacity(cues.len());

    for cue in cues {
        let text = cue.text.trim();
        if text.chars().count() <= max_chars {
            out.push(SubtitleCue::new(cue.start, cue.end, text));
            continue;
        }

        let chunks = wrap(text, max_chars);
        let weights: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        let total: usize = weights.iter().sum();
        let span = cue.end - cue.start;

        let mut start = cue.start;
        let mut consumed = 0;
        for (i, chunk) in chunks.into_iter().enumerate() {
            consumed += weights[i];
            let end = if consumed == total {
                cue.end
            } else {
                cue.start + span * consumed as f64 / total as f64
            };
            out.push(SubtitleCue::new(start, end, chunk));
            start = end;
        }
    }

    debug!(input = cues.len(), output = out.len(), max_chars, "Equalized subtitles");
    out
}

/// Greedy word wrap; words longer than `max_chars` are hard-split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut pieces = chars.chunks(max_chars).map(|c| c.iter().collect::<String>());
            let mut last = pieces.next().unwrap_or_default();
            for piece in pieces {
                chunks.push(std::mem::replace(&mut last, piece));
            }
            current = last;
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            chunks.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Write cues to an SRT file.
pub async fn write_srt(path: impl AsRef<Path>, cues: &[SubtitleCue]) -> MediaResult<()> {
    tokio::fs::write(path.as_ref(), to_srt(cues)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<SubtitleCue> {
        vec![
            SubtitleCue::new(0.5, 3.0, "The ocean covers most of the planet"),
            SubtitleCue::new(3.0, 3.8, "Deep"),
            SubtitleCue::new(4.0, 7.25, "Bioluminescence lights the abyss"),
        ]
    }

    #[test]
    fn test_span_preserved_and_lengths_bounded() {
        for max_chars in [1, 4, 10, 16, 80] {
            let cues = sample();
            let out = equalize(&cues, max_chars);

            assert_eq!(out.first().unwrap().start, 0.5);
            assert_eq!(out.last().unwrap().end, 7.25);
            for cue in &out {
                assert!(cue.text.chars().count() <= max_chars, "{:?}", cue);
                assert!(cue.end >= cue.start);
            }
        }
    }

    #[test]
    fn test_split_cue_tiles_original_span() {
        let cue = SubtitleCue::new(2.0, 6.0, "abcd efgh ijkl");
        let out = equalize(&[cue], 4);

        assert_eq!(
            out.iter().map(|c| c.text.as_str()).collect::<Vec<_>>(),
            vec!["abcd", "efgh", "ijkl"]
        );
        assert_eq!(out[0].start, 2.0);
        for pair in out.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(out[2].end, 6.0);
        assert!((out[0].duration() - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_cues_untouched() {
        let cues = vec![SubtitleCue::new(0.0, 1.0, "hi there")];
        assert_eq!(equalize(&cues, 10), cues);
    }

    #[test]
    fn test_padded_short_cue_is_trimmed() {
        let out = equalize(&[SubtitleCue::new(1.0, 2.0, "hi   ")], 2);
        assert_eq!(out, vec![SubtitleCue::new(1.0, 2.0, "hi")]);
    }

    #[test]
    fn test_wrap_hard_splits_long_words() {
        assert_eq!(
            wrap("a supercalifragilistic day", 8),
            vec!["a", "supercal", "ifragili", "stic day"]
        );
    }

    #[tokio::test]
    async fn test_write_srt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subtitles.srt");
        write_srt(&path, &[SubtitleCue::new(0.0, 1.5, "hello")]).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "1\n00:00:00,000 --> 00:00:01,500\nhello\n\n");
    }
}
