//! Narration audio concatenation.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Concatenate audio files in order with the concat demuxer.
///
/// Stream copy is tried first; inputs with mismatched parameters fall back
/// to a re-encode.
pub async fn concat_audio(
    runner: &FfmpegRunner,
    inputs: &[PathBuf],
    output: &Path,
) -> MediaResult<()> {
    if inputs.is_empty() {
        return Err(MediaError::empty_input("no narration audio to concatenate"));
    }

    let list_path = output.with_extension("concat.txt");
    tokio::fs::write(&list_path, concat_list(inputs)?).await?;

    let demuxer = ["-f", "concat", "-safe", "0"];
    let copy = FfmpegCommand::new(output)
        .input_with_args(demuxer, &list_path)
        .stream_copy();

    let result = match runner.run(&copy).await {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!(error = %e, "Audio stream copy failed, re-encoding");
            let reencode = FfmpegCommand::new(output)
                .input_with_args(demuxer, &list_path)
                .output_args(["-c:a", "libmp3lame", "-b:a", "192k"]);
            runner.run(&reencode).await
        }
    };

    let _ = tokio::fs::remove_file(&list_path).await;
    result?;

    info!(files = inputs.len(), output = %output.display(), "Narration concatenated");
    Ok(())
}

/// Body of a concat demuxer list file.
///
/// The demuxer resolves relative entries against the list file's directory,
/// so every entry is written as an absolute path.
pub(crate) fn concat_list(inputs: &[PathBuf]) -> MediaResult<String> {
    let mut body = String::new();
    for path in inputs {
        let path = std::path::absolute(path)?;
        // Single quotes close, escape, and reopen the quoted string
        let quoted = path.to_string_lossy().replace('\'', "'\\''");
        body.push_str("file '");
        body.push_str(&quoted);
        body.push_str("'\n");
    }
    Ok(body)
}
