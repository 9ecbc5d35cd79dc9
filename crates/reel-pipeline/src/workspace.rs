//! On-disk layout of one run.
//!
//! ```text
//! <work_dir>/<video_id>/
//!   script.json
//!   p0/audio.mp3
//!   p0/img/0.jpg
//!   p0/video/0.mp4
//!   narration.mp3
//!   subtitles.srt
//!   report.json
//!   video.mp4
//! ```

use std::path::{Path, PathBuf};

use reel_media::OUTPUT_FILE_NAME;
use reel_models::{AssetKind, VideoId};

#[derive(Debug, Clone)]
pub struct RunWorkspace {
    root: PathBuf,
}

impl RunWorkspace {
    pub fn new(work_dir: impl AsRef<Path>, video_id: &VideoId) -> Self {
        Self {
            root: work_dir.as_ref().join(video_id.as_str()),
        }
    }

    /// Create the run directory.
    pub async fn create(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn paragraph_dir(&self, paragraph: usize) -> PathBuf {
        self.root.join(format!("p{}", paragraph))
    }

    pub fn paragraph_audio(&self, paragraph: usize) -> PathBuf {
        self.paragraph_dir(paragraph).join("audio.mp3")
    }

    /// Download target for the `n`-th asset of a kind in a paragraph.
    pub fn asset_path(&self, paragraph: usize, kind: AssetKind, n: usize) -> PathBuf {
        let (dir, ext) = match kind {
            AssetKind::Image => ("img", "jpg"),
            AssetKind::Video => ("video", "mp4"),
        };
        self.paragraph_dir(paragraph)
            .join(dir)
            .join(format!("{}.{}", n, ext))
    }

    pub fn script_path(&self) -> PathBuf {
        self.root.join("script.json")
    }

    pub fn narration_path(&self) -> PathBuf {
        self.root.join("narration.mp3")
    }

    pub fn subtitles_path(&self) -> PathBuf {
        self.root.join("subtitles.srt")
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join("report.json")
    }

    /// Where the renderer writes the final video.
    pub fn artifact_path(&self) -> PathBuf {
        self.root.join(OUTPUT_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let id = VideoId::from_string("k3j5h6g7f8d9s0a");
        let ws = RunWorkspace::new("/runs", &id);

        assert_eq!(ws.root(), Path::new("/runs/k3j5h6g7f8d9s0a"));
        assert_eq!(
            ws.paragraph_audio(1),
            PathBuf::from("/runs/k3j5h6g7f8d9s0a/p1/audio.mp3")
        );
        assert_eq!(
            ws.asset_path(0, AssetKind::Image, 2),
            PathBuf::from("/runs/k3j5h6g7f8d9s0a/p0/img/2.jpg")
        );
        assert_eq!(
            ws.asset_path(2, AssetKind::Video, 0),
            PathBuf::from("/runs/k3j5h6g7f8d9s0a/p2/video/0.mp4")
        );
        assert_eq!(
            ws.artifact_path(),
            PathBuf::from("/runs/k3j5h6g7f8d9s0a/video.mp4")
        );
    }

    #[tokio::test]
    async fn test_create() {
        let dir = tempfile::tempdir().unwrap();
        let ws = RunWorkspace::new(dir.path(), &VideoId::new());
        ws.create().await.unwrap();
        assert!(ws.root().is_dir());
    }
}
