use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use reel_compositor::{AutoAccept, CompositorError, Decision, ScriptedDecider};
use reel_media::{MediaEngine, MediaResult, Reconciliation, RenderOutcome, OUTPUT_FILE_NAME};
use reel_models::{AssetKind, Script, ScriptParagraph, SubtitleCue, Timeline};
use reel_pipeline::{
    Degradation, Pipeline, PipelineConfig, PipelineError, Providers, RetryConfig,
};
use reel_providers::{
    ProviderError, ProviderResult, ScriptGenerator, SpeechSynthesizer, StockItem,
    StockMediaSource, StockQuery, Transcriber, VoiceSelector,
};

const PARAGRAPH_SECONDS: f64 = 6.0;

#[derive(Default)]
struct FakeScript {
    malformed: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl ScriptGenerator for FakeScript {
    async fn generate(&self, topic: &str, paragraphs: usize) -> ProviderResult<Script> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.malformed {
            return Err(ProviderError::format("expected value at line 1 column 1"));
        }
        let paragraphs = (0..paragraphs)
            .map(|i| ScriptParagraph {
                text: format!("Paragraph {} about {}.", i, topic),
                tags: vec![format!("tag{}", i), "ocean".to_string()],
            })
            .collect();
        Ok(Script::new(topic, paragraphs))
    }
}

#[derive(Default)]
struct FakeSpeech {
    /// Paragraph texts containing this marker fail permanently
    fail_marker: Option<String>,
    calls: AtomicUsize,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str, _voice: &str) -> ProviderResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_marker {
            Some(marker) if text.contains(marker.as_str()) => {
                Err(ProviderError::from_http_status(400, "text rejected"))
            }
            _ => Ok(text.as_bytes().to_vec()),
        }
    }
}

#[derive(Default)]
struct FakeStock {
    videos_down: bool,
    video_searches: AtomicUsize,
}

fn items(query: &StockQuery, kind: AssetKind) -> Vec<StockItem> {
    (0..query.count)
        .map(|i| StockItem {
            url: format!("https://stock.test/{}/{}/{}", kind, query.text(), i),
            kind,
            duration: (kind == AssetKind::Video).then_some(8.0),
            width: Some(1920),
            height: Some(1080),
        })
        .collect()
}

#[async_trait]
impl StockMediaSource for FakeStock {
    async fn search_images(&self, query: &StockQuery) -> ProviderResult<Vec<StockItem>> {
        Ok(items(query, AssetKind::Image))
    }

    async fn search_videos(&self, query: &StockQuery) -> ProviderResult<Vec<StockItem>> {
        self.video_searches.fetch_add(1, Ordering::SeqCst);
        if self.videos_down {
            return Err(ProviderError::from_http_status(503, "unavailable"));
        }
        Ok(items(query, AssetKind::Video))
    }

    async fn download(&self, _url: &str, dest: &Path) -> ProviderResult<u64> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, b"asset").await?;
        Ok(5)
    }
}

#[derive(Default)]
struct FakeTranscriber {
    broken: bool,
    /// Simulated job latency
    delay: Option<Duration>,
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: &Path) -> ProviderResult<Vec<SubtitleCue>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.broken {
            return Err(ProviderError::Transcription("audio too short".to_string()));
        }
        Ok(vec![
            SubtitleCue::new(0.0, 2.0, "The quick brown fox jumps"),
            SubtitleCue::new(2.0, 3.0, "over"),
        ])
    }
}

#[derive(Debug, Clone)]
struct RenderedSegment {
    relative_path: PathBuf,
    paragraph_index: usize,
    duration: f64,
}

#[derive(Debug, Clone)]
struct RenderCall {
    segments: Vec<RenderedSegment>,
    cues: Vec<SubtitleCue>,
}

#[derive(Default)]
struct FakeMedia {
    renders: Mutex<Vec<RenderCall>>,
}

impl FakeMedia {
    fn last_render(&self) -> RenderCall {
        self.renders.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl MediaEngine for FakeMedia {
    async fn probe_duration(&self, _path: &Path) -> MediaResult<f64> {
        Ok(PARAGRAPH_SECONDS)
    }

    async fn concat_audio(&self, inputs: &[PathBuf], output: &Path) -> MediaResult<()> {
        let mut joined = Vec::new();
        for input in inputs {
            joined.extend(tokio::fs::read(input).await?);
        }
        tokio::fs::write(output, joined).await?;
        Ok(())
    }

    async fn render(
        &self,
        timeline: &Timeline<'_>,
        _narration_audio: &Path,
        cues: &[SubtitleCue],
        output_dir: &Path,
    ) -> MediaResult<RenderOutcome> {
        let segments = timeline
            .segments
            .iter()
            .map(|s| RenderedSegment {
                relative_path: s
                    .asset
                    .source_ref
                    .strip_prefix(output_dir)
                    .unwrap_or(&s.asset.source_ref)
                    .to_path_buf(),
                paragraph_index: s.paragraph_index,
                duration: s.assigned_duration,
            })
            .collect();
        self.renders.lock().unwrap().push(RenderCall {
            segments,
            cues: cues.to_vec(),
        });

        let artifact = output_dir.join(OUTPUT_FILE_NAME);
        tokio::fs::write(&artifact, b"mp4").await?;

        let visual_duration = timeline.visual_duration();
        let audio_duration = timeline.target_duration;
        Ok(RenderOutcome {
            artifact,
            visual_duration,
            audio_duration,
            reconciliation: Reconciliation::plan(visual_duration, audio_duration)?,
        })
    }
}

struct Harness {
    dir: tempfile::TempDir,
    script: Arc<FakeScript>,
    speech: Arc<FakeSpeech>,
    stock: Arc<FakeStock>,
    media: Arc<FakeMedia>,
    pipeline: Pipeline,
}

fn harness(
    script: FakeScript,
    speech: FakeSpeech,
    stock: FakeStock,
    transcriber: FakeTranscriber,
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        work_dir: dir.path().to_path_buf(),
        seed: Some(7),
        voice: VoiceSelector::Named("alpha".to_string()),
        retry: RetryConfig::new("provider")
            .with_max_retries(2)
            .with_delay(Duration::ZERO),
        ..Default::default()
    };

    let script = Arc::new(script);
    let speech = Arc::new(speech);
    let stock = Arc::new(stock);
    let media = Arc::new(FakeMedia::default());

    let providers = Providers {
        script: script.clone(),
        speech: speech.clone(),
        stock: stock.clone(),
        transcriber: Arc::new(transcriber),
        voices: vec!["alpha".to_string(), "beta".to_string()],
    };
    let pipeline = Pipeline::new(config, providers, media.clone()).unwrap();

    Harness {
        dir,
        script,
        speech,
        stock,
        media,
        pipeline,
    }
}

fn default_harness() -> Harness {
    harness(
        FakeScript::default(),
        FakeSpeech::default(),
        FakeStock::default(),
        FakeTranscriber::default(),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn run_produces_artifact_and_report() {
    let h = default_harness();
    let outcome = h.pipeline.run("octopus", &mut AutoAccept).await.unwrap();

    let root = h.dir.path().join(outcome.video_id.as_str());
    assert_eq!(outcome.video_id.as_str().len(), 15);
    assert_eq!(outcome.artifact, root.join("video.mp4"));
    assert!(outcome.artifact.exists());
    assert!(root.join("script.json").exists());
    assert!(root.join("narration.mp3").exists());
    assert!(root.join("subtitles.srt").exists());
    assert!(root.join("report.json").exists());
    assert!(root.join("p0/audio.mp3").exists());
    assert!(root.join("p0/img/0.jpg").exists());
    assert!(root.join("p0/video/0.mp4").exists());

    let report = &outcome.report;
    assert_eq!(report.attempts, 1);
    assert_eq!(report.voice.as_deref(), Some("alpha"));
    assert!(report.finished_at.is_some());

    // 6s paragraphs with the default per-paragraph budget: the second
    // paragraph uses up the budget and the third gets no visuals.
    assert_eq!(report.uncovered(), vec![2]);

    let render = h.media.last_render();
    assert_eq!(render.segments.len(), 4);
    assert!(render.segments.iter().all(|s| s.paragraph_index < 2));
    assert!(render.cues.iter().all(|c| c.text.chars().count() <= 10));
    assert!(render.cues.len() > 2);

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(root.join("report.json")).unwrap()).unwrap();
    assert_eq!(json["topic"], "octopus");
    assert_eq!(json["seed"], 7);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_narration_skips_paragraph() {
    let h = harness(
        FakeScript::default(),
        FakeSpeech {
            fail_marker: Some("Paragraph 1".to_string()),
            ..Default::default()
        },
        FakeStock::default(),
        FakeTranscriber::default(),
    );

    let outcome = h.pipeline.run("octopus", &mut AutoAccept).await.unwrap();

    // Non-retryable errors are not retried
    assert_eq!(h.speech.calls.load(Ordering::SeqCst), 3);
    assert!(outcome
        .report
        .degradations
        .iter()
        .any(|d| matches!(d, Degradation::NarrationSkipped { paragraph: 1, .. })));

    let render = h.media.last_render();
    assert!(!render.segments.is_empty());
    assert!(render.segments.iter().all(|s| s.paragraph_index != 1));
}

#[tokio::test(flavor = "multi_thread")]
async fn all_narration_failing_aborts() {
    let h = harness(
        FakeScript::default(),
        FakeSpeech {
            fail_marker: Some("Paragraph".to_string()),
            ..Default::default()
        },
        FakeStock::default(),
        FakeTranscriber::default(),
    );

    let err = h.pipeline.run("octopus", &mut AutoAccept).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoNarration(_)));
    assert!(h.media.renders.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn aborted_review_stops_transcription() {
    let h = harness(
        FakeScript::default(),
        FakeSpeech::default(),
        FakeStock::default(),
        FakeTranscriber {
            delay: Some(Duration::from_millis(200)),
            ..Default::default()
        },
    );
    let mut decider = ScriptedDecider::new([]);

    let err = h.pipeline.run("octopus", &mut decider).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Compositor(CompositorError::ReviewAborted(_))
    ));

    // Past the point the transcription would have finished
    tokio::time::sleep(Duration::from_millis(600)).await;

    let run_dir = std::fs::read_dir(h.dir.path())
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    assert!(run_dir.join("script.json").exists());
    assert!(!run_dir.join("subtitles.srt").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_script_aborts_without_retry() {
    let h = harness(
        FakeScript {
            malformed: true,
            ..Default::default()
        },
        FakeSpeech::default(),
        FakeStock::default(),
        FakeTranscriber::default(),
    );

    let err = h.pipeline.run("octopus", &mut AutoAccept).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Provider(ProviderError::Format(_))
    ));
    assert_eq!(h.script.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.speech.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn regenerate_then_accept() {
    let h = default_harness();
    let mut decider = ScriptedDecider::new([Decision::Regenerate, Decision::Accept]);

    let outcome = h.pipeline.run("octopus", &mut decider).await.unwrap();

    assert_eq!(outcome.report.attempts, 2);
    assert_eq!(decider.seen().len(), 2);
    assert_eq!(h.media.renders.lock().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn closed_review_aborts_run() {
    let h = default_harness();
    let mut decider = ScriptedDecider::new([]);

    let err = h.pipeline.run("octopus", &mut decider).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Compositor(CompositorError::ReviewAborted(_))
    ));
    assert!(h.media.renders.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_video_search_is_retried_then_degraded() {
    let h = harness(
        FakeScript::default(),
        FakeSpeech::default(),
        FakeStock {
            videos_down: true,
            ..Default::default()
        },
        FakeTranscriber::default(),
    );

    let outcome = h.pipeline.run("octopus", &mut AutoAccept).await.unwrap();

    // Three paragraphs, one attempt plus two retries each
    assert_eq!(h.stock.video_searches.load(Ordering::SeqCst), 9);
    let failed_searches = outcome
        .report
        .degradations
        .iter()
        .filter(|d| {
            matches!(
                d,
                Degradation::SearchFailed {
                    asset_kind: AssetKind::Video,
                    ..
                }
            )
        })
        .count();
    assert_eq!(failed_searches, 3);

    let render = h.media.last_render();
    assert!(!render.segments.is_empty());
    assert!(render
        .segments
        .iter()
        .all(|s| s.relative_path.to_string_lossy().contains("/img/")));
}

#[tokio::test(flavor = "multi_thread")]
async fn transcription_failure_renders_without_captions() {
    let h = harness(
        FakeScript::default(),
        FakeSpeech::default(),
        FakeStock::default(),
        FakeTranscriber {
            broken: true,
            ..Default::default()
        },
    );

    let outcome = h.pipeline.run("octopus", &mut AutoAccept).await.unwrap();

    assert!(outcome
        .report
        .degradations
        .iter()
        .any(|d| matches!(d, Degradation::SubtitlesUnavailable { .. })));
    assert!(h.media.last_render().cues.is_empty());
    assert!(outcome.artifact.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn same_seed_same_timeline() {
    let a = default_harness();
    let b = default_harness();

    a.pipeline.run("octopus", &mut AutoAccept).await.unwrap();
    b.pipeline.run("octopus", &mut AutoAccept).await.unwrap();

    let rows = |h: &Harness| -> Vec<(PathBuf, usize, u64)> {
        h.media
            .last_render()
            .segments
            .into_iter()
            .map(|s| (s.relative_path, s.paragraph_index, s.duration.to_bits()))
            .collect()
    };
    assert_eq!(rows(&a), rows(&b));
}
