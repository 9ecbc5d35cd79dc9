//! Topic-to-video orchestration.
//!
//! Stages run in order: script, narration, stock assets, review, render.
//! Transcription starts as soon as the narration is joined and runs in its
//! own task while the operator reviews timelines.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::JoinHandle;
use tracing::Instrument;

use reel_compositor::{review_until_accepted, Compositor, ParagraphInput, ReviewDecider};
use reel_media::{equalize, write_srt, MediaEngine, MediaError};
use reel_models::{
    AssetKind, CompositionConfig, NarrationSegment, Script, SubtitleCue, VideoId, VisualAsset,
};
use reel_providers::{
    AssemblyAiClient, ElevenLabsClient, ElevenLabsConfig, OpenAiScriptClient, PexelsClient,
    ProviderError, ProviderResult, ScriptGenerator, SpeechSynthesizer, StockItem,
    StockMediaSource, StockQuery, Transcriber,
};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::report::{Degradation, RunOutcome, RunReport};
use crate::retry::{retry_async_when, RetryConfig};
use crate::workspace::RunWorkspace;

/// The external services a run talks to.
pub struct Providers {
    pub script: Arc<dyn ScriptGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub stock: Arc<dyn StockMediaSource>,
    pub transcriber: Arc<dyn Transcriber>,
    /// Voices a run may narrate with
    pub voices: Vec<String>,
}

impl Providers {
    /// Build the production clients from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        let speech = ElevenLabsClient::new(ElevenLabsConfig::from_env())?;
        let voices = speech.voices().to_vec();

        Ok(Self {
            script: Arc::new(OpenAiScriptClient::from_env()?),
            speech: Arc::new(speech),
            stock: Arc::new(PexelsClient::from_env()?),
            transcriber: Arc::new(AssemblyAiClient::from_env()?),
            voices,
        })
    }
}

/// Stock search counts for a paragraph: one slot per minimum display time.
pub fn asset_counts(audio_duration: f64, config: &CompositionConfig) -> (usize, usize) {
    let images = (audio_duration / config.image_min).floor().max(0.0) as usize;
    let videos = (audio_duration / config.video_min).floor().max(0.0) as usize;
    (images, videos)
}

pub struct Pipeline {
    config: PipelineConfig,
    providers: Providers,
    media: Arc<dyn MediaEngine>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        providers: Providers,
        media: Arc<dyn MediaEngine>,
    ) -> PipelineResult<Self> {
        config.validate().map_err(PipelineError::config_error)?;
        Ok(Self {
            config,
            providers,
            media,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Turn `topic` into a rendered video.
    ///
    /// `decider` accepts or rejects each composed timeline; the call blocks
    /// on it without a time limit.
    pub async fn run(
        &self,
        topic: &str,
        decider: &mut (dyn ReviewDecider + Send),
    ) -> PipelineResult<RunOutcome> {
        let video_id = VideoId::new();
        let logger = RunLogger::new(&video_id, "run");
        let span = logger.create_span();

        self.run_inner(topic, video_id, logger, decider)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        topic: &str,
        video_id: VideoId,
        logger: RunLogger,
        decider: &mut (dyn ReviewDecider + Send),
    ) -> PipelineResult<RunOutcome> {
        let ws = RunWorkspace::new(&self.config.work_dir, &video_id);
        ws.create().await?;
        logger.log_start(&format!("topic '{}' in {}", topic, ws.root().display()));

        let mut report = RunReport::new(video_id.clone(), topic, self.config.seed);
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // One voice for the whole video
        let voice = self.config.voice.resolve(&self.providers.voices, &mut rng)?;
        report.voice = Some(voice.clone());

        let script = self.write_script(topic, &ws, &logger.stage("script")).await?;
        let narration = self
            .narrate(&script, &voice, &ws, &logger.stage("narration"), &mut report)
            .await?;
        let pools = self
            .gather_assets(&script, &narration, &ws, &logger.stage("assets"), &mut report)
            .await;

        let narration_audio = ws.narration_path();
        let audio_files: Vec<PathBuf> = narration.iter().map(|n| n.audio_ref.clone()).collect();
        self.media
            .concat_audio(&audio_files, &narration_audio)
            .await?;

        let compositor = Compositor::new(self.config.composition.clone())?;
        let inputs: Vec<ParagraphInput<'_>> = narration
            .iter()
            .zip(&pools)
            .map(|(segment, pool)| ParagraphInput::new(segment, pool))
            .collect();

        let subtitles = self.spawn_subtitles(
            narration_audio.clone(),
            ws.subtitles_path(),
            logger.stage("subtitles"),
        );

        let review_logger = logger.stage("review");
        review_logger.log_start(&format!("{} narrated paragraphs", narration.len()));

        let reviewed = match run_blocking(|| {
            review_until_accepted(&compositor, &inputs, &mut rng, &mut *decider)
        }) {
            Ok(reviewed) => reviewed,
            Err(e) => {
                // A failed run must not receive a late subtitles file
                subtitles.abort();
                review_logger.log_error(&e.to_string());
                return Err(e.into());
            }
        };

        report.attempts = reviewed.attempts;
        report.accepted = Some(reviewed.stats.clone());
        report.record_placement(&reviewed.composition.report);
        for paragraph in report.uncovered() {
            review_logger.log_warning(&format!("paragraph {} has no visuals", paragraph));
        }
        review_logger.log_completion(&format!(
            "accepted after {} attempt(s), {} segments",
            reviewed.attempts,
            reviewed.composition.timeline.len()
        ));

        let cues = match subtitles.await {
            Ok(Ok(cues)) => cues,
            Ok(Err(e)) => {
                logger
                    .stage("subtitles")
                    .log_warning(&format!("rendering without captions: {}", e));
                report.degrade(Degradation::SubtitlesUnavailable {
                    error: e.to_string(),
                });
                Vec::new()
            }
            Err(e) => return Err(PipelineError::task_failed(e.to_string())),
        };

        let render_logger = logger.stage("render");
        render_logger.log_start(&format!("{} cues", cues.len()));
        let outcome = self
            .media
            .render(
                &reviewed.composition.timeline,
                &narration_audio,
                &cues,
                ws.root(),
            )
            .await?;
        render_logger.log_completion(&outcome.artifact.display().to_string());

        report.render = Some(outcome.clone());
        report.finish();
        report.write(&ws.report_path()).await?;

        logger.log_completion(&format!(
            "{} degradation(s), artifact {}",
            report.degradations.len(),
            outcome.artifact.display()
        ));

        Ok(RunOutcome {
            video_id,
            artifact: outcome.artifact,
            report,
        })
    }

    async fn write_script(
        &self,
        topic: &str,
        ws: &RunWorkspace,
        logger: &RunLogger,
    ) -> PipelineResult<Script> {
        logger.log_start(&format!("{} paragraphs", self.config.paragraphs));

        let generator = &self.providers.script;
        let paragraphs = self.config.paragraphs;
        let script = retry_async_when(
            &self.config.retry.named("script generation"),
            || generator.generate(topic, paragraphs),
            ProviderError::is_retryable,
        )
        .await
        .into_result()?;

        tokio::fs::write(ws.script_path(), serde_json::to_vec_pretty(&script)?).await?;
        logger.log_completion(&format!("{} paragraphs", script.len()));
        Ok(script)
    }

    /// Synthesize paragraphs in order. A paragraph whose speech fails is skipped.
    async fn narrate(
        &self,
        script: &Script,
        voice: &str,
        ws: &RunWorkspace,
        logger: &RunLogger,
        report: &mut RunReport,
    ) -> PipelineResult<Vec<NarrationSegment>> {
        let retry = self.config.retry.named("text-to-speech");
        let mut narration = Vec::with_capacity(script.len());

        for (index, paragraph) in script.paragraphs.iter().enumerate() {
            let audio_path = ws.paragraph_audio(index);
            match self
                .narrate_paragraph(&retry, &paragraph.text, voice, &audio_path)
                .await
            {
                Ok(duration) => {
                    logger.log_progress(&format!("paragraph {}: {:.2}s", index, duration));
                    narration.push(NarrationSegment::new(
                        index,
                        paragraph.text.clone(),
                        audio_path,
                        duration,
                    ));
                }
                Err(e) => {
                    logger.log_warning(&format!("skipping paragraph {}: {}", index, e));
                    report.degrade(Degradation::NarrationSkipped {
                        paragraph: index,
                        error: e.to_string(),
                    });
                }
            }
        }

        if narration.is_empty() {
            return Err(PipelineError::no_narration(
                "text-to-speech failed for every paragraph",
            ));
        }
        Ok(narration)
    }

    async fn narrate_paragraph(
        &self,
        retry: &RetryConfig,
        text: &str,
        voice: &str,
        audio_path: &Path,
    ) -> PipelineResult<f64> {
        let speech = &self.providers.speech;
        let audio = retry_async_when(
            retry,
            || speech.synthesize(text, voice),
            ProviderError::is_retryable,
        )
        .await
        .into_result()?;

        if let Some(parent) = audio_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(audio_path, &audio).await?;

        let duration = self.media.probe_duration(audio_path).await?;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(MediaError::invalid_media(format!(
                "narration audio has no duration ({})",
                duration
            ))
            .into());
        }
        Ok(duration)
    }

    /// Search and download each narrated paragraph's pool.
    ///
    /// Failed searches and downloads shrink the pool and are recorded.
    async fn gather_assets(
        &self,
        script: &Script,
        narration: &[NarrationSegment],
        ws: &RunWorkspace,
        logger: &RunLogger,
        report: &mut RunReport,
    ) -> Vec<Vec<VisualAsset>> {
        let mut pools = Vec::with_capacity(narration.len());

        for segment in narration {
            let paragraph = segment.index;
            let tags = script
                .paragraphs
                .get(paragraph)
                .map(|p| p.tags.clone())
                .filter(|tags| !tags.is_empty())
                .unwrap_or_else(|| vec![script.topic.clone()]);
            let (images, videos) = asset_counts(segment.audio_duration, &self.config.composition);

            let mut items = Vec::new();
            for (kind, count) in [(AssetKind::Image, images), (AssetKind::Video, videos)] {
                let query = StockQuery::new(tags.clone(), count)
                    .with_orientation(self.config.orientation)
                    .with_size(self.config.size);

                match self.search(kind, &query).await {
                    Ok(found) => items.extend(found),
                    Err(e) => {
                        logger.log_warning(&format!(
                            "{} search failed for paragraph {}: {}",
                            kind, paragraph, e
                        ));
                        report.degrade(Degradation::SearchFailed {
                            paragraph,
                            asset_kind: kind,
                            error: e.to_string(),
                        });
                    }
                }
            }

            let found = items.len();
            let (pool, failures) = self.download_all(paragraph, items, &tags, ws).await;
            for failure in failures {
                logger.log_warning(&format!("download failed for paragraph {}", paragraph));
                report.degrade(failure);
            }

            logger.log_progress(&format!(
                "paragraph {}: {} of {} assets downloaded",
                paragraph,
                pool.len(),
                found
            ));
            pools.push(pool);
        }

        pools
    }

    async fn search(&self, kind: AssetKind, query: &StockQuery) -> ProviderResult<Vec<StockItem>> {
        let stock = &self.providers.stock;
        retry_async_when(
            &self.config.retry.named(format!("{} search", kind)),
            move || async move {
                match kind {
                    AssetKind::Image => stock.search_images(query).await,
                    AssetKind::Video => stock.search_videos(query).await,
                }
            },
            ProviderError::is_retryable,
        )
        .await
        .into_result()
    }

    /// Download items with at most `max_download_parallel` in flight, keeping order.
    async fn download_all(
        &self,
        paragraph: usize,
        items: Vec<StockItem>,
        tags: &[String],
        ws: &RunWorkspace,
    ) -> (Vec<VisualAsset>, Vec<Degradation>) {
        let stock = &self.providers.stock;
        let media = &self.media;
        let retry = self.config.retry.named("download");
        let retry = &retry;

        let mut image_n = 0;
        let mut video_n = 0;
        let jobs: Vec<(StockItem, PathBuf)> = items
            .into_iter()
            .map(|item| {
                let counter = match item.kind {
                    AssetKind::Image => &mut image_n,
                    AssetKind::Video => &mut video_n,
                };
                let dest = ws.asset_path(paragraph, item.kind, *counter);
                *counter += 1;
                (item, dest)
            })
            .collect();

        let results: Vec<Result<VisualAsset, Degradation>> = futures::stream::iter(
            jobs.into_iter().map(|(item, dest)| async move {
                let downloaded = retry_async_when(
                    retry,
                    || stock.download(&item.url, &dest),
                    ProviderError::is_retryable,
                )
                .await
                .into_result();

                if let Err(e) = downloaded {
                    return Err(Degradation::DownloadFailed {
                        paragraph,
                        url: item.url,
                        error: e.to_string(),
                    });
                }

                let duration = match (item.kind, item.duration) {
                    (AssetKind::Image, _) => None,
                    (AssetKind::Video, Some(reported)) => Some(reported),
                    (AssetKind::Video, None) => media.probe_duration(&dest).await.ok(),
                };

                Ok(VisualAsset::new(item.kind, dest, duration)
                    .with_source_url(item.url)
                    .with_tags(tags.to_vec()))
            }),
        )
        .buffered(self.config.max_download_parallel.max(1))
        .collect()
        .await;

        let mut pool = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(asset) => pool.push(asset),
                Err(degradation) => failures.push(degradation),
            }
        }
        (pool, failures)
    }

    /// Transcribe the joined narration, equalize the cues and write the SRT.
    fn spawn_subtitles(
        &self,
        narration_audio: PathBuf,
        srt_path: PathBuf,
        logger: RunLogger,
    ) -> JoinHandle<PipelineResult<Vec<SubtitleCue>>> {
        let transcriber = Arc::clone(&self.providers.transcriber);
        let retry = self.config.retry.named("transcription");
        let max_chars = self.config.subtitle_max_chars;

        tokio::spawn(async move {
            logger.log_start(&narration_audio.display().to_string());

            let cues = retry_async_when(
                &retry,
                || transcriber.transcribe(&narration_audio),
                ProviderError::is_retryable,
            )
            .await
            .into_result()?;

            let cues = equalize(&cues, max_chars);
            write_srt(&srt_path, &cues).await?;

            logger.log_completion(&format!("{} cues", cues.len()));
            Ok::<_, PipelineError>(cues)
        })
    }
}

/// Run a blocking closure without stalling other tasks on a multi-threaded runtime.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_counts() {
        let config = CompositionConfig::default();
        assert_eq!(asset_counts(12.9, &config), (4, 2));
        assert_eq!(asset_counts(4.0, &config), (1, 0));
        assert_eq!(asset_counts(0.0, &config), (0, 0));
    }
}
