//! Speech-to-text for subtitles.
//!
//! AssemblyAI works asynchronously: the audio is uploaded, a transcript job
//! is created and polled until it completes, then exported as SRT.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use reel_models::subtitle::parse_srt;
use reel_models::SubtitleCue;

use crate::error::{check_status, ProviderError, ProviderResult};

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file into timed cues.
    async fn transcribe(&self, audio: &Path) -> ProviderResult<Vec<SubtitleCue>>;
}

#[derive(Debug, Clone)]
pub struct AssemblyAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub poll_interval: Duration,
    /// Polls before giving up
    pub max_polls: u32,
    pub timeout: Duration,
}

impl Default for AssemblyAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.assemblyai.com".to_string(),
            poll_interval: Duration::from_secs(3),
            max_polls: 200,
            timeout: Duration::from_secs(120),
        }
    }
}

impl AssemblyAiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("ASSEMBLYAI_API_KEY").unwrap_or_default(),
            base_url: std::env::var("ASSEMBLYAI_BASE_URL").unwrap_or(defaults.base_url),
            poll_interval: Duration::from_millis(
                std::env::var("ASSEMBLYAI_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3000),
            ),
            max_polls: std::env::var("ASSEMBLYAI_MAX_POLLS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_polls),
            timeout: defaults.timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptStatus {
    id: String,
    status: String,
    #[serde(default)]
    error: Option<String>,
}

pub struct AssemblyAiClient {
    http: Client,
    config: AssemblyAiConfig,
}

impl AssemblyAiClient {
    pub fn new(config: AssemblyAiConfig) -> ProviderResult<Self> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey("ASSEMBLYAI_API_KEY"));
        }

        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(AssemblyAiConfig::from_env())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn upload(&self, audio: &Path) -> ProviderResult<String> {
        let bytes = tokio::fs::read(audio).await?;
        debug!(bytes = bytes.len(), "Uploading narration for transcription");

        let response = self
            .http
            .post(self.url("/v2/upload"))
            .header(reqwest::header::AUTHORIZATION, &self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await?;
        let upload: UploadResponse = check_status(response).await?.json().await?;
        Ok(upload.upload_url)
    }

    async fn create(&self, audio_url: &str) -> ProviderResult<TranscriptStatus> {
        let response = self
            .http
            .post(self.url("/v2/transcript"))
            .header(reqwest::header::AUTHORIZATION, &self.config.api_key)
            .json(&TranscriptRequest { audio_url })
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn status(&self, id: &str) -> ProviderResult<TranscriptStatus> {
        let response = self
            .http
            .get(self.url(&format!("/v2/transcript/{}", id)))
            .header(reqwest::header::AUTHORIZATION, &self.config.api_key)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Poll until the job leaves the queue.
    async fn wait_for_completion(&self, mut job: TranscriptStatus) -> ProviderResult<String> {
        for poll in 0..=self.config.max_polls {
            match job.status.as_str() {
                "completed" => return Ok(job.id),
                "error" => {
                    return Err(ProviderError::Transcription(
                        job.error.unwrap_or_else(|| "unknown error".to_string()),
                    ))
                }
                status => debug!(id = %job.id, status, poll, "Transcript pending"),
            }

            if poll == self.config.max_polls {
                break;
            }
            tokio::time::sleep(self.config.poll_interval).await;
            job = self.status(&job.id).await?;
        }

        let waited = self.config.poll_interval.as_secs() * u64::from(self.config.max_polls);
        Err(ProviderError::Timeout(waited))
    }

    async fn export_srt(&self, id: &str) -> ProviderResult<String> {
        let response = self
            .http
            .get(self.url(&format!("/v2/transcript/{}/srt", id)))
            .header(reqwest::header::AUTHORIZATION, &self.config.api_key)
            .send()
            .await?;
        Ok(check_status(response).await?.text().await?)
    }
}

#[async_trait]
impl Transcriber for AssemblyAiClient {
    async fn transcribe(&self, audio: &Path) -> ProviderResult<Vec<SubtitleCue>> {
        let audio_url = self.upload(audio).await?;
        let job = self.create(&audio_url).await?;
        let id = self.wait_for_completion(job).await?;

        let srt = self.export_srt(&id).await?;
        let cues = parse_srt(&srt).map_err(|e| ProviderError::Transcription(e.to_string()))?;

        info!(id = %id, cues = cues.len(), "Transcription complete");
        Ok(cues)
    }
}
