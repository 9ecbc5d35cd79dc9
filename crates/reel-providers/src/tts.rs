//! Text-to-speech.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::{check_status, ProviderError, ProviderResult};

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text` with `voice`, returning MP3 bytes.
    async fn synthesize(&self, text: &str, voice: &str) -> ProviderResult<Vec<u8>>;
}

/// How the narration voice is chosen. Resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSelector {
    /// A specific voice, which must be in the configured list
    Named(String),
    /// Any voice from the configured list
    Random,
}

impl VoiceSelector {
    /// `"random"` (or empty) selects [`VoiceSelector::Random`]; anything else names a voice.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("random") {
            Self::Random
        } else {
            Self::Named(value.to_string())
        }
    }

    pub fn resolve<R>(&self, voices: &[String], rng: &mut R) -> ProviderResult<String>
    where
        R: Rng + ?Sized,
    {
        match self {
            VoiceSelector::Named(name) if voices.iter().any(|v| v == name) => Ok(name.clone()),
            VoiceSelector::Named(name) => Err(ProviderError::InvalidVoice {
                voice: name.clone(),
                available: voices.to_vec(),
            }),
            VoiceSelector::Random => voices.choose(rng).cloned().ok_or_else(|| {
                ProviderError::InvalidVoice {
                    voice: "random".to_string(),
                    available: Vec::new(),
                }
            }),
        }
    }
}

/// Premade ElevenLabs voices (Rachel, Adam, Antoni, Bella).
pub const DEFAULT_VOICES: &[&str] = &[
    "21m00Tcm4TlvDq8ikWAM",
    "pNInz6obpgDQGcFmaJgB",
    "ErXwobaYiN019PkySvjV",
    "EXAVITQu4vr4xnSDxMaL",
];

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub base_url: String,
    pub model_id: String,
    /// Voice IDs the run may pick from
    pub voices: Vec<String>,
    pub timeout: Duration,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.elevenlabs.io".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            voices: DEFAULT_VOICES.iter().map(|v| v.to_string()).collect(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl ElevenLabsConfig {
    /// Create config from environment variables.
    ///
    /// `ELEVENLABS_VOICES` is a comma-separated list of voice IDs.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let voices = std::env::var("ELEVENLABS_VOICES")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.voices);

        Self {
            api_key: std::env::var("ELEVENLABS_API_KEY").unwrap_or_default(),
            base_url: std::env::var("ELEVENLABS_BASE_URL").unwrap_or(defaults.base_url),
            model_id: std::env::var("ELEVENLABS_MODEL").unwrap_or(defaults.model_id),
            voices,
            timeout: Duration::from_secs(
                std::env::var("ELEVENLABS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

pub struct ElevenLabsClient {
    http: Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsClient {
    pub fn new(config: ElevenLabsConfig) -> ProviderResult<Self> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey("ELEVENLABS_API_KEY"));
        }

        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn voices(&self) -> &[String] {
        &self.config.voices
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice: &str) -> ProviderResult<Vec<u8>> {
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(voice)
        );

        debug!(voice, chars = text.len(), "Synthesizing speech");

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&SpeechRequest {
                text,
                model_id: &self.config.model_id,
            })
            .send()
            .await?;

        let bytes = check_status(response).await?.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::invalid_response("speech response was empty"));
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn voices() -> Vec<String> {
        vec!["alpha".to_string(), "beta".to_string()]
    }

    #[test]
    fn test_voice_selector() {
        let mut rng = StdRng::seed_from_u64(4);

        assert_eq!(
            VoiceSelector::parse("beta").resolve(&voices(), &mut rng).unwrap(),
            "beta"
        );
        assert!(matches!(
            VoiceSelector::parse("gamma").resolve(&voices(), &mut rng),
            Err(ProviderError::InvalidVoice { .. })
        ));

        let picked = VoiceSelector::parse("random").resolve(&voices(), &mut rng).unwrap();
        assert!(voices().contains(&picked));
        assert!(VoiceSelector::Random.resolve(&[], &mut rng).is_err());
    }

    #[tokio::test]
    async fn test_synthesize() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/alpha"))
            .and(header("xi-api-key", "secret"))
            .and(body_partial_json(serde_json::json!({"text": "Hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFFu8, 0xFB, 0x90]))
            .expect(1)
            .mount(&server)
            .await;

        let client = ElevenLabsClient::new(ElevenLabsConfig {
            api_key: "secret".to_string(),
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap();

        let audio = client.synthesize("Hello", "alpha").await.unwrap();
        assert_eq!(audio, vec![0xFF, 0xFB, 0x90]);
    }

    #[tokio::test]
    async fn test_rate_limit_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = ElevenLabsClient::new(ElevenLabsConfig {
            api_key: "secret".to_string(),
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap();

        let err = client.synthesize("Hello", "alpha").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
