//! Narration script generation.
//!
//! The generator is asked for one JSON object with `p0..p{n-1}` paragraph
//! keys and matching `p{i}_img_tags` tag lists. Nothing enforces that shape
//! on the provider side, so the reply is validated here: one sanitizing pass
//! and one re-parse are allowed before giving up with
//! [`ProviderError::Format`].

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use reel_models::{Script, ScriptParagraph};

use crate::error::{check_status, ProviderError, ProviderResult};

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap());
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```[A-Za-z]*").unwrap());

#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Write a script of exactly `paragraphs` paragraphs about `topic`.
    async fn generate(&self, topic: &str, paragraphs: usize) -> ProviderResult<Script>;
}

/// Configuration for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Base URL without the `/v1/...` path
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.5,
            max_tokens: 1000,
            timeout: Duration::from_secs(60),
        }
    }
}

impl OpenAiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.model),
            temperature: std::env::var("OPENAI_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.temperature),
            max_tokens: std::env::var("OPENAI_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_tokens),
            timeout: Duration::from_secs(
                std::env::var("OPENAI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Script generator backed by `/v1/chat/completions`.
pub struct OpenAiScriptClient {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiScriptClient {
    pub fn new(config: OpenAiConfig) -> ProviderResult<Self> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey("OPENAI_API_KEY"));
        }

        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(OpenAiConfig::from_env())
    }

    async fn complete(&self, prompt: String) -> ProviderResult<String> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(model = %self.config.model, "Requesting script completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;
        let response: ChatResponse = check_status(response).await?.json().await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::invalid_response("completion has no choices"))
    }
}

#[async_trait]
impl ScriptGenerator for OpenAiScriptClient {
    async fn generate(&self, topic: &str, paragraphs: usize) -> ProviderResult<Script> {
        let raw = self.complete(build_prompt(topic, paragraphs)).await?;
        let script = parse_script(topic, &raw, paragraphs)?;
        info!(topic, paragraphs = script.len(), "Script generated");
        Ok(script)
    }
}

/// Prompt asking for a fixed-shape JSON script.
pub fn build_prompt(topic: &str, paragraphs: usize) -> String {
    let mut shape = String::from("{\n  \"topic\": \"...\"");
    for i in 0..paragraphs {
        shape.push_str(&format!(
            ",\n  \"p{i}\": \"paragraph text\",\n  \"p{i}_img_tags\": [\"tag\", \"tag\"]"
        ));
    }
    shape.push_str("\n}");

    format!(
        "Write the narration for a short video about the topic below as {paragraphs} \
         paragraphs. The first paragraph introduces the topic and the last one wraps it up.\n\
         For every paragraph also give at least 10 short stock-photo search tags describing \
         what could be on screen while it is read, for example \"black coat\", \"dressing room\", \"man\".\n\
         Use plain sentences without markdown, links or special characters.\n\
         Reply with exactly this JSON object and nothing else:\n{shape}\n\nTopic: {topic}"
    )
}

/// Validate generator output, sanitizing and re-parsing once on failure.
pub fn parse_script(topic: &str, raw: &str, paragraphs: usize) -> ProviderResult<Script> {
    let first = serde_json::from_str::<Value>(raw.trim())
        .map_err(|e| ProviderError::format(e.to_string()))
        .and_then(|value| script_from_value(topic, &value, paragraphs));

    match first {
        Ok(script) => Ok(script),
        Err(e) => {
            warn!(error = %e, "Script output did not validate, sanitizing");
            let cleaned = sanitize(raw);
            let value: Value = serde_json::from_str(&cleaned)
                .map_err(|e| ProviderError::format(format!("{} (after sanitizing)", e)))?;
            script_from_value(topic, &value, paragraphs)
        }
    }
}

/// Strip terminal escapes, code fences, invalid escapes and control characters,
/// and keep only the outermost `{...}`.
fn sanitize(raw: &str) -> String {
    let text = ANSI_ESCAPE.replace_all(raw, "");
    let text = CODE_FENCE.replace_all(&text, "");
    let text = text.replace("\\'", "'");

    let text = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text.as_str(),
    };

    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn script_from_value(topic: &str, value: &Value, paragraphs: usize) -> ProviderResult<Script> {
    let object = value
        .as_object()
        .ok_or_else(|| ProviderError::format("expected a JSON object"))?;

    let mut parsed = Vec::with_capacity(paragraphs);
    for i in 0..paragraphs {
        let key = format!("p{i}");
        let text = lookup(object, &key)
            .and_then(Value::as_str)
            .map(clean_paragraph)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::format(format!("missing paragraph '{}'", key)))?;

        let tags = lookup(object, &format!("p{i}_img_tags"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        parsed.push(ScriptParagraph { text, tags });
    }

    Ok(Script::new(topic, parsed))
}

/// Key lookup that tolerates `P0` for `p0`.
fn lookup<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).or_else(|| {
        object
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// Drop markdown emphasis and heading marks, collapse whitespace.
fn clean_paragraph(text: &str) -> String {
    text.replace(['*', '#'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
