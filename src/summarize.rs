use std::sync::LazyLock;

use async_trait::async_trait;
use log::debug;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::{SummarizeError, Summary};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const JSON_MIME_TYPE: &str = "application/json";
const DELIMITER: &str = "\"\"\"";

const INSTRUCTIONS: &str = r#"Summarize this YouTube transcript in JSON format:
{
   "topic": "brief topic title",
   "summary": "concise summary",
   "key_points": ["list", "of", "key", "points"]
}
Return only a JSON object with exactly these three fields."#;

static QUOTE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""{3,}"#).expect("quote run pattern is valid"));

/// Parameters sent with every generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Model identifier, e.g. `gemini-2.0-flash`
    pub model: String,
    /// Sampling temperature; 0.3 keeps phrasing close to deterministic
    pub temperature: f64,
    /// MIME type the model is asked to answer in
    pub response_mime_type: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            response_mime_type: JSON_MIME_TYPE.to_string(),
        }
    }
}

/// Generates text from a prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, SummarizeError>;
}

/// Summarize a transcript into topic, summary and key points
pub async fn summarize(
    generator: &dyn TextGenerator,
    transcript: &str,
    options: &GenerationOptions,
) -> Result<Summary, SummarizeError> {
    let prompt = build_prompt(transcript);
    debug!(
        "Summarizing {} chars of transcript with model {}",
        transcript.len(),
        options.model
    );

    let text = generator.generate(&prompt, options).await?;
    parse_summary(&text)
}

/// Build the summarization prompt with the transcript inside a `"""` block
pub fn build_prompt(transcript: &str) -> String {
    // A run of three or more quotes would close the block early
    let transcript = QUOTE_RUN.replace_all(transcript, |caps: &Captures| r#"\""#.repeat(caps[0].len()));

    format!("{INSTRUCTIONS}\n\nTranscript:\n{DELIMITER}\n{transcript}\n{DELIMITER}\n")
}

/// Parse model output as a summary, tolerating a surrounding Markdown code fence
pub fn parse_summary(text: &str) -> Result<Summary, SummarizeError> {
    let summary = serde_json::from_str(strip_code_fence(text))?;
    Ok(summary)
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```json").or_else(|| text.strip_prefix("```")) else {
        return text;
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

// Request types for Gemini API

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f64,
    response_mime_type: &'a str,
}

// Response types for Gemini API

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn api_url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }
}

fn build_request<'a>(prompt: &'a str, options: &'a GenerationOptions) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part { text: prompt }],
        }],
        generation_config: GenerationConfig {
            temperature: options.temperature,
            response_mime_type: &options.response_mime_type,
        },
    }
}

fn extract_text(response: &GenerateContentResponse) -> Option<String> {
    let text: String = response
        .candidates
        .as_ref()?
        .first()?
        .content
        .as_ref()?
        .parts
        .as_ref()?
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();

    if text.is_empty() { None } else { Some(text) }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, SummarizeError> {
        debug!("Calling Gemini API with model {}", options.model);

        let resp = self
            .client
            .post(self.api_url(&options.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(prompt, options))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SummarizeError::Api { status, body });
        }

        let json: GenerateContentResponse = resp.json().await?;
        extract_text(&json).ok_or(SummarizeError::EmptyResponse)
    }
}
