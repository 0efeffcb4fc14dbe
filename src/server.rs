use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use log::{error, info, warn};
use serde::Serialize;

use crate::config::InputPrecedence;
use crate::summarize::{self, GenerationOptions, TextGenerator};
use crate::youtube::TranscriptFetcher;
use crate::{Error, Summary, extract_video_id};

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub transcripts: Arc<dyn TranscriptFetcher>,
    pub generator: Arc<dyn TextGenerator>,
    pub options: Arc<GenerationOptions>,
    pub precedence: InputPrecedence,
}

impl AppState {
    pub fn new(transcripts: Arc<dyn TranscriptFetcher>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            transcripts,
            generator,
            options: Arc::new(GenerationOptions::default()),
            precedence: InputPrecedence::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = Arc::new(options);
        self
    }

    pub fn with_precedence(mut self, precedence: InputPrecedence) -> Self {
        self.precedence = precedence;
        self
    }
}

#[derive(Debug, Default)]
pub struct SummarizeParams {
    /// YouTube URL
    pub url: Option<String>,
    /// Direct transcript text
    pub transcript: Option<String>,
}

impl SummarizeParams {
    /// Collect known parameters from decoded query pairs; a repeated key keeps its last value
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "url" => params.url = Some(value),
                "transcript" => params.transcript = Some(value),
                _ => {}
            }
        }
        params
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Url(String),
    Transcript(String),
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/summarize", get(summarize_video))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Summarize a video by URL, or a transcript supplied directly
pub async fn summarize_video(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Summary>, Error> {
    let result = match query {
        Ok(Query(pairs)) => run(&state, SummarizeParams::from_pairs(pairs)).await,
        Err(rejection) => Err(Error::InvalidQuery(rejection.body_text())),
    };

    match &result {
        Ok(summary) => info!("Summarized \"{}\" ({} key points)", summary.topic, summary.key_points.len()),
        Err(Error::TranscriptUnavailable(e)) => {
            warn!("Transcript unavailable (retryable: {}): {e}", e.is_retryable())
        }
        Err(e) if e.status_code().is_server_error() => error!("Summarize request failed: {e}"),
        Err(e) => warn!("Rejected summarize request: {e}"),
    }

    result.map(Json)
}

async fn run(state: &AppState, params: SummarizeParams) -> Result<Summary, Error> {
    let input = select_input(params, state.precedence)?;
    let transcript = resolve_transcript(state, input).await?;
    let summary = summarize::summarize(&*state.generator, &transcript, &state.options).await?;
    Ok(summary)
}

/// Pick the request's input; empty values count as absent
fn select_input(params: SummarizeParams, precedence: InputPrecedence) -> Result<Input, Error> {
    let url = params.url.filter(|s| !s.is_empty());
    let transcript = params.transcript.filter(|s| !s.is_empty());

    match (url, transcript) {
        (None, None) => Err(Error::MissingInput),
        (Some(url), None) => Ok(Input::Url(url)),
        (None, Some(text)) => Ok(Input::Transcript(text)),
        (Some(url), Some(text)) => match precedence {
            InputPrecedence::Url => Ok(Input::Url(url)),
            InputPrecedence::Transcript => Ok(Input::Transcript(text)),
            InputPrecedence::Reject => Err(Error::AmbiguousInput),
        },
    }
}

async fn resolve_transcript(state: &AppState, input: Input) -> Result<String, Error> {
    match input {
        Input::Transcript(text) => {
            info!("Using supplied transcript ({} chars)", text.len());
            Ok(text)
        }
        Input::Url(url) => {
            let video_id = extract_video_id(&url)?;
            info!("Fetching transcript for video {video_id}");
            let text = state.transcripts.fetch_transcript(&video_id).await?;
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(url: Option<&str>, transcript: Option<&str>) -> SummarizeParams {
        SummarizeParams {
            url: url.map(str::to_string),
            transcript: transcript.map(str::to_string),
        }
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_from_pairs() {
        let params = SummarizeParams::from_pairs(pairs(&[("url", "u"), ("other", "x"), ("transcript", "t")]));
        assert_eq!(params.url.as_deref(), Some("u"));
        assert_eq!(params.transcript.as_deref(), Some("t"));
    }

    #[test]
    fn test_from_pairs_repeated_key_keeps_last() {
        let params = SummarizeParams::from_pairs(pairs(&[("transcript", "a"), ("transcript", "b")]));
        assert!(params.url.is_none());
        assert_eq!(params.transcript.as_deref(), Some("b"));
    }

    #[test]
    fn test_select_input_missing() {
        let result = select_input(params(None, None), InputPrecedence::Url);
        assert!(matches!(result, Err(Error::MissingInput)));
    }

    #[test]
    fn test_select_input_empty_values_are_missing() {
        let result = select_input(params(Some(""), Some("")), InputPrecedence::Url);
        assert!(matches!(result, Err(Error::MissingInput)));
    }

    #[test]
    fn test_select_input_single() {
        assert_eq!(
            select_input(params(Some("u"), None), InputPrecedence::Reject).unwrap(),
            Input::Url("u".to_string())
        );
        assert_eq!(
            select_input(params(Some(""), Some("t")), InputPrecedence::Url).unwrap(),
            Input::Transcript("t".to_string())
        );
    }

    #[test]
    fn test_select_input_both() {
        assert_eq!(
            select_input(params(Some("u"), Some("t")), InputPrecedence::Url).unwrap(),
            Input::Url("u".to_string())
        );
        assert_eq!(
            select_input(params(Some("u"), Some("t")), InputPrecedence::Transcript).unwrap(),
            Input::Transcript("t".to_string())
        );
        assert!(matches!(
            select_input(params(Some("u"), Some("t")), InputPrecedence::Reject),
            Err(Error::AmbiguousInput)
        ));
    }
}
