use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Invalid YouTube URL format")]
    InvalidUrlFormat,
}

/// Why no transcript could be obtained for a video
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("No subtitles available for this video")]
    NoSubtitles,

    #[error("No English transcript available for this video")]
    NoEnglishTrack,

    #[error("English transcript is empty")]
    EmptyPayload,

    #[error("request to YouTube failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected player response: {0}")]
    PlayerResponse(String),
}

impl TranscriptError {
    /// Network failures may succeed on a later attempt; missing captions will not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TranscriptError::Request(_))
    }
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("request to Gemini failed: {0}")]
    Request(reqwest::Error),

    #[error("Gemini API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Gemini returned no text")]
    EmptyResponse,

    #[error("model output is not a valid summary: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl From<reqwest::Error> for SummarizeError {
    fn from(e: reqwest::Error) -> Self {
        // the request URL may carry credentials
        SummarizeError::Request(e.without_url())
    }
}

/// Terminal failure of a `/summarize` request
#[derive(Debug, Error)]
pub enum Error {
    #[error("Either 'url' or 'transcript' parameter is required")]
    MissingInput,

    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    #[error("Provide either 'url' or 'transcript', not both")]
    AmbiguousInput,

    #[error(transparent)]
    InvalidUrlFormat(#[from] ExtractError),

    #[error("Failed to fetch transcript: {0}")]
    TranscriptUnavailable(#[from] TranscriptError),

    #[error("Summarization failed: {0}")]
    SummarizationFailed(#[from] SummarizeError),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingInput
            | Error::InvalidQuery(_)
            | Error::AmbiguousInput
            | Error::InvalidUrlFormat(_)
            | Error::TranscriptUnavailable(_) => StatusCode::BAD_REQUEST,
            Error::SummarizationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            detail: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_bad_request() {
        assert_eq!(Error::MissingInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::AmbiguousInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::InvalidQuery("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::from(ExtractError::InvalidUrlFormat).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::from(TranscriptError::NoEnglishTrack).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_model_errors_are_internal() {
        let err = Error::from(SummarizeError::EmptyResponse);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(SummarizeError::from(json_err));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::MissingInput.to_string(),
            "Either 'url' or 'transcript' parameter is required"
        );
        assert_eq!(
            Error::from(ExtractError::InvalidUrlFormat).to_string(),
            "Invalid YouTube URL format"
        );
        assert_eq!(
            Error::from(TranscriptError::NoEnglishTrack).to_string(),
            "Failed to fetch transcript: No English transcript available for this video"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(!TranscriptError::NoSubtitles.is_retryable());
        assert!(!TranscriptError::EmptyPayload.is_retryable());
    }
}
