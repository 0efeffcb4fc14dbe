pub mod config;
pub mod error;
pub mod server;
pub mod summarize;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use error::{Error, ExtractError, SummarizeError, TranscriptError};

/// An 11-character YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structured summary produced by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub topic: String,
    pub summary: String,
    pub key_points: Vec<String>,
}

// Tried in order; the first pattern that matches anywhere wins.
static VIDEO_ID_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        // watch?v=ID or any /ID path segment
        r"(?:v=|/)([0-9A-Za-z_-]{11})",
        r"youtu\.be/([0-9A-Za-z_-]{11})",
        r"embed/([0-9A-Za-z_-]{11})",
        r"shorts/([0-9A-Za-z_-]{11})",
    ]
    .map(|p| Regex::new(p).expect("video id pattern is valid"))
});

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(url: &str) -> Result<VideoId, ExtractError> {
    first_capture(VIDEO_ID_PATTERNS.as_slice(), url.trim())
        .map(VideoId)
        .ok_or(ExtractError::InvalidUrlFormat)
}

/// Capture group 1 of the earliest-declared pattern that matches, wherever it matches
fn first_capture(patterns: &[Regex], input: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(input))
        .map(|caps| caps[1].to_string())
}
