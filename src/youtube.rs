use std::collections::BTreeMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::{TranscriptError, VideoId};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

/// Only English subtitles are requested
const LANG: &str = "en";

static API_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#).expect("api key pattern is valid"));

static API_KEY_FALLBACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).expect("api key pattern is valid"));

/// Source of raw transcript text for a video
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    async fn fetch_transcript(&self, video_id: &VideoId) -> Result<String, TranscriptError>;
}

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    /// "asr" for auto-generated captions
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_auto_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Fetches English WebVTT subtitles through YouTube's InnerTube player API
pub struct YoutubeTranscripts {
    client: reqwest::Client,
    base_url: String,
    include_auto_captions: bool,
}

impl YoutubeTranscripts {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            include_auto_captions: false,
        }
    }

    /// Also accept auto-generated caption tracks
    pub fn include_auto_captions(mut self, include: bool) -> Self {
        self.include_auto_captions = include;
        self
    }

    async fn player_response(&self, video_id: &VideoId) -> Result<InnerTubePlayerResponse, TranscriptError> {
        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = format!("{}/watch?v={video_id}", self.base_url);
        debug!("Fetching watch page: {watch_url}");

        let page_html = self
            .client
            .get(&watch_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let player_url = format!("{}/youtubei/v1/player?key={api_key}&prettyPrint=false", self.base_url);

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": LANG,
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video_id.as_str()
        });

        let resp = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp)
    }
}

#[async_trait]
impl TranscriptFetcher for YoutubeTranscripts {
    async fn fetch_transcript(&self, video_id: &VideoId) -> Result<String, TranscriptError> {
        let resp = self.player_response(video_id).await?;

        let tracks = resp
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default();

        let subtitles = subtitles_by_language(tracks, self.include_auto_captions);
        if subtitles.is_empty() {
            return Err(TranscriptError::NoSubtitles);
        }
        debug!("Subtitle languages for {video_id}: {:?}", subtitles.keys().collect::<Vec<_>>());

        let track = subtitles
            .get(LANG)
            .and_then(|variants| variants.first())
            .ok_or(TranscriptError::NoEnglishTrack)?;

        // Step 3: Fetch the subtitle payload as WebVTT
        let vtt_url = vtt_url(&track.base_url)?;
        debug!("Fetching subtitles: {vtt_url}");

        let data = self
            .client
            .get(vtt_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if data.trim().is_empty() {
            return Err(TranscriptError::EmptyPayload);
        }

        Ok(data)
    }
}

fn extract_api_key(html: &str) -> Result<String, TranscriptError> {
    if let Some(caps) = API_KEY_RE.captures(html) {
        return Ok(caps[1].to_string());
    }

    // Fallback: try the newer pattern
    if let Some(caps) = API_KEY_FALLBACK_RE.captures(html) {
        return Ok(caps[1].to_string());
    }

    Err(TranscriptError::PlayerResponse(
        "could not extract InnerTube API key from watch page".to_string(),
    ))
}

/// Group caption tracks by language, keeping the platform's ordering within each language
fn subtitles_by_language(tracks: Vec<CaptionTrack>, include_auto: bool) -> BTreeMap<String, Vec<CaptionTrack>> {
    let mut by_lang: BTreeMap<String, Vec<CaptionTrack>> = BTreeMap::new();
    for track in tracks {
        if track.is_auto_generated() && !include_auto {
            continue;
        }
        by_lang.entry(track.language_code.clone()).or_default().push(track);
    }
    by_lang
}

fn vtt_url(base_url: &str) -> Result<reqwest::Url, TranscriptError> {
    let mut url = reqwest::Url::parse(base_url)
        .map_err(|e| TranscriptError::PlayerResponse(format!("invalid caption url {base_url}: {e}")))?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "fmt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "vtt");

    Ok(url)
}
