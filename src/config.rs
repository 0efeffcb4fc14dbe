use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr, bail};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::summarize::{self, GenerationOptions};
use crate::youtube;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub youtube: YoutubeConfig,
    pub input_precedence: InputPrecedence,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub model: String,
    pub temperature: f64,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: summarize::DEFAULT_MODEL.to_string(),
            temperature: summarize::DEFAULT_TEMPERATURE,
            base_url: summarize::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl GeminiConfig {
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            ..GenerationOptions::default()
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct YoutubeConfig {
    pub base_url: String,
    pub include_auto_captions: bool,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            base_url: youtube::DEFAULT_BASE_URL.to_string(),
            include_auto_captions: false,
        }
    }
}

/// Which input wins when a request carries both `url` and `transcript`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPrecedence {
    #[default]
    Url,
    Transcript,
    Reject,
}

impl Config {
    /// Load config from ~/.config/ytsum/config.toml if it exists
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Config =
                toml::from_str(&content).wrap_err_with(|| format!("invalid config file {}", path.display()))?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytsum")
        .join("config.toml")
}

/// Read the Gemini API key from the environment
pub fn api_key() -> Result<String> {
    api_key_from(std::env::var(API_KEY_VAR).ok())
}

fn api_key_from(value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => bail!("{API_KEY_VAR} environment variable not set"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
input_precedence = "reject"

[server]
host = "127.0.0.1"
port = 9000

[gemini]
model = "gemini-2.5-flash"
temperature = 0.1

[youtube]
include_auto_captions = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert!((config.gemini.temperature - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.gemini.base_url, summarize::DEFAULT_BASE_URL);
        assert!(config.youtube.include_auto_captions);
        assert_eq!(config.input_precedence, InputPrecedence::Reject);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert!(!config.youtube.include_auto_captions);
        assert_eq!(config.input_precedence, InputPrecedence::Url);
    }

    #[test]
    fn test_parse_invalid_precedence() {
        assert!(toml::from_str::<Config>(r#"input_precedence = "both""#).is_err());
    }

    #[test]
    fn test_generation_options() {
        let config: Config = toml::from_str("[gemini]\nmodel = \"m\"").unwrap();
        let options = config.gemini.generation_options();
        assert_eq!(options.model, "m");
        assert!((options.temperature - 0.3).abs() < f64::EPSILON);
        assert_eq!(options.response_mime_type, "application/json");
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load_from(Path::new("/nonexistent/ytsum/config.toml")).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_api_key_required() {
        assert!(api_key_from(None).is_err());
        assert!(api_key_from(Some("  ".to_string())).is_err());
        assert_eq!(api_key_from(Some("abc".to_string())).unwrap(), "abc");
    }
}
