//! Process-wide configuration, read once at startup.
//!
//! Handlers and the inference client receive a shared `Arc<ServerConfig>`;
//! nothing below `main` touches the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MODEL: &str = "deepseek-r1";
pub const DEFAULT_MAX_TOKENS: u32 = 256;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 100_000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} has an invalid value: '{value}'")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// URL of the generate endpoint, e.g. `http://localhost:11434/api/generate`.
    pub inference_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub inference_timeout: Duration,
    /// Ceiling on extracted text sent to the model. `None` disables truncation.
    pub max_prompt_chars: Option<usize>,
    pub max_upload_bytes: usize,
    pub upload_dir: PathBuf,
}

impl ServerConfig {
    /// Config with defaults for everything except the endpoint URL.
    pub fn new(inference_url: impl Into<String>) -> Self {
        Self {
            port: DEFAULT_PORT,
            inference_url: inference_url.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            inference_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_prompt_chars: Some(DEFAULT_MAX_PROMPT_CHARS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_dir: std::env::temp_dir(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. `from_env` is the production caller.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let inference_url = lookup("AI_HOST")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("AI_HOST"))?;

        let mut config = Self::new(inference_url);

        if let Some(port) = parse_var(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(model) = lookup("AI_MODEL").filter(|m| !m.trim().is_empty()) {
            config.model = model;
        }
        if let Some(max_tokens) = parse_var(&lookup, "AI_MAX_TOKENS")? {
            config.max_tokens = max_tokens;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "AI_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    var: "AI_TIMEOUT_SECS",
                    value: secs.to_string(),
                });
            }
            config.inference_timeout = Duration::from_secs(secs);
        }
        if let Some(chars) = parse_var::<usize, _>(&lookup, "MAX_PROMPT_CHARS")? {
            config.max_prompt_chars = (chars > 0).then_some(chars);
        }
        if let Some(bytes) = parse_var(&lookup, "MAX_UPLOAD_BYTES")? {
            config.max_upload_bytes = bytes;
        }
        if let Some(dir) = lookup("UPLOAD_DIR").filter(|d| !d.trim().is_empty()) {
            config.upload_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::Invalid { var, value }),
        },
    }
}
