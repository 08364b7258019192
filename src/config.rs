//! Configuration management for the translator bot
//!
//! Loads settings from environment variables (.env file)

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Size ceilings applied at admission and again inside the executor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    /// Maximum text length in characters
    pub text_chars: usize,
    /// Maximum audio duration in seconds
    pub audio_secs: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            text_chars: 10_000,
            audio_secs: 5.0 * 60.0,
        }
    }
}

/// Where Whisper runs, from `WHISPER_DEVICE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhisperDevice {
    /// GPU when built with the `cuda` feature, otherwise CPU
    #[default]
    Auto,
    Cuda,
    Cpu,
}

impl WhisperDevice {
    pub fn wants_gpu(self) -> bool {
        match self {
            WhisperDevice::Auto => cfg!(feature = "cuda"),
            WhisperDevice::Cuda => true,
            WhisperDevice::Cpu => false,
        }
    }
}

impl FromStr for WhisperDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(WhisperDevice::Auto),
            "cuda" | "gpu" => Ok(WhisperDevice::Cuda),
            "cpu" => Ok(WhisperDevice::Cpu),
            other => Err(format!("unknown device {}", other)),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,
    /// Optional guild ID for development (faster command sync)
    pub guild_id: Option<u64>,
    /// Text and audio ceilings
    pub limits: Limits,
    /// Temporary directory for downloaded and converted audio
    pub temp_audio_dir: PathBuf,
    /// Path to the ggml Whisper model
    pub whisper_model: PathBuf,
    /// Inference threads (None = whisper.cpp default)
    pub whisper_threads: Option<usize>,
    pub whisper_device: WhisperDevice,
    /// How long to wait for queued jobs on shutdown
    pub shutdown_grace: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("DISCORD_TOKEN".to_string()))?;

        let defaults = Limits::default();
        let limits = Limits {
            text_chars: parse_var("TEXT_LIMIT")?.unwrap_or(defaults.text_chars),
            audio_secs: parse_var::<u64>("AUDIO_LIMIT_SEC")?
                .map(|secs| secs as f64)
                .unwrap_or(defaults.audio_secs),
        };

        let temp_audio_dir = env::var("TEMP_AUDIO_DIR")
            .unwrap_or_else(|_| "temp_audio".to_string())
            .into();

        let whisper_model = env::var("WHISPER_MODEL")
            .unwrap_or_else(|_| "models/ggml-small.bin".to_string())
            .into();

        let shutdown_grace = Duration::from_secs(parse_var("SHUTDOWN_GRACE_SECS")?.unwrap_or(30));

        Ok(Self {
            discord_token,
            guild_id: parse_var("GUILD_ID")?,
            limits,
            temp_audio_dir,
            whisper_model,
            whisper_threads: parse_var("WHISPER_THREADS")?,
            whisper_device: parse_var("WHISPER_DEVICE")?.unwrap_or_default(),
            shutdown_grace,
        })
    }
}

/// Read an optional numeric variable; empty counts as unset
fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue(name.to_string(), s))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.text_chars, 10_000);
        assert_eq!(limits.audio_secs, 300.0);
    }

    #[test]
    fn test_whisper_device() {
        assert_eq!("CUDA".parse::<WhisperDevice>(), Ok(WhisperDevice::Cuda));
        assert_eq!("cpu".parse::<WhisperDevice>(), Ok(WhisperDevice::Cpu));
        assert_eq!("auto".parse::<WhisperDevice>(), Ok(WhisperDevice::Auto));
        assert!("tpu".parse::<WhisperDevice>().is_err());

        assert!(WhisperDevice::Cuda.wants_gpu());
        assert!(!WhisperDevice::Cpu.wants_gpu());
        assert_eq!(WhisperDevice::Auto.wants_gpu(), cfg!(feature = "cuda"));

        env::set_var("TRANSLATOR_BOT_TEST_DEVICE", "gpu");
        assert_eq!(
            parse_var::<WhisperDevice>("TRANSLATOR_BOT_TEST_DEVICE").unwrap(),
            Some(WhisperDevice::Cuda)
        );
    }

    #[test]
    fn test_parse_var() {
        env::set_var("TRANSLATOR_BOT_TEST_NUM", "42");
        env::set_var("TRANSLATOR_BOT_TEST_BAD", "forty-two");
        env::set_var("TRANSLATOR_BOT_TEST_EMPTY", "  ");

        assert_eq!(parse_var::<u64>("TRANSLATOR_BOT_TEST_NUM").unwrap(), Some(42));
        assert_eq!(parse_var::<u64>("TRANSLATOR_BOT_TEST_EMPTY").unwrap(), None);
        assert_eq!(parse_var::<u64>("TRANSLATOR_BOT_TEST_UNSET").unwrap(), None);
        assert!(matches!(
            parse_var::<u64>("TRANSLATOR_BOT_TEST_BAD"),
            Err(ConfigError::InvalidValue(name, _)) if name == "TRANSLATOR_BOT_TEST_BAD"
        ));
    }
}
