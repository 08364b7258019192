//! External collaborators invoked from inside a job
//!
//! Each one is a trait so the executor can run against real backends
//! (Discord, HTTP, ffmpeg, Whisper, Google Translate) or test doubles.

pub mod download;
pub mod media;
pub mod translate;
pub mod whisper;

#[cfg(test)]
pub mod testing;

pub use download::HttpDownloader;
pub use media::FfmpegTools;
pub use translate::GoogleTranslator;
pub use whisper::{WhisperConfig, WhisperTranscriber};

use crate::request::ReplyTarget;
use crate::store::UserSettings;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("download failed: {0}")]
    Download(String),
    #[error("conversion failed: {0}")]
    Conversion(String),
    #[error("transcription failed: {0}")]
    Transcription(String),
    #[error("translation failed: {0}")]
    Translation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
#[error("failed to deliver message: {0}")]
pub struct NotifyError(pub String);

/// A message for the user plus the UI state to render with it
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    /// Settings to render the language bar from
    pub bar: Option<UserSettings>,
}

impl Reply {
    pub fn with_bar(text: impl Into<String>, settings: UserSettings) -> Self {
        Self {
            text: text.into(),
            bar: Some(settings),
        }
    }
}

/// Speech-to-text output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    /// Detected language, `auto` when unknown
    pub language: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, target: ReplyTarget, reply: Reply) -> Result<(), NotifyError>;
}

#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Duration in seconds, 0.0 when it cannot be determined
    async fn probe_duration(&self, path: &Path) -> f64;

    /// Convert to the format the transcriber decodes
    async fn convert_to_canonical(&self, path: &Path) -> Result<PathBuf, ServiceError>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, path: &Path, language: Option<&str>) -> Result<Transcript, ServiceError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, ServiceError>;
}

/// The full set of collaborators a job may call
#[derive(Clone)]
pub struct Services {
    pub notifier: Arc<dyn Notifier>,
    pub downloader: Arc<dyn Downloader>,
    pub media: Arc<dyn MediaTools>,
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
}
