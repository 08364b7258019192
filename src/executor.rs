//! Per-job pipeline
//!
//! Every collaborator failure is turned into a short message for the user
//! here. Only a failure to deliver the final message escapes to the worker.

use crate::admission::{Coordinator, LimitKind};
use crate::config::Limits;
use crate::languages::{self, AUTO};
use crate::messages;
use crate::queue::{Job, JobId};
use crate::request::{AudioAttachment, ReplyTarget, Request, RequestKind};
use crate::services::{Notifier, NotifyError, Reply, ServiceError, Services};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Handled failures of a single job
#[derive(Error, Debug)]
pub enum JobError {
    #[error("limit exceeded: {0:?}")]
    LimitExceeded(LimitKind),
    #[error("not text and not a supported audio file")]
    Unsupported,
    #[error("no speech recognized")]
    NoSpeech,
    #[error("download: {0}")]
    Download(ServiceError),
    #[error("conversion: {0}")]
    Conversion(ServiceError),
    #[error("transcription: {0}")]
    Transcription(ServiceError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    pub fn user_message(&self, limits: &Limits) -> String {
        match self {
            JobError::LimitExceeded(kind) => messages::limit_exceeded(*kind, limits),
            JobError::Unsupported => {
                "❓ That is neither text nor a supported audio file. Send text, an audio file or a voice message."
                    .to_string()
            }
            JobError::NoSpeech => "😕 Could not recognize any speech. Try a clearer recording.".to_string(),
            JobError::Download(e) => format!("❌ Could not download the file: {}", e),
            JobError::Conversion(e) => format!("❌ Could not prepare the audio: {}", e),
            JobError::Transcription(e) => format!("❌ Transcription error: {}", e),
            JobError::Io(e) => messages::job_failed(&e.to_string()),
        }
    }
}

/// Deliver a message and discard the outcome. Failures are logged only.
pub async fn try_notify(notifier: &dyn Notifier, target: ReplyTarget, reply: Reply) {
    if let Err(e) = notifier.notify(target, reply).await {
        warn!("Failed to notify user {}: {}", target.user_id, e);
    }
}

pub struct JobExecutor {
    coordinator: Arc<Coordinator>,
    services: Services,
    temp_dir: PathBuf,
}

impl JobExecutor {
    pub fn new(coordinator: Arc<Coordinator>, services: Services, temp_dir: PathBuf) -> Self {
        Self {
            coordinator,
            services,
            temp_dir,
        }
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.services.notifier.as_ref()
    }

    /// Run one job to completion and report the result to its originator
    pub async fn execute(&self, job: Job<Request>) -> Result<(), NotifyError> {
        let Job {
            id, user_id, payload, ..
        } = job;
        let target = payload.reply;
        let users = &self.coordinator.users;

        try_notify(
            self.notifier(),
            target,
            Reply::with_bar(
                messages::started(id, self.coordinator.queue.depth()),
                users.settings(user_id),
            ),
        )
        .await;

        debug!("Job #{} ({}) running", id, payload.kind.label());
        let result = match &payload.kind {
            RequestKind::Text(text) => self.process_text(user_id, text).await,
            RequestKind::Audio(audio) => self.process_audio(id, user_id, audio).await,
            RequestKind::Unsupported => Err(JobError::Unsupported),
        };

        let text = match result {
            Ok(text) => {
                info!("Job #{} finished", id);
                text
            }
            Err(e) => {
                info!("Job #{} ended with handled failure: {}", id, e);
                e.user_message(&self.coordinator.limits())
            }
        };

        // Settings may have been switched by the job
        self.services
            .notifier
            .notify(target, Reply::with_bar(text, users.settings(user_id)))
            .await
    }

    async fn process_text(&self, user_id: u64, text: &str) -> Result<String, JobError> {
        let text = text.trim();

        // Limits may have changed since admission
        if text.chars().count() > self.coordinator.limits().text_chars {
            return Err(JobError::LimitExceeded(LimitKind::Text));
        }

        let settings = self.coordinator.users.settings(user_id);
        let detected = languages::detect_or_accept(text, &settings.source);
        let choice = languages::pick_auto_target(&detected, &settings.target);

        let translated = self.translate_or_original(text, AUTO, choice.target).await;
        if choice.switched {
            self.coordinator
                .users
                .update_settings(user_id, |s| s.set_target(choice.target));
        }

        Ok(messages::text_done(&detected, &choice, &translated))
    }

    async fn process_audio(
        &self,
        job_id: JobId,
        user_id: u64,
        audio: &AudioAttachment,
    ) -> Result<String, JobError> {
        let workdir = self.temp_dir.join(format!("job_{}", job_id));
        tokio::fs::create_dir_all(&workdir).await?;

        let result = self.run_audio_pipeline(&workdir, user_id, audio).await;

        if let Err(e) = tokio::fs::remove_dir_all(&workdir).await {
            warn!("Failed to remove {:?}: {}", workdir, e);
        }
        result
    }

    async fn run_audio_pipeline(
        &self,
        workdir: &Path,
        user_id: u64,
        audio: &AudioAttachment,
    ) -> Result<String, JobError> {
        let settings = self.coordinator.users.settings(user_id);
        let raw_path = workdir.join(local_file_name(&audio.filename));

        self.services
            .downloader
            .download(&audio.url, &raw_path)
            .await
            .map_err(JobError::Download)?;

        let duration = match audio.duration_secs.filter(|secs| *secs > 0.0) {
            Some(secs) => secs,
            None => self.services.media.probe_duration(&raw_path).await,
        };
        debug!("Audio duration {:.1}s", duration);
        if duration > self.coordinator.limits().audio_secs {
            return Err(JobError::LimitExceeded(LimitKind::Audio));
        }

        let pcm_path = self
            .services
            .media
            .convert_to_canonical(&raw_path)
            .await
            .map_err(JobError::Conversion)?;

        let hint = (settings.source != AUTO).then_some(settings.source.as_str());
        let transcript = self
            .services
            .transcriber
            .transcribe(&pcm_path, hint)
            .await
            .map_err(JobError::Transcription)?;

        if transcript.text.trim().is_empty() {
            return Err(JobError::NoSpeech);
        }

        let choice = languages::pick_auto_target(&transcript.language, &settings.target);
        if choice.switched {
            self.coordinator
                .users
                .update_settings(user_id, |s| s.set_target(choice.target));
        }

        let translated = self
            .translate_or_original(&transcript.text, &transcript.language, choice.target)
            .await;

        Ok(messages::audio_done(
            &transcript.language,
            &choice,
            &transcript.text,
            &translated,
        ))
    }

    /// A failed translation degrades to the original text
    async fn translate_or_original(&self, text: &str, source: &str, target: &str) -> String {
        match self.services.translator.translate(text, source, target).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Translation degraded, returning original text: {}", e);
                text.to_string()
            }
        }
    }
}

/// Keep only the final path component of an uploaded file name
fn local_file_name(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "audio.bin".to_string())
}
