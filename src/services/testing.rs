//! Test doubles for the collaborator traits

use super::*;
use parking_lot::Mutex;

/// Records every reply; optionally fails all deliveries
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(ReplyTarget, Reply)>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, r)| r.text.clone()).collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.sent.lock().last().map(|(_, r)| r.text.clone())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, target: ReplyTarget, reply: Reply) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError("channel unavailable".to_string()));
        }
        self.sent.lock().push((target, reply));
        Ok(())
    }
}

/// Writes fixed bytes to the destination, or fails
pub struct FakeDownloader {
    pub fail: bool,
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, _url: &str, dest: &Path) -> Result<(), ServiceError> {
        if self.fail {
            return Err(ServiceError::Download("HTTP 404 Not Found".to_string()));
        }
        tokio::fs::write(dest, b"fake audio").await?;
        Ok(())
    }
}

pub struct FakeMedia {
    pub duration: f64,
    pub fail_convert: bool,
}

#[async_trait]
impl MediaTools for FakeMedia {
    async fn probe_duration(&self, _path: &Path) -> f64 {
        self.duration
    }

    async fn convert_to_canonical(&self, path: &Path) -> Result<PathBuf, ServiceError> {
        if self.fail_convert {
            return Err(ServiceError::Conversion("ffmpeg exited with 1".to_string()));
        }
        Ok(path.with_extension("pcm"))
    }
}

/// Returns a fixed transcript and records the language hint it was given
pub struct ScriptedTranscriber {
    pub text: String,
    pub language: String,
    pub fail: bool,
    pub hints: Mutex<Vec<Option<String>>>,
}

impl ScriptedTranscriber {
    pub fn new(text: &str, language: &str) -> Self {
        Self {
            text: text.to_string(),
            language: language.to_string(),
            fail: false,
            hints: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _path: &Path, language: Option<&str>) -> Result<Transcript, ServiceError> {
        self.hints.lock().push(language.map(str::to_string));
        if self.fail {
            return Err(ServiceError::Transcription("model exploded".to_string()));
        }
        Ok(Transcript {
            text: self.text.clone(),
            language: self.language.clone(),
        })
    }
}

/// Tags the text with the target language, or fails
#[derive(Default)]
pub struct FakeTranslator {
    pub fail: bool,
    pub calls: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, ServiceError> {
        self.calls
            .lock()
            .push((text.to_string(), source.to_string(), target.to_string()));
        if self.fail {
            return Err(ServiceError::Translation("HTTP 503".to_string()));
        }
        Ok(format!("[{}] {}", target, text))
    }
}

/// Services wired to the doubles above, with handles kept for assertions
pub struct Doubles {
    pub notifier: Arc<RecordingNotifier>,
    pub transcriber: Arc<ScriptedTranscriber>,
    pub translator: Arc<FakeTranslator>,
    pub services: Services,
}

pub struct DoublesBuilder {
    notifier: RecordingNotifier,
    downloader: FakeDownloader,
    media: FakeMedia,
    transcriber: ScriptedTranscriber,
    translator: FakeTranslator,
}

impl Default for DoublesBuilder {
    fn default() -> Self {
        Self {
            notifier: RecordingNotifier::default(),
            downloader: FakeDownloader { fail: false },
            media: FakeMedia {
                duration: 12.0,
                fail_convert: false,
            },
            transcriber: ScriptedTranscriber::new("привет", "ru"),
            translator: FakeTranslator::default(),
        }
    }
}

impl DoublesBuilder {
    pub fn notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn failing_download(mut self) -> Self {
        self.downloader.fail = true;
        self
    }

    pub fn media(mut self, media: FakeMedia) -> Self {
        self.media = media;
        self
    }

    pub fn transcriber(mut self, transcriber: ScriptedTranscriber) -> Self {
        self.transcriber = transcriber;
        self
    }

    pub fn failing_translator(mut self) -> Self {
        self.translator.fail = true;
        self
    }

    pub fn build(self) -> Doubles {
        let notifier = Arc::new(self.notifier);
        let transcriber = Arc::new(self.transcriber);
        let translator = Arc::new(self.translator);
        let services = Services {
            notifier: notifier.clone(),
            downloader: Arc::new(self.downloader),
            media: Arc::new(self.media),
            transcriber: transcriber.clone(),
            translator: translator.clone(),
        };
        Doubles {
            notifier,
            transcriber,
            translator,
            services,
        }
    }
}
