//! Inbound request payloads carried by queued jobs

use std::path::Path;

/// Extensions treated as audio when the content type is missing or generic
pub const AUDIO_EXTS: &[&str] = &[
    "mp3", "wav", "m4a", "aac", "ogg", "oga", "opus", "flac", "webm", "amr", "wma",
];

/// Where replies for a request go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTarget {
    pub user_id: u64,
    pub channel_id: u64,
}

/// An audio file attached to a message
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAttachment {
    pub url: String,
    pub filename: String,
    /// Duration reported by the chat platform, if any (voice messages)
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    Text(String),
    Audio(AudioAttachment),
    /// Neither text nor a recognizable audio file
    Unsupported,
}

impl RequestKind {
    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::Text(_) => "text",
            RequestKind::Audio(_) => "audio",
            RequestKind::Unsupported => "unsupported",
        }
    }
}

/// Opaque request handle owned by a job
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub reply: ReplyTarget,
    pub kind: RequestKind,
}

/// What the chat layer knows about one attachment
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentInfo {
    pub url: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub duration_secs: Option<f64>,
}

/// Turn an inbound message into a request payload.
///
/// An audio attachment wins over any caption text. Returns `None` for
/// commands and for messages with nothing to process.
pub fn classify(text: &str, attachments: &[AttachmentInfo]) -> Option<RequestKind> {
    let text = text.trim();
    if text.starts_with('/') {
        return None;
    }

    if let Some(audio) = attachments
        .iter()
        .find(|a| is_audio_file(a.content_type.as_deref(), &a.filename))
    {
        return Some(RequestKind::Audio(AudioAttachment {
            url: audio.url.clone(),
            filename: audio.filename.clone(),
            duration_secs: audio.duration_secs,
        }));
    }

    if !text.is_empty() {
        return Some(RequestKind::Text(text.to_string()));
    }

    if attachments.is_empty() {
        None
    } else {
        Some(RequestKind::Unsupported)
    }
}

/// Audio if the MIME type says so, or failing that, the file extension
pub fn is_audio_file(content_type: Option<&str>, filename: &str) -> bool {
    if content_type
        .map(|ct| ct.to_lowercase().starts_with("audio/"))
        .unwrap_or(false)
    {
        return true;
    }

    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_detection() {
        assert!(is_audio_file(Some("audio/ogg"), "voice-message.bin"));
        assert!(is_audio_file(Some("AUDIO/MPEG"), "x"));
        assert!(is_audio_file(None, "lecture.M4A"));
        assert!(is_audio_file(Some("application/octet-stream"), "note.opus"));
        assert!(!is_audio_file(Some("image/png"), "cat.png"));
        assert!(!is_audio_file(None, "README"));
    }

    fn attachment(filename: &str, content_type: Option<&str>) -> AttachmentInfo {
        AttachmentInfo {
            url: format!("https://cdn.example/{}", filename),
            filename: filename.to_string(),
            content_type: content_type.map(str::to_string),
            duration_secs: Some(3.5),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("  hello ", &[]), Some(RequestKind::Text("hello".to_string())));
        assert_eq!(classify("/start", &[]), None);
        assert_eq!(classify("   ", &[]), None);

        let voice = attachment("voice-message.ogg", Some("audio/ogg"));
        match classify("caption", &[attachment("cat.png", Some("image/png")), voice]) {
            Some(RequestKind::Audio(audio)) => {
                assert_eq!(audio.filename, "voice-message.ogg");
                assert_eq!(audio.duration_secs, Some(3.5));
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(
            classify("", &[attachment("cat.png", Some("image/png"))]),
            Some(RequestKind::Unsupported)
        );
        assert_eq!(
            classify("look", &[attachment("cat.png", Some("image/png"))]),
            Some(RequestKind::Text("look".to_string()))
        );
    }
}
