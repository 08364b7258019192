//! User-facing message texts

use crate::admission::{LimitKind, Rejection};
use crate::config::Limits;
use crate::languages::{fmt_lang, TargetChoice};
use crate::queue::{JobId, QueueStatus};
use crate::store::UserSettings;

/// Job IDs listed by `/queue`
pub const QUEUE_PREVIEW: usize = 10;

/// Whole seconds as "5 min", "1 min 30 s" or "45 s"
pub fn fmt_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    match (total / 60, total % 60) {
        (0, secs) => format!("{} s", secs),
        (mins, 0) => format!("{} min", mins),
        (mins, secs) => format!("{} min {} s", mins, secs),
    }
}

pub fn start_text(settings: &UserSettings, limits: &Limits) -> String {
    format!(
        "Hi! 👋\n\
         I translate text and audio.\n\n\
         What I can do:\n\
         • Tell whether you sent text or audio.\n\
         • Convert audio to 16 kHz mono so Whisper can read it.\n\
         • Transcribe audio (Whisper) and translate it.\n\
         • Limits: audio up to {}, text up to {} characters.\n\n\
         Current languages: input = {}, output = {}.\n\
         Send me text or audio, I'll take care of the rest 😉",
        fmt_duration(limits.audio_secs),
        limits.text_chars,
        fmt_lang(&settings.source),
        fmt_lang(&settings.target),
    )
}

pub fn accepted(job_id: JobId, position: usize, depth: usize) -> String {
    format!("✅ Request accepted (#{}). Your position in the queue: {}/{}.", job_id, position, depth)
}

pub fn rejected(rejection: &Rejection, limits: &Limits) -> String {
    match rejection {
        Rejection::AlreadyActive {
            position: Some(position),
            depth,
        } => format!(
            "⏳ You already have an active request. Waiting for it to finish.\n\
             Your position in the queue: {}/{}.",
            position, depth
        ),
        Rejection::AlreadyActive { position: None, .. } => {
            "⏳ Still working on your previous request. Please wait.".to_string()
        }
        Rejection::LimitExceeded(kind) => limit_exceeded(*kind, limits),
    }
}

pub fn limit_exceeded(kind: LimitKind, limits: &Limits) -> String {
    match kind {
        LimitKind::Text => format!(
            "⚠️ Text limit exceeded ({} characters). Please shorten it.",
            limits.text_chars
        ),
        LimitKind::Audio => format!(
            "⚠️ Audio is longer than {}. Please shorten it.",
            fmt_duration(limits.audio_secs)
        ),
    }
}

pub fn started(job_id: JobId, depth: usize) -> String {
    format!("🚀 Starting request #{}. Current queue: {}.", job_id, depth)
}

fn switched_line(choice: &TargetChoice) -> Option<String> {
    choice
        .switched
        .then(|| format!("🔁 Auto: target language switched to {}", fmt_lang(choice.target)))
}

pub fn text_done(detected: &str, choice: &TargetChoice, translated: &str) -> String {
    let mut parts = vec![
        "📝 Done!\n".to_string(),
        format!("Detected text language: {}", fmt_lang(detected)),
        format!("Target language: {}", fmt_lang(choice.target)),
    ];
    parts.extend(switched_line(choice));
    parts.push(format!("\n{}", translated));
    parts.join("\n")
}

pub fn audio_done(detected: &str, choice: &TargetChoice, transcript: &str, translated: &str) -> String {
    let mut parts = vec![
        "🎧 Done!\n".to_string(),
        format!("Detected audio language: {}", fmt_lang(detected)),
        format!("Translation target: {}", fmt_lang(choice.target)),
    ];
    parts.extend(switched_line(choice));
    parts.push(format!("\n🗒 Transcript:\n{}", transcript));
    parts.push(format!("\n🌍 Translation:\n{}", translated));
    parts.join("\n")
}

pub fn queue_status(status: &QueueStatus) -> String {
    let more = if status.depth > status.first_ids.len() { "..." } else { "" };
    format!(
        "🧾 In the queue now: {}.\nActive requests (id): {:?}{}",
        status.depth, status.first_ids, more
    )
}

pub fn job_failed(reason: &str) -> String {
    format!("❌ Processing error: {}", reason)
}
