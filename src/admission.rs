//! Admission control and the process-wide coordinator
//!
//! The coordinator owns the user store and the job queue. Request handlers
//! submit through it concurrently; the worker consumes from it.

use crate::config::Limits;
use crate::queue::{JobId, JobQueue, QueueStatus};
use crate::request::{Request, RequestKind};
use crate::store::UserStore;
use tracing::debug;

/// Why a request did not become a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The user already has a job waiting or running. `position` is absent
    /// when the job can no longer be found in the pending list.
    AlreadyActive {
        position: Option<usize>,
        depth: usize,
    },
    LimitExceeded(LimitKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Text,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionResult {
    Accepted {
        job_id: JobId,
        position: usize,
        depth: usize,
    },
    Rejected(Rejection),
}

/// Process-wide coordinator shared by handlers and the worker
pub struct Coordinator {
    pub users: UserStore,
    pub queue: JobQueue<Request>,
    limits: Limits,
}

impl Coordinator {
    pub fn new(limits: Limits) -> Self {
        Self {
            users: UserStore::new(),
            queue: JobQueue::new(),
            limits,
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Gate an incoming request: busy/queued check, then the size limit,
    /// then enqueue. Nothing is enqueued for a rejected request.
    pub fn submit(&self, user_id: u64, request: Request) -> AdmissionResult {
        // The entry guard serializes concurrent submissions from one user
        let mut entry = self.users.get_or_create(user_id);

        if entry.flags.is_active() {
            let lookup = self.queue.find_user(user_id);
            let position = lookup.found.map(|(_, pos)| pos);
            debug!("User {} already active (position {:?})", user_id, position);
            return AdmissionResult::Rejected(Rejection::AlreadyActive {
                position,
                depth: lookup.depth,
            });
        }

        if let Some(kind) = self.exceeds_limit(&request.kind) {
            debug!("User {} over the {:?} limit", user_id, kind);
            return AdmissionResult::Rejected(Rejection::LimitExceeded(kind));
        }

        entry.flags.mark_queued();
        let enqueued = self.queue.enqueue(user_id, request);
        debug!(
            "Accepted job #{} for user {} at {}/{}",
            enqueued.job_id, user_id, enqueued.position, enqueued.depth
        );

        AdmissionResult::Accepted {
            job_id: enqueued.job_id,
            position: enqueued.position,
            depth: enqueued.depth,
        }
    }

    /// Limits that can be checked before anything is downloaded. Audio
    /// without a reported duration is checked later by the executor.
    pub fn exceeds_limit(&self, kind: &RequestKind) -> Option<LimitKind> {
        match kind {
            RequestKind::Text(text) if text.chars().count() > self.limits.text_chars => {
                Some(LimitKind::Text)
            }
            RequestKind::Audio(audio)
                if audio
                    .duration_secs
                    .map(|secs| secs > self.limits.audio_secs)
                    .unwrap_or(false) =>
            {
                Some(LimitKind::Audio)
            }
            _ => None,
        }
    }

    pub fn status(&self, limit: usize) -> QueueStatus {
        self.queue.status(limit)
    }
}
