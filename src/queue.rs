//! Global job queue
//!
//! A FIFO channel consumed by the single worker, plus a pending list used
//! for position reporting. The pending list covers waiting jobs and the job
//! currently executing; a job leaves it only when the worker removes it
//! after completion. Counter, pending list and channel push share one lock,
//! so both views always hold the same jobs in the same order.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::{mpsc, Notify};

pub type JobId = u64;

/// One unit of enqueued work
#[derive(Debug)]
pub struct Job<P> {
    pub id: JobId,
    pub user_id: u64,
    pub payload: P,
    pub enqueued_at: DateTime<Utc>,
}

/// Result of a successful enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    pub job_id: JobId,
    /// 1-based position in the pending list
    pub position: usize,
    /// Pending list length right after insertion
    pub depth: usize,
}

/// Queue snapshot for the `/queue` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatus {
    pub depth: usize,
    pub first_ids: Vec<JobId>,
}

/// Where a user's job sits, as one consistent snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserLookup {
    /// Job ID and 1-based position
    pub found: Option<(JobId, usize)>,
    pub depth: usize,
}

#[derive(Debug, Clone, Copy)]
struct PendingEntry {
    job_id: JobId,
    user_id: u64,
}

#[derive(Debug, Default)]
struct State {
    last_id: JobId,
    pending: VecDeque<PendingEntry>,
    /// Enqueued but not yet marked done
    unfinished: usize,
}

pub struct JobQueue<P> {
    state: Mutex<State>,
    sender: mpsc::UnboundedSender<Job<P>>,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<Job<P>>>,
    drained: Notify,
}

impl<P> JobQueue<P> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            state: Mutex::new(State::default()),
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
            drained: Notify::new(),
        }
    }

    /// Assign the next job ID and append the job to both the pending list
    /// and the consumption channel.
    pub fn enqueue(&self, user_id: u64, payload: P) -> Enqueued {
        let mut state = self.state.lock();
        state.last_id += 1;
        let job_id = state.last_id;

        state.pending.push_back(PendingEntry { job_id, user_id });
        state.unfinished += 1;

        // The receiver lives in `self`, so the channel is never closed here
        let _ = self.sender.send(Job {
            id: job_id,
            user_id,
            payload,
            enqueued_at: Utc::now(),
        });

        let depth = state.pending.len();
        Enqueued {
            job_id,
            position: depth,
            depth,
        }
    }

    /// Wait for the oldest job in the channel.
    ///
    /// The job stays in the pending list until [`JobQueue::remove`] is called.
    /// Returns `None` only if the channel has been closed.
    pub async fn dequeue(&self) -> Option<Job<P>> {
        self.receiver.lock().await.recv().await
    }

    /// 1-based position of a job in the pending list
    pub fn position(&self, job_id: JobId) -> Option<usize> {
        self.state
            .lock()
            .pending
            .iter()
            .position(|entry| entry.job_id == job_id)
            .map(|idx| idx + 1)
    }

    /// The user's earliest pending job, read under the same lock as the depth
    pub fn find_user(&self, user_id: u64) -> UserLookup {
        let state = self.state.lock();
        let found = state
            .pending
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.user_id == user_id)
            .map(|(idx, entry)| (entry.job_id, idx + 1));
        UserLookup {
            found,
            depth: state.pending.len(),
        }
    }

    /// Drop a job from the pending list. Returns false if it was not there.
    pub fn remove(&self, job_id: JobId) -> bool {
        let mut state = self.state.lock();
        match state.pending.iter().position(|entry| entry.job_id == job_id) {
            Some(idx) => {
                state.pending.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn depth(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Depth plus the first `limit` pending job IDs
    pub fn status(&self, limit: usize) -> QueueStatus {
        let state = self.state.lock();
        QueueStatus {
            depth: state.pending.len(),
            first_ids: state.pending.iter().take(limit).map(|e| e.job_id).collect(),
        }
    }

    /// Mark one dequeued job as finished
    pub fn task_done(&self) {
        let mut state = self.state.lock();
        state.unfinished = state.unfinished.saturating_sub(1);
        if state.unfinished == 0 {
            self.drained.notify_waiters();
        }
    }

    /// Wait until every enqueued job has been marked done
    pub async fn join(&self) {
        loop {
            let drained = self.drained.notified();
            if self.state.lock().unfinished == 0 {
                return;
            }
            drained.await;
        }
    }
}

impl<P> Default for JobQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_and_depth() {
        let queue = JobQueue::new();
        let a = queue.enqueue(1, "a");
        let b = queue.enqueue(2, "b");
        let c = queue.enqueue(3, "c");

        assert_eq!((a.job_id, a.position), (1, 1));
        assert_eq!((b.job_id, b.position), (2, 2));
        assert_eq!((c.job_id, c.position, c.depth), (3, 3, 3));

        let mut depths = Vec::new();
        for expected in ["a", "b", "c"] {
            let job = queue.dequeue().await.unwrap();
            assert_eq!(job.payload, expected);
            // Still pending while it runs
            assert_eq!(queue.position(job.id), Some(1));
            depths.push(queue.depth());
            queue.remove(job.id);
            queue.task_done();
        }
        assert_eq!(depths, vec![3, 2, 1]);
        assert_eq!(queue.depth(), 0);
    }

    #[test]
    fn test_remove_then_position() {
        let queue = JobQueue::new();
        let first = queue.enqueue(1, ());
        let second = queue.enqueue(2, ());

        assert_eq!(queue.position(second.job_id), Some(2));
        assert!(queue.remove(first.job_id));
        assert_eq!(queue.position(first.job_id), None);
        assert_eq!(queue.position(second.job_id), Some(1));

        // No-op when absent
        assert!(!queue.remove(first.job_id));
        assert_eq!(queue.depth(), 1);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let queue = JobQueue::new();
        let first = queue.enqueue(1, ());
        queue.remove(first.job_id);
        let second = queue.enqueue(1, ());
        assert_eq!(second.job_id, 2);
        assert_eq!(second.position, 1);
    }

    #[test]
    fn test_find_user_and_status() {
        let queue = JobQueue::new();
        for user in 10..25 {
            queue.enqueue(user, ());
        }
        assert_eq!(queue.find_user(12), UserLookup { found: Some((3, 3)), depth: 15 });
        assert_eq!(queue.find_user(99), UserLookup { found: None, depth: 15 });

        let status = queue.status(10);
        assert_eq!(status.depth, 15);
        assert_eq!(status.first_ids, (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enqueue_keeps_views_in_sync() {
        let queue = Arc::new(JobQueue::new());
        let mut handles = Vec::new();
        for user in 0..64u64 {
            let queue = queue.clone();
            handles.push(tokio::spawn(async move { queue.enqueue(user, user) }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let pending = queue.status(usize::MAX).first_ids;
        assert_eq!(pending.len(), 64);

        // Channel order matches pending order, and IDs are strictly increasing
        for expected in pending {
            let job = queue.dequeue().await.unwrap();
            assert_eq!(job.id, expected);
            assert_eq!(job.payload, job.user_id);
        }
    }

    #[tokio::test]
    async fn test_join_waits_for_task_done() {
        let queue = Arc::new(JobQueue::new());
        queue.join().await;

        queue.enqueue(1, ());
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.join().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        let job = queue.dequeue().await.unwrap();
        queue.remove(job.id);
        queue.task_done();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
