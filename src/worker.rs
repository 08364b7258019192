//! The single background worker
//!
//! Sole consumer of the job queue. Jobs run one at a time, in enqueue order,
//! and the next job is not dequeued until the current one has been cleaned up.

use crate::admission::Coordinator;
use crate::executor::{try_notify, JobExecutor};
use crate::messages;
use crate::services::Reply;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Start the worker on the runtime
pub fn spawn(coordinator: Arc<Coordinator>, executor: Arc<JobExecutor>) -> JoinHandle<()> {
    tokio::spawn(run(coordinator, executor))
}

pub async fn run(coordinator: Arc<Coordinator>, executor: Arc<JobExecutor>) {
    info!("Worker started");

    while let Some(job) = coordinator.queue.dequeue().await {
        let job_id = job.id;
        let user_id = job.user_id;
        let target = job.payload.reply;

        if !coordinator.users.flags(user_id).queued {
            warn!("Job #{} dequeued but user {} was not marked queued", job_id, user_id);
        }
        coordinator.users.update_flags(user_id, |f| f.mark_busy());

        let waited = chrono::Utc::now() - job.enqueued_at;
        debug!(
            "Job #{} for user {} picked up after {}ms (position {:?})",
            job_id,
            user_id,
            waited.num_milliseconds(),
            coordinator.queue.position(job_id)
        );

        // Own task so a panic inside the pipeline surfaces as a JoinError
        let task = {
            let executor = executor.clone();
            tokio::spawn(async move { executor.execute(job).await })
        };

        let failure = match task.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                error!("Job #{} failed outside the executor: {}", job_id, e);
                Some(e.to_string())
            }
            Err(e) => {
                error!("Job #{} aborted: {}", job_id, e);
                Some("internal error".to_string())
            }
        };

        if let Some(reason) = failure {
            try_notify(
                executor.notifier(),
                target,
                Reply::with_bar(messages::job_failed(&reason), coordinator.users.settings(user_id)),
            )
            .await;
        }

        coordinator.queue.remove(job_id);
        coordinator.users.update_flags(user_id, |f| f.clear());
        coordinator.queue.task_done();
    }

    warn!("Job queue closed, worker exiting");
}
