//! Notification queue
//!
//! Bounded mpsc channel drained by one worker task. Each job is delivered
//! on its own task (bounded by a semaphore) under the retry policy; jobs that
//! exhaust their attempts, or do not fit in the queue, become dead letters.

use std::sync::Arc;

use shared::RetryPolicy;
use shared::retry::RetryError;
use tokio::sync::{Semaphore, mpsc};

use super::{Channels, NotificationJob, NotifyError};

/// Pending jobs before enqueue starts dropping
const QUEUE_CAPACITY: usize = 1024;
/// Deliveries in flight at once
const DELIVERY_CONCURRENCY: usize = 8;

/// Handle for enqueueing jobs; cheap to clone
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<NotificationJob>,
}

impl NotificationQueue {
    /// Spawn the worker on the current runtime
    pub fn start(channels: Channels, policy: RetryPolicy) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(run_worker(Arc::new(channels), policy, rx));
        Self { tx }
    }

    /// Hand a job to the worker; never blocks and never fails the caller
    pub fn enqueue(&self, job: NotificationJob) {
        if let Err(e) = self.tx.try_send(job) {
            let reason = match &e {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "queue closed",
            };
            dead_letter(&e.into_inner(), reason, 0);
        }
    }
}

async fn run_worker(
    channels: Arc<Channels>,
    policy: RetryPolicy,
    mut rx: mpsc::Receiver<NotificationJob>,
) {
    tracing::info!(concurrency = DELIVERY_CONCURRENCY, "Notification worker started");
    let semaphore = Arc::new(Semaphore::new(DELIVERY_CONCURRENCY));

    while let Some(job) = rx.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let channels = channels.clone();
        tokio::spawn(async move {
            deliver(&channels, policy, job).await;
            drop(permit);
        });
    }

    tracing::info!("Notification channel closed, worker stopped");
}

async fn deliver(channels: &Channels, policy: RetryPolicy, job: NotificationJob) {
    let result = policy
        .run(
            |attempt| {
                if attempt > 0 {
                    tracing::debug!(kind = job.kind(), attempt, "Retrying notification");
                }
                channels.deliver(&job)
            },
            is_retryable,
        )
        .await;

    match result {
        Ok(()) => tracing::debug!(kind = job.kind(), "Notification delivered"),
        Err(RetryError::Timeout { attempt, .. }) => {
            dead_letter(&job, "timed out", attempt + 1);
        }
        Err(RetryError::Failed(e)) => {
            dead_letter(&job, &e.to_string(), policy.max_attempts);
        }
    }
}

/// Provider errors worth another attempt
pub fn is_retryable(err: &NotifyError) -> bool {
    match err {
        NotifyError::Transport(_) => true,
        NotifyError::Status { status, .. } => *status >= 500 || *status == 429,
        NotifyError::Rejected(_) => false,
    }
}

fn dead_letter(job: &NotificationJob, reason: &str, attempts: u32) {
    tracing::error!(
        target: "dead_letter",
        kind = job.kind(),
        recipient = %job.recipient(),
        attempts,
        reason = %reason,
        "Notification dropped"
    );
}
