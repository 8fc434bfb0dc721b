//! Background execution of imports and exports.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::errors::{CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Import { import_id: String },
    Export { export_id: String },
    CleanupExports,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: Job) -> CoreResult<()>;
}

/// Executes one job to completion.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, job: Job) -> CoreResult<()>;
}

/// Unbounded channel drained by a single worker task.
#[derive(Debug, Clone)]
pub struct TokioJobQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl TokioJobQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Job>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Spawns the worker. Jobs run one at a time; a failed job is logged and not retried.
    pub fn spawn_worker(
        mut receiver: mpsc::UnboundedReceiver<Job>,
        runner: Arc<dyn JobRunner>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                info!(?job, "Running job");
                if let Err(e) = runner.run(job.clone()).await {
                    error!(?job, error = %e, "Job failed");
                }
            }
            info!("Job queue closed");
        })
    }
}

#[async_trait]
impl JobQueue for TokioJobQueue {
    async fn enqueue(&self, job: Job) -> CoreResult<()> {
        self.sender
            .send(job)
            .map_err(|e| CoreError::unavailable(format!("Job queue is closed: {:?}", e.0)))
    }
}

/// Holds jobs until the caller drains them. Used by the CLI and tests to run work
/// in the foreground.
#[derive(Debug, Default)]
pub struct BufferedJobQueue {
    jobs: Mutex<Vec<Job>>,
}

impl BufferedJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn drain(&self) -> Vec<Job> {
        std::mem::take(&mut *self.jobs.lock().await)
    }

    pub async fn pending(&self) -> Vec<Job> {
        self.jobs.lock().await.clone()
    }
}

#[async_trait]
impl JobQueue for BufferedJobQueue {
    async fn enqueue(&self, job: Job) -> CoreResult<()> {
        self.jobs.lock().await.push(job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        seen: Mutex<Vec<Job>>,
    }

    #[async_trait]
    impl JobRunner for Recorder {
        async fn run(&self, job: Job) -> CoreResult<()> {
            let fail = matches!(job, Job::CleanupExports);
            self.seen.lock().await.push(job);
            if fail {
                return Err(CoreError::internal("boom"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_worker_runs_jobs_in_order_and_survives_failures() {
        let runner = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let (queue, receiver) = TokioJobQueue::channel();
        let handle = TokioJobQueue::spawn_worker(receiver, runner.clone());

        queue
            .enqueue(Job::Import {
                import_id: "i1".to_string(),
            })
            .await
            .unwrap();
        queue.enqueue(Job::CleanupExports).await.unwrap();
        queue
            .enqueue(Job::Export {
                export_id: "e1".to_string(),
            })
            .await
            .unwrap();
        drop(queue);
        handle.await.unwrap();

        let seen = runner.seen.lock().await.clone();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1], Job::CleanupExports);
    }

    #[tokio::test]
    async fn test_buffered_queue_drains() {
        let queue = BufferedJobQueue::new();
        queue.enqueue(Job::CleanupExports).await.unwrap();
        assert_eq!(queue.pending().await.len(), 1);
        assert_eq!(queue.drain().await, vec![Job::CleanupExports]);
        assert!(queue.drain().await.is_empty());
    }
}
