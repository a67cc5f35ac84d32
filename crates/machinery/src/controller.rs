//! Controller harness: one worker pulling keys from a work queue and
//! handing them to a reconciler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{error, info};

use crate::workqueue::WorkQueue;

/// Fixed delay before a failed key is retried.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// What the harness should do with a key after a successful reconcile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileResult {
    /// Re-queue immediately.
    pub requeue: bool,
    /// Re-queue after this delay; takes precedence over `requeue` when
    /// non-zero.
    pub requeue_after: Duration,
}

pub type ReconcileError = Box<dyn std::error::Error + Send + Sync>;

/// Brings external state into agreement with the declared state for a key.
#[async_trait]
pub trait Reconciler: Send + Sync {
    async fn reconcile(&self, key: &str) -> Result<ReconcileResult, ReconcileError>;
}

/// Pairs a work queue with a reconciler and a single worker.
pub struct Controller {
    queue: Arc<WorkQueue<String>>,
    reconciler: Arc<dyn Reconciler>,
}

impl Controller {
    pub fn new(reconciler: Arc<dyn Reconciler>) -> Self {
        Self {
            queue: Arc::new(WorkQueue::new()),
            reconciler,
        }
    }

    pub fn add(&self, key: impl Into<String>) {
        self.queue.add(key.into());
    }

    pub fn add_after(&self, key: impl Into<String>, after: Duration) {
        self.queue.add_after(key.into(), after);
    }

    /// Runs the worker until `stop` flips to true (or its sender is
    /// dropped), then shuts the queue down and waits for the worker to
    /// drain.
    pub async fn run(&self, mut stop: watch::Receiver<bool>) {
        let queue = Arc::clone(&self.queue);
        let reconciler = Arc::clone(&self.reconciler);
        let worker = tokio::spawn(async move {
            while let Some(key) = queue.get().await {
                match reconciler.reconcile(&key).await {
                    Err(err) => {
                        error!("reconcile of {key} failed: {err}");
                        queue.add_after(key.clone(), ERROR_BACKOFF);
                    }
                    Ok(result) if result.requeue_after > Duration::ZERO => {
                        queue.add_after(key.clone(), result.requeue_after);
                    }
                    Ok(result) if result.requeue => {
                        queue.add(key.clone());
                    }
                    Ok(_) => {
                        info!("reconciled {key}");
                    }
                }
                // After the requeue decision, so adds made while the key was
                // in flight are honored.
                queue.done(&key);
            }
        });

        let _ = stop.wait_for(|stopped| *stopped).await;
        self.queue.shutdown();
        let _ = worker.await;
    }
}
