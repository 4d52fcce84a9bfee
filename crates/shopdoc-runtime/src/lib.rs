//! Channel-driven render worker
//!
//! Callers send [`RenderCommand`]s and receive [`RenderUpdate`]s. Jobs run
//! concurrently up to a limit, each under an optional deadline.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};

// Re-export types from library crates
pub use shopdoc_render::{DocumentLocator, DocumentRequest, RenderEngine};

/// Commands sent to the worker
#[derive(Debug)]
pub enum RenderCommand {
    /// Create the output directories
    Prepare,
    Generate { job: JobId, request: DocumentRequest },
}

/// Updates sent back from the worker
#[derive(Debug, Clone)]
pub enum RenderUpdate {
    Prepared,
    Started {
        job: JobId,
        number: String,
    },
    Complete {
        job: JobId,
        locator: DocumentLocator,
        page_count: usize,
    },
    Failed {
        job: JobId,
        message: String,
    },
    TimedOut {
        job: JobId,
        after: Duration,
    },
}

impl RenderUpdate {
    pub fn job(&self) -> Option<JobId> {
        match self {
            RenderUpdate::Prepared => None,
            RenderUpdate::Started { job, .. }
            | RenderUpdate::Complete { job, .. }
            | RenderUpdate::Failed { job, .. }
            | RenderUpdate::TimedOut { job, .. } => Some(*job),
        }
    }

    /// No further updates follow for this job
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            RenderUpdate::Complete { .. } | RenderUpdate::Failed { .. } | RenderUpdate::TimedOut { .. }
        )
    }
}

/// Handle to a submitted render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid worker options: {0}")]
    Options(String),
    #[error("Render worker has stopped")]
    WorkerStopped,
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

// =============================================================================
// Options
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerOptions {
    /// Per-job limit; `None` waits as long as the render takes
    pub deadline: Option<Duration>,
    /// Renders allowed to run at the same time
    pub max_concurrent: usize,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            deadline: Some(Duration::from_secs(30)),
            max_concurrent: 4,
        }
    }
}

impl WorkerOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(RuntimeError::Options(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(RuntimeError::Options(
                "deadline must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Worker
// =============================================================================

/// Run `future` under an optional deadline
pub async fn with_deadline<F: Future>(
    deadline: Option<Duration>,
    future: F,
) -> std::result::Result<F::Output, tokio::time::error::Elapsed> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, future).await,
        None => Ok(future.await),
    }
}

/// Async worker task that processes render commands and sends updates
pub async fn worker_task(
    engine: RenderEngine,
    options: WorkerOptions,
    mut command_rx: mpsc::UnboundedReceiver<RenderCommand>,
    update_tx: mpsc::UnboundedSender<RenderUpdate>,
) {
    let permits = Arc::new(Semaphore::new(options.max_concurrent.max(1)));
    let mut jobs = JoinSet::new();

    while let Some(cmd) = command_rx.recv().await {
        match cmd {
            RenderCommand::Prepare => {
                engine.prepare().await;
                let _ = update_tx.send(RenderUpdate::Prepared);
            }
            RenderCommand::Generate { job, request } => {
                // Waiting here applies back-pressure to the command queue
                let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                    break;
                };
                let engine = engine.clone();
                let update_tx = update_tx.clone();
                let deadline = options.deadline;
                jobs.spawn(async move {
                    run_job(&engine, job, request, deadline, &update_tx).await;
                    drop(permit);
                });
            }
        }

        while let Some(finished) = jobs.try_join_next() {
            if let Err(e) = finished {
                log::error!("Render job panicked: {}", e);
            }
        }
    }

    while let Some(finished) = jobs.join_next().await {
        if let Err(e) = finished {
            log::error!("Render job panicked: {}", e);
        }
    }
    log::debug!("Render worker stopped");
}

async fn run_job(
    engine: &RenderEngine,
    job: JobId,
    request: DocumentRequest,
    deadline: Option<Duration>,
    update_tx: &mpsc::UnboundedSender<RenderUpdate>,
) {
    let _ = update_tx.send(RenderUpdate::Started {
        job,
        number: request.number().to_string(),
    });

    let update = match with_deadline(deadline, engine.generate(request)).await {
        Ok(Ok(generated)) => RenderUpdate::Complete {
            job,
            locator: generated.locator,
            page_count: generated.page_count,
        },
        Ok(Err(e)) => {
            log::warn!("Render job {} failed: {}", job.0, e);
            RenderUpdate::Failed {
                job,
                message: e.to_string(),
            }
        }
        Err(_) => {
            let after = deadline.unwrap_or_default();
            log::warn!("Render job {} timed out after {:?}", job.0, after);
            RenderUpdate::TimedOut { job, after }
        }
    };
    let _ = update_tx.send(update);
}

/// A running worker with its channels
pub struct RenderWorker {
    commands: mpsc::UnboundedSender<RenderCommand>,
    updates: mpsc::UnboundedReceiver<RenderUpdate>,
    next_job: AtomicU64,
    handle: JoinHandle<()>,
}

impl RenderWorker {
    /// Spawn the worker on the current runtime
    pub fn spawn(engine: RenderEngine, options: WorkerOptions) -> Result<Self> {
        options.validate()?;
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(worker_task(engine, options, command_rx, update_tx));

        Ok(Self {
            commands: command_tx,
            updates: update_rx,
            next_job: AtomicU64::new(1),
            handle,
        })
    }

    pub fn prepare(&self) -> Result<()> {
        self.commands
            .send(RenderCommand::Prepare)
            .map_err(|_| RuntimeError::WorkerStopped)
    }

    /// Queue a render and return its job id
    pub fn submit(&self, request: DocumentRequest) -> Result<JobId> {
        let job = JobId(self.next_job.fetch_add(1, Ordering::Relaxed));
        self.commands
            .send(RenderCommand::Generate { job, request })
            .map_err(|_| RuntimeError::WorkerStopped)?;
        Ok(job)
    }

    /// Next update, or `None` once the worker has stopped
    pub async fn next_update(&mut self) -> Option<RenderUpdate> {
        self.updates.recv().await
    }

    /// Stop accepting commands and wait for running jobs to finish
    pub async fn shutdown(self) -> Vec<RenderUpdate> {
        let RenderWorker {
            commands,
            mut updates,
            handle,
            ..
        } = self;
        drop(commands);
        if let Err(e) = handle.await {
            log::error!("Render worker panicked: {}", e);
        }

        let mut remaining = Vec::new();
        while let Ok(update) = updates.try_recv() {
            remaining.push(update);
        }
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_validation() {
        assert!(WorkerOptions::default().validate().is_ok());

        let options = WorkerOptions {
            max_concurrent: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = WorkerOptions {
            deadline: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[tokio::test]
    async fn test_deadline_elapses_on_stalled_job() {
        let result = with_deadline(Some(Duration::from_millis(10)), std::future::pending::<()>()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_no_deadline_waits() {
        let result = with_deadline(None, async { 7 }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
