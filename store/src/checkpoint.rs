use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::CheckpointError;

/// Deferred work handed to a [`Checkpoint`]
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// The scheduling checkpoint a container defers its flushes to.
///
/// `defer` must not run the job inline. It runs after the current synchronous segment completes,
/// before unrelated later work where the host can promise that.
pub trait Checkpoint: Send + Sync + 'static {
    fn defer(&self, job: Job) -> Result<(), CheckpointError>;
}

/// Runs each checkpoint as a task on the tokio runtime of the calling thread.
///
/// On a current-thread runtime the task runs as soon as the running task yields, which is the
/// closest tokio offers to a microtask. On a multi-thread runtime another worker may pick it up
/// while the action is still running; the container then holds the flush back until the action
/// returns or its task yields.
#[cfg(feature = "tokio")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCheckpoint;

#[cfg(feature = "tokio")]
impl Checkpoint for TokioCheckpoint {
    fn defer(&self, job: Job) -> Result<(), CheckpointError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| CheckpointError::NoRuntime)?;
        handle.spawn(async move { job() });
        Ok(())
    }
}

/// A checkpoint queue drained explicitly by the host.
///
/// Cloning shares the queue.
#[derive(Clone, Default)]
pub struct ManualCheckpoint(Arc<Mutex<Queue>>);

#[derive(Default)]
struct Queue {
    jobs: VecDeque<Job>,
    closed: bool,
}

impl ManualCheckpoint {
    pub fn new() -> Self { Self::default() }

    /// Run queued jobs until the queue is empty, including jobs queued by the jobs themselves.
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // The lock is released before the job runs, so jobs may defer further work
            let next = self.0.lock().unwrap_or_else(PoisonError::into_inner).jobs.pop_front();
            let Some(job) = next else { break };
            job();
            ran += 1;
        }
        ran
    }

    /// Number of queued jobs
    pub fn pending(&self) -> usize { self.0.lock().unwrap_or_else(PoisonError::into_inner).jobs.len() }

    /// Refuse further jobs and discard the ones still queued
    pub fn close(&self) {
        let mut queue = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        queue.closed = true;
        queue.jobs.clear();
    }
}

impl Checkpoint for ManualCheckpoint {
    fn defer(&self, job: Job) -> Result<(), CheckpointError> {
        let mut queue = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.closed {
            return Err(CheckpointError::Closed);
        }
        queue.jobs.push_back(job);
        Ok(())
    }
}

impl std::fmt::Debug for ManualCheckpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("ManualCheckpoint").field("pending", &self.pending()).finish() }
}

/// A checkpoint that never runs anything.
///
/// `defer` drops the job and returns [`CheckpointError::Disabled`]. Containers using it publish only
/// on forced flushes, so a change made outside any action (for example by a detached continuation)
/// stays pending until the next action call completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unscheduled;

impl Checkpoint for Unscheduled {
    fn defer(&self, _job: Job) -> Result<(), CheckpointError> { Err(CheckpointError::Disabled) }
}

/// The checkpoint a container uses when the builder is not given one
pub(crate) fn default_checkpoint() -> Arc<dyn Checkpoint> {
    #[cfg(feature = "tokio")]
    {
        Arc::new(TokioCheckpoint)
    }
    #[cfg(not(feature = "tokio"))]
    {
        Arc::new(Unscheduled)
    }
}
