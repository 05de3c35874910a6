//! Bounded-concurrency batch dispatch.
//!
//! [`dispatch`] is the scheduling primitive: it fans N independent jobs out
//! across at most `max_workers` concurrent executions and re-assembles the
//! outcomes in submission order. [`BatchRun`] wires it to the real executor.

use crate::client::GeminiClient;
use crate::error::{ImagenError, Result};
use crate::executor::{self, PostProcessing};
use crate::naming::NameRegistry;
use crate::types::{BatchReport, JobDescriptor, JobResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};

/// Default worker cap when none is configured.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Run `jobs` through `run` with at most `max_workers` in flight at once.
///
/// As soon as one execution completes the next queued job starts. Completion
/// order is unconstrained; `on_progress` fires once per completion, in
/// completion order, with `(completed, total, result)`. The returned vector
/// is in submission order and is only produced after every job has drained —
/// one job's failure never cancels its siblings.
pub async fn dispatch<F, Fut, P>(
    jobs: Vec<JobDescriptor>,
    max_workers: usize,
    run: F,
    mut on_progress: P,
) -> Vec<JobResult>
where
    F: Fn(JobDescriptor) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JobResult> + Send + 'static,
    P: FnMut(usize, usize, &JobResult),
{
    let total = jobs.len();
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let run = Arc::new(run);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut descriptors = Vec::with_capacity(total);
    let mut handles = Vec::with_capacity(total);
    for (index, job) in jobs.into_iter().enumerate() {
        descriptors.push(job.clone());
        let semaphore = Arc::clone(&semaphore);
        let run = Arc::clone(&run);
        let tx = tx.clone();
        handles.push(tokio::spawn(async move {
            // Each task holds an Arc to the semaphore, so it is never closed.
            let _permit = semaphore.acquire().await.ok();
            let result = run(job).await;
            let _ = tx.send((index, result));
        }));
    }
    drop(tx);

    let mut slots: Vec<Option<JobResult>> = (0..total).map(|_| None).collect();
    let mut completed = 0;
    while let Some((index, result)) = rx.recv().await {
        completed += 1;
        on_progress(completed, total, &result);
        slots[index] = Some(result);
    }

    // A task that panicked dropped its sender without reporting, leaving its
    // slot empty. Surface the join error as that job's failure so the batch
    // always yields exactly one result per submitted job.
    for (index, handle) in handles.into_iter().enumerate() {
        if slots[index].is_some() {
            continue;
        }
        let message = match handle.await {
            Err(e) => format!("job task aborted: {}", e),
            Ok(()) => "job task ended without reporting a result".to_string(),
        };
        completed += 1;
        let result = JobResult::failure(descriptors[index].clone(), message, 0);
        on_progress(completed, total, &result);
        slots[index] = Some(result);
    }

    slots.into_iter().flatten().collect()
}

/// A validated batch: an ordered job list, a worker cap and shared options.
///
/// Owns the [`NameRegistry`] for the run, so every worker allocates output
/// names against the same in-run set.
#[derive(Debug)]
pub struct BatchRun {
    jobs: Vec<JobDescriptor>,
    max_workers: usize,
    post: PostProcessing,
    registry: Arc<NameRegistry>,
}

impl BatchRun {
    /// Validate and create a batch.
    ///
    /// Pre-flight validation is batch-fatal: a zero worker cap, an empty job
    /// list or a blank prompt rejects the whole batch before any network
    /// call is made.
    pub fn new(jobs: Vec<JobDescriptor>, max_workers: usize) -> Result<Self> {
        if max_workers == 0 {
            return Err(ImagenError::Validation(
                "worker count must be positive".to_string(),
            ));
        }
        if jobs.is_empty() {
            return Err(ImagenError::Validation("no jobs to process".to_string()));
        }
        for (i, job) in jobs.iter().enumerate() {
            if job.prompt.trim().is_empty() {
                return Err(ImagenError::Validation(format!(
                    "job {} has an empty prompt",
                    i + 1
                )));
            }
        }
        Ok(Self {
            jobs,
            max_workers,
            post: PostProcessing::default(),
            registry: Arc::new(NameRegistry::new()),
        })
    }

    /// Set post-processing stages applied to every job in the run.
    pub fn post_processing(mut self, post: PostProcessing) -> Self {
        self.post = post;
        self
    }

    pub fn jobs(&self) -> &[JobDescriptor] {
        &self.jobs
    }

    /// Execute the batch to completion and report every job's outcome.
    pub async fn execute(&self, client: &GeminiClient) -> BatchReport {
        self.execute_with_progress(client, |_, _, _| {}).await
    }

    /// Execute with a progress callback fired in completion order.
    ///
    /// Progress is advisory output only; it never affects the report's
    /// ordering or tallies.
    pub async fn execute_with_progress<P>(&self, client: &GeminiClient, on_progress: P) -> BatchReport
    where
        P: FnMut(usize, usize, &JobResult),
    {
        let start = Instant::now();
        tracing::debug!(
            jobs = self.jobs.len(),
            max_workers = self.max_workers,
            "starting batch"
        );

        let client = client.clone();
        let registry = Arc::clone(&self.registry);
        let post = self.post.clone();
        let run = move |job: JobDescriptor| {
            let client = client.clone();
            let registry = Arc::clone(&registry);
            let post = post.clone();
            async move { executor::run_job(&client, &registry, &job, &post).await }
        };

        let results = dispatch(self.jobs.clone(), self.max_workers, run, on_progress).await;
        BatchReport::from_results(results, start.elapsed().as_millis() as u64)
    }
}
