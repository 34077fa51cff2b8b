//! The render pipeline: producer, job queue, workers and completion waiter.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use admitdoc_render::Renderer;

use crate::error::PipelineError;
use crate::store::StatusStore;
use crate::types::{RenderJob, RenderState, RenderStatus};

/// Completion events are advisory; a waiter that misses one falls back to
/// polling, so the channel stays small.
const COMPLETION_CHANNEL_CAPACITY: usize = 64;

/// Tunables for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of concurrent render workers.
    pub workers: usize,
    /// Bound on queued-but-unstarted jobs; a full queue fails the submit.
    pub queue_capacity: usize,
    /// Default ceiling on one `wait_for_completion` call.
    pub wait_timeout: Duration,
    /// Fallback re-read cadence while waiting.
    pub poll_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_capacity: 64,
            wait_timeout: Duration::from_secs(90),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// One shared render pipeline per process: the job queue, the status store,
/// the completion channel and the worker set behind a single constructible
/// handle. Producers, workers and waiters all go through here; there are no
/// module-level singletons.
pub struct RenderPipeline {
    store: StatusStore,
    /// `None` once the pipeline has been shut down.
    jobs_tx: Mutex<Option<mpsc::Sender<RenderJob>>>,
    completions: broadcast::Sender<Uuid>,
    config: PipelineConfig,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl RenderPipeline {
    /// Spawn the workers and return the running pipeline.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(renderer: Arc<dyn Renderer>, config: PipelineConfig) -> Self {
        let worker_count = config.workers.max(1);
        let (jobs_tx, jobs_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (completions, _) = broadcast::channel(COMPLETION_CHANNEL_CAPACITY);
        let store = StatusStore::new();
        let jobs_rx = Arc::new(tokio::sync::Mutex::new(jobs_rx));

        let mut handles = Vec::with_capacity(worker_count);
        for worker in 0..worker_count {
            handles.push(tokio::spawn(Self::worker_loop(
                worker,
                jobs_rx.clone(),
                store.clone(),
                completions.clone(),
                renderer.clone(),
            )));
        }

        info!(
            workers = worker_count,
            queue_capacity = config.queue_capacity,
            "render pipeline started"
        );

        Self {
            store,
            jobs_tx: Mutex::new(Some(jobs_tx)),
            completions,
            config,
            workers: Mutex::new(handles),
        }
    }

    /// Producer entry point, called whenever the underlying record is
    /// created or updated. Never blocks on rendering.
    ///
    /// The status is overwritten with `Generating` unconditionally: the
    /// record changed, so any previous artifact or error is stale. When the
    /// job cannot be handed to the queue the status becomes `Failed` with a
    /// diagnostic instead of dangling at `Generating` forever, and the
    /// failure is returned so the caller can apply its own retry policy.
    pub async fn submit(&self, id: Uuid) -> Result<(), PipelineError> {
        self.store.set(RenderStatus::generating(id)).await;

        let sender = { self.jobs_tx.lock().unwrap().clone() };
        let enqueue_result = match sender {
            Some(tx) => tx.try_send(RenderJob::new(id)).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => "render queue is full".to_string(),
                mpsc::error::TrySendError::Closed(_) => "render queue is closed".to_string(),
            }),
            None => Err("render pipeline is shut down".to_string()),
        };

        match enqueue_result {
            Ok(()) => {
                debug!(record_id = %id, "render job enqueued");
                Ok(())
            }
            Err(reason) => {
                warn!(record_id = %id, %reason, "failed to enqueue render job");
                self.store
                    .set(RenderStatus::failed(id, format!("enqueue failed: {reason}")))
                    .await;
                Err(PipelineError::EnqueueFailed(reason))
            }
        }
    }

    /// Block the caller until the job for `id` reaches a terminal state or
    /// `timeout` elapses.
    ///
    /// Dual-mode wait: a completion event gives low latency, the poll tick
    /// guarantees progress when an event is missed. Timing out abandons only
    /// this wait; the render keeps running and a later call may observe
    /// `Done`. All exit paths drop the subscription and the timer.
    pub async fn wait_for_completion(
        &self,
        id: Uuid,
        timeout: Duration,
    ) -> Result<Bytes, PipelineError> {
        // Subscribe before the first read so a completion landing between
        // the read and the first recv is not missed.
        let mut events = self.completions.subscribe();
        let mut events_open = true;
        let deadline = Instant::now() + timeout;
        let mut poll = tokio::time::interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if let Some(outcome) = Self::terminal_outcome(self.store.get(id).await) {
                return outcome;
            }
            if Instant::now() >= deadline {
                return Err(PipelineError::Timeout(timeout));
            }

            if events_open {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {
                        return Err(PipelineError::Timeout(timeout));
                    }
                    event = events.recv() => match event {
                        // Loop re-reads the store for matching and foreign
                        // ids alike; only the store is authoritative.
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(record_id = %id, skipped, "completion events lagged, re-reading store");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            events_open = false;
                        }
                    },
                    _ = poll.tick() => {}
                }
            } else {
                // Workers are gone; the poll fallback alone drives the wait.
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {
                        return Err(PipelineError::Timeout(timeout));
                    }
                    _ = poll.tick() => {}
                }
            }
        }
    }

    fn terminal_outcome(status: Option<RenderStatus>) -> Option<Result<Bytes, PipelineError>> {
        let status = status?;
        match status.state {
            RenderState::Done => match status.artifact {
                Some(bytes) => Some(Ok(bytes)),
                // done() always sets the artifact; a hole reads as failure
                // rather than an empty body.
                None => Some(Err(PipelineError::RenderFailed(
                    "completed status has no artifact".to_string(),
                ))),
            },
            RenderState::Failed => Some(Err(PipelineError::RenderFailed(
                status
                    .error
                    .unwrap_or_else(|| "unknown render failure".to_string()),
            ))),
            RenderState::Pending | RenderState::Generating => None,
        }
    }

    /// Current status for `id`.
    pub async fn status(&self, id: Uuid) -> Option<RenderStatus> {
        self.store.get(id).await
    }

    /// Lifecycle state for `id`; absence reads as `Pending`.
    pub async fn state_of(&self, id: Uuid) -> RenderState {
        self.store.state_of(id).await
    }

    /// The shared status store, for retention sweeps by the embedder.
    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of live completion subscriptions. Each in-flight wait holds
    /// exactly one.
    pub fn completion_subscribers(&self) -> usize {
        self.completions.receiver_count()
    }

    /// Close the queue and wait for the workers to drain. Jobs already
    /// queued still run; the status store stays readable. Subsequent
    /// `submit` calls report an enqueue failure.
    pub async fn shutdown(&self) {
        let closed = self.jobs_tx.lock().unwrap().take();
        drop(closed);

        let handles: Vec<JoinHandle<()>> = { self.workers.lock().unwrap().drain(..).collect() };
        for handle in handles {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    error!(%err, "render worker exited abnormally");
                }
            }
        }
        info!("render pipeline stopped");
    }

    async fn worker_loop(
        worker: usize,
        jobs_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<RenderJob>>>,
        store: StatusStore,
        completions: broadcast::Sender<Uuid>,
        renderer: Arc<dyn Renderer>,
    ) {
        debug!(worker, "render worker started");
        loop {
            // The lock is held only while idle on recv; it is released
            // before the render starts so other workers can pull jobs.
            let job = { jobs_rx.lock().await.recv().await };
            let Some(job) = job else { break };
            Self::process_job(worker, job, &store, &completions, renderer.as_ref()).await;
        }
        debug!(worker, "render worker stopped");
    }

    async fn process_job(
        worker: usize,
        job: RenderJob,
        store: &StatusStore,
        completions: &broadcast::Sender<Uuid>,
        renderer: &dyn Renderer,
    ) {
        let id = job.id;
        let started = Instant::now();
        debug!(worker, record_id = %id, "picked render job");

        let outcome = std::panic::AssertUnwindSafe(renderer.render(id))
            .catch_unwind()
            .await;

        let status = match outcome {
            Ok(Ok(bytes)) => {
                info!(
                    worker,
                    record_id = %id,
                    bytes = bytes.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "render finished"
                );
                RenderStatus::done(id, bytes)
            }
            Ok(Err(err)) => {
                warn!(worker, record_id = %id, error = %err, "render failed");
                RenderStatus::failed(id, err.to_string())
            }
            Err(_) => {
                error!(worker, record_id = %id, "renderer panicked");
                RenderStatus::failed(id, "renderer panicked")
            }
        };

        store.set(status).await;
        // Completion fires for both outcomes so waiters are never starved.
        // No subscribers is fine; they fall back to polling.
        let _ = completions.send(id);
    }
}
