//! The agent reporting pipeline: poller → flusher → bounded job queue →
//! worker pool, coordinated by a single cancellation token.
//!
//! Stage ownership: the poller exclusively produces readings, the flusher
//! exclusively owns the accumulation buffer between flush points, workers
//! only pull from the job queue. Transport failures are reported on the
//! error channel and never halt the pipeline.

use crate::updater::{UpdateError, Updater};
use pulsemon_collector::Collector;
use pulsemon_common::Metric;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Capacity of the poller's output channel; sized to absorb at least one
/// full poll burst without blocking.
const POLL_CHANNEL_CAPACITY: usize = 128;
/// Bounded job queue between the flusher and the worker pool.
const JOB_QUEUE_CAPACITY: usize = 128;
/// Error channel between workers and the supervisor.
const ERROR_CHANNEL_CAPACITY: usize = 128;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("pipeline: invalid configuration: {0}")]
    InvalidConfig(String),

    /// The post-cancellation drain exceeded its bound; `pending` readings
    /// were still sitting in the job queue when the pipeline gave up.
    #[error("pipeline: drain timed out; {pending} readings still queued")]
    DrainTimedOut { pending: usize },
}

/// Summary of a completed run, reported after a clean drain.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Transport errors reported by workers; each failed reading was
    /// dropped, not requeued.
    pub send_failures: u64,
    /// Workers that panicked and were converted into reported errors.
    pub worker_panics: u64,
}

pub struct Pipeline {
    collectors: Vec<Box<dyn Collector>>,
    updater: Arc<dyn Updater>,
    poll_interval: Duration,
    report_interval: Duration,
    worker_count: usize,
    drain_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        collectors: Vec<Box<dyn Collector>>,
        updater: Arc<dyn Updater>,
        poll_interval: Duration,
        report_interval: Duration,
        worker_count: usize,
        drain_timeout: Duration,
    ) -> Result<Self, PipelineError> {
        if poll_interval.is_zero() {
            return Err(PipelineError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if report_interval.is_zero() {
            return Err(PipelineError::InvalidConfig(
                "report interval must be greater than zero".to_string(),
            ));
        }
        if worker_count == 0 {
            return Err(PipelineError::InvalidConfig(
                "worker count must be greater than zero".to_string(),
            ));
        }
        if drain_timeout.is_zero() {
            return Err(PipelineError::InvalidConfig(
                "drain timeout must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            collectors,
            updater,
            poll_interval,
            report_interval,
            worker_count,
            drain_timeout,
        })
    }

    /// Runs the pipeline until `cancel` fires, then drains: final flush,
    /// queue drain, worker join. Buffered readings are never dropped on a
    /// clean shutdown; the drain phase as a whole is bounded by the
    /// configured drain timeout.
    pub async fn run(self, cancel: CancellationToken) -> Result<PipelineReport, PipelineError> {
        let (metric_tx, metric_rx) = mpsc::channel::<Metric>(POLL_CHANNEL_CAPACITY);
        let (job_tx, job_rx) = flume::bounded::<Metric>(JOB_QUEUE_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel::<UpdateError>(ERROR_CHANNEL_CAPACITY);

        let mut poller = tokio::spawn(poll_loop(
            self.collectors,
            self.poll_interval,
            metric_tx,
            cancel.clone(),
        ));
        let mut flusher = tokio::spawn(flush_loop(
            metric_rx,
            self.report_interval,
            job_tx,
            cancel.clone(),
        ));

        let mut workers = JoinSet::new();
        for id in 0..self.worker_count {
            workers.spawn(worker_loop(
                id,
                job_rx.clone(),
                self.updater.clone(),
                error_tx.clone(),
            ));
        }
        drop(error_tx);

        let mut supervisor = tokio::spawn(supervise_errors(error_rx));

        // Wait for the root signal, or for the error channel to close (which
        // means every worker has already exited, e.g. all of them panicked).
        let mut early_failures: Option<u64> = None;
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("pipeline: cancellation received, draining");
            }
            joined = &mut supervisor => {
                tracing::warn!("pipeline: error channel closed before cancellation, shutting down");
                early_failures = Some(joined.unwrap_or(0));
                cancel.cancel();
            }
        }

        let mut report = PipelineReport::default();
        let drained = tokio::time::timeout(self.drain_timeout, async {
            if let Err(err) = (&mut poller).await {
                if err.is_panic() {
                    tracing::error!("pipeline: poller panicked");
                }
            }
            if let Err(err) = (&mut flusher).await {
                if err.is_panic() {
                    tracing::error!("pipeline: flusher panicked");
                }
            }
            while let Some(joined) = workers.join_next().await {
                if let Err(err) = joined {
                    if err.is_panic() {
                        report.worker_panics += 1;
                        tracing::error!("pipeline: worker panicked, converted to reported error");
                    }
                }
            }
            report.send_failures = match early_failures {
                Some(failures) => failures,
                None => (&mut supervisor).await.unwrap_or(0),
            };
        })
        .await;

        match drained {
            Ok(()) => {
                tracing::info!(
                    send_failures = report.send_failures,
                    worker_panics = report.worker_panics,
                    "pipeline: drain complete"
                );
                Ok(report)
            }
            Err(_) => {
                let pending = job_rx.len();
                poller.abort();
                flusher.abort();
                workers.abort_all();
                supervisor.abort();
                Err(PipelineError::DrainTimedOut { pending })
            }
        }
    }
}

/// Invokes every collector in order on each tick and forwards readings one
/// at a time. Closes its output (by dropping the sender) once cancellation
/// is observed; a burst already in progress is completed first.
async fn poll_loop(
    mut collectors: Vec<Box<dyn Collector>>,
    poll_interval: Duration,
    out: mpsc::Sender<Metric>,
    cancel: CancellationToken,
) {
    let mut tick = tokio::time::interval(poll_interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("poller: cancellation observed, closing output");
                return;
            }
            _ = tick.tick() => {
                for collector in collectors.iter_mut() {
                    let readings = collector.collect();
                    tracing::debug!(
                        collector = collector.name(),
                        count = readings.len(),
                        "poller: collected readings"
                    );
                    for metric in readings {
                        if out.send(metric).await.is_err() {
                            tracing::debug!("poller: downstream closed, exiting");
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Accumulates readings and flushes them into the job queue on every report
/// tick, on input close, and on cancellation. Dropping the queue sender at
/// the end closes the queue so workers can drain and exit.
async fn flush_loop(
    mut input: mpsc::Receiver<Metric>,
    report_interval: Duration,
    jobs: flume::Sender<Metric>,
    cancel: CancellationToken,
) {
    let mut tick = tokio::time::interval(report_interval);
    // the first tick of a tokio interval resolves immediately
    tick.tick().await;

    let mut buffer: Vec<Metric> = Vec::new();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("flusher: cancellation observed, performing final flush");
                final_flush(&mut buffer, &jobs).await;
                return;
            }
            received = input.recv() => match received {
                Some(metric) => buffer.push(metric),
                None => {
                    tracing::debug!("flusher: input closed, performing final flush");
                    final_flush(&mut buffer, &jobs).await;
                    return;
                }
            },
            _ = tick.tick() => {
                flush(&mut buffer, &jobs, &cancel).await;
            }
        }
    }
}

/// Periodic flush. Every push races the cancellation token: if cancellation
/// lands mid-flush the readings not yet pushed stay in the buffer, and the
/// final flush delivers them.
async fn flush(buffer: &mut Vec<Metric>, jobs: &flume::Sender<Metric>, cancel: &CancellationToken) {
    if buffer.is_empty() {
        tracing::debug!("flusher: nothing to flush");
        return;
    }
    tracing::debug!(count = buffer.len(), "flusher: flushing buffer");

    let mut pushed = 0;
    while pushed < buffer.len() {
        let metric = buffer[pushed].clone();
        // biased: a push that completed must win over cancellation, or the
        // reading would stay buffered and be delivered twice
        tokio::select! {
            biased;
            sent = jobs.send_async(metric) => {
                if sent.is_err() {
                    tracing::warn!("flusher: job queue closed, dropping buffered readings");
                    buffer.clear();
                    return;
                }
                pushed += 1;
            }
            _ = cancel.cancelled() => {
                tracing::debug!(
                    remaining = buffer.len() - pushed,
                    "flusher: cancellation mid-flush, deferring remainder to final flush"
                );
                buffer.drain(..pushed);
                return;
            }
        }
    }
    buffer.clear();
}

/// Final flush on shutdown: pushes everything that is buffered, blocking on
/// the queue as needed. The pipeline-level drain timeout is the only bound.
async fn final_flush(buffer: &mut Vec<Metric>, jobs: &flume::Sender<Metric>) {
    if buffer.is_empty() {
        return;
    }
    tracing::info!(count = buffer.len(), "flusher: final flush");
    for metric in buffer.drain(..) {
        if jobs.send_async(metric).await.is_err() {
            tracing::warn!("flusher: job queue closed during final flush");
            return;
        }
    }
}

/// One pool member: pull a reading, send it, report any failure, repeat
/// until the queue is closed and drained.
async fn worker_loop(
    id: usize,
    jobs: flume::Receiver<Metric>,
    updater: Arc<dyn Updater>,
    errors: mpsc::Sender<UpdateError>,
) {
    tracing::debug!(worker = id, "worker: started");
    while let Ok(metric) = jobs.recv_async().await {
        let metric_id = metric.id();
        match updater.send(&metric).await {
            Ok(()) => {
                tracing::debug!(worker = id, metric = %metric_id, "worker: reading sent");
            }
            Err(err) => {
                tracing::warn!(
                    worker = id,
                    metric = %metric_id,
                    error = %err,
                    "worker: failed to send reading, dropping it"
                );
                // supervisor may already be gone during shutdown; keep
                // draining so the queue still empties
                let _ = errors.send(err).await;
            }
        }
    }
    tracing::debug!(worker = id, "worker: stopped");
}

/// Consumes the error channel until every worker has exited and dropped its
/// sender. Returns the number of reported transport failures.
async fn supervise_errors(mut errors: mpsc::Receiver<UpdateError>) -> u64 {
    let mut failures = 0u64;
    while let Some(err) = errors.recv().await {
        failures += 1;
        tracing::error!(error = %err, "pipeline: transport error reported, reading dropped");
    }
    failures
}
