//! Per-trip worker tasks and their supervisor.
//!
//! Each trip runs as a supervisor task that spawns a worker task. The worker
//! owns the trip's input channel (behind an async mutex, so it outlives any
//! single worker), its reorder buffer and its [`TripState`]. After every
//! batch the worker stores a checkpoint, then publishes a snapshot on a
//! `watch` channel and to the optional sink. A panicking worker is respawned
//! from the last checkpoint until the restart budget runs out.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::TimeDelta;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex as AsyncMutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use waytrace_core::{
    ActualPosition, AnalysisSink, PlannedRoutePoint, TrajectoryAnalysis, TripId,
};

use crate::reorder::{Admission, ReorderBuffer};
use crate::{StreamConfig, StreamError, StreamMetrics, TripState};

/// Shortest idle wait between buffer flushes.
const MIN_IDLE: Duration = Duration::from_millis(10);

/// Result of [`TripHandle::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The sample is queued for the worker.
    Queued,
    /// The channel was full; the sample was discarded and counted.
    Dropped,
}

/// Everything a respawned worker needs to resume.
#[derive(Debug, Clone)]
struct Checkpoint {
    state: TripState,
    buffer: ReorderBuffer,
}

#[derive(Clone)]
struct WorkerContext {
    trip: TripId,
    input: Arc<AsyncMutex<mpsc::Receiver<ActualPosition>>>,
    checkpoint: Arc<Mutex<Checkpoint>>,
    snapshots: Arc<watch::Sender<Arc<TrajectoryAnalysis>>>,
    sink: Option<Arc<dyn AnalysisSink>>,
    metrics: StreamMetrics,
    cancel: CancellationToken,
    idle: Duration,
}

enum Next {
    Sample(ActualPosition),
    Idle,
    Stop,
}

impl WorkerContext {
    fn restore(&self) -> Checkpoint {
        self.checkpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Buffer a batch, applying whatever each arrival releases.
    fn admit(&self, checkpoint: &mut Checkpoint, batch: Vec<ActualPosition>) -> usize {
        let mut applied = 0;
        for sample in batch {
            let timestamp = sample.timestamp;
            match checkpoint.buffer.insert(sample) {
                Admission::Buffered => self.metrics.inc(&self.metrics.accepted_samples),
                Admission::Late => {
                    self.metrics.inc(&self.metrics.late_samples);
                    log::warn!("trip {}: discarded late sample at {timestamp}", self.trip);
                }
            }
            let ready = checkpoint.buffer.release();
            applied += self.apply(&mut checkpoint.state, &ready);
        }
        applied
    }

    fn apply(&self, state: &mut TripState, samples: &[ActualPosition]) -> usize {
        for sample in samples {
            if state.observe(sample) {
                self.metrics.inc(&self.metrics.full_scans);
            }
        }
        samples.len()
    }

    /// Store the checkpoint, then publish. A sink that panics here loses
    /// nothing: the respawned worker resumes from the stored checkpoint.
    fn commit(&self, checkpoint: &Checkpoint) -> Arc<TrajectoryAnalysis> {
        let analysis = Arc::new(checkpoint.state.snapshot());
        *self
            .checkpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = checkpoint.clone();
        self.snapshots.send_replace(Arc::clone(&analysis));
        self.metrics.inc(&self.metrics.snapshots_published);
        if let Some(sink) = &self.sink {
            sink.publish(&self.trip, &analysis);
        }
        analysis
    }
}

async fn run_worker(ctx: WorkerContext) -> Arc<TrajectoryAnalysis> {
    let mut checkpoint = ctx.restore();
    let mut input = Arc::clone(&ctx.input).lock_owned().await;
    log::debug!(
        "trip {}: worker resumed after {} samples",
        ctx.trip,
        checkpoint.state.sample_count()
    );

    loop {
        let next = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => Next::Stop,
            received = timeout(ctx.idle, input.recv()) => match received {
                Ok(Some(first)) => Next::Sample(first),
                Ok(None) => Next::Stop,
                Err(_) => Next::Idle,
            },
        };
        match next {
            Next::Sample(first) => {
                let mut batch = vec![first];
                while let Ok(sample) = input.try_recv() {
                    batch.push(sample);
                }
                if ctx.admit(&mut checkpoint, batch) > 0 {
                    ctx.commit(&checkpoint);
                }
            }
            Next::Idle if !checkpoint.buffer.is_empty() => {
                let ready = checkpoint.buffer.drain();
                ctx.apply(&mut checkpoint.state, &ready);
                ctx.commit(&checkpoint);
            }
            Next::Idle => {}
            Next::Stop => break,
        }
    }

    let ready = checkpoint.buffer.drain();
    ctx.apply(&mut checkpoint.state, &ready);
    if checkpoint.state.discard_open_stop() {
        log::debug!("trip {}: ended during a stop; open run discarded", ctx.trip);
    }
    ctx.commit(&checkpoint)
}

async fn supervise(
    ctx: WorkerContext,
    max_restarts: u32,
) -> Result<Arc<TrajectoryAnalysis>, StreamError> {
    let mut restarts = 0;
    loop {
        match tokio::spawn(run_worker(ctx.clone())).await {
            Ok(analysis) => {
                log::info!("trip {} finished", ctx.trip);
                return Ok(analysis);
            }
            Err(err) if err.is_panic() && restarts < max_restarts => {
                restarts += 1;
                ctx.metrics.inc(&ctx.metrics.worker_restarts);
                log::warn!(
                    "trip {}: worker panicked; restart {restarts} of {max_restarts}",
                    ctx.trip
                );
            }
            Err(err) => {
                log::error!("trip {}: worker abandoned: {err}", ctx.trip);
                return Err(StreamError::WorkerFailed { restarts });
            }
        }
    }
}

/// Control handle for one running trip.
///
/// Dropping the handle closes the trip's input; the worker then drains and
/// exits on its own.
pub struct TripHandle {
    trip: TripId,
    input: mpsc::Sender<ActualPosition>,
    snapshots: watch::Receiver<Arc<TrajectoryAnalysis>>,
    cancel: CancellationToken,
    supervisor: JoinHandle<Result<Arc<TrajectoryAnalysis>, StreamError>>,
    metrics: StreamMetrics,
}

impl fmt::Debug for TripHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TripHandle")
            .field("trip", &self.trip)
            .field("closed", &self.input.is_closed())
            .finish_non_exhaustive()
    }
}

impl TripHandle {
    /// Start a supervised worker for `trip`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(
        trip: TripId,
        planned: &[PlannedRoutePoint],
        config: &StreamConfig,
        sink: Option<Arc<dyn AnalysisSink>>,
        metrics: StreamMetrics,
    ) -> Self {
        let state = TripState::new(planned, config.analysis, config.search_window);
        let window = TimeDelta::from_std(config.reorder_window).unwrap_or(TimeDelta::MAX);
        let (input, receiver) = mpsc::channel(config.channel_capacity.max(1));
        let (publisher, snapshots) = watch::channel(Arc::new(state.snapshot()));
        let cancel = CancellationToken::new();

        let ctx = WorkerContext {
            trip: trip.clone(),
            input: Arc::new(AsyncMutex::new(receiver)),
            checkpoint: Arc::new(Mutex::new(Checkpoint {
                state,
                buffer: ReorderBuffer::new(window),
            })),
            snapshots: Arc::new(publisher),
            sink,
            metrics: metrics.clone(),
            cancel: cancel.clone(),
            idle: config.reorder_window.max(MIN_IDLE),
        };
        let supervisor = tokio::spawn(supervise(ctx, config.max_restarts));
        log::info!("trip {trip} started against {} waypoints", planned.len());

        Self {
            trip,
            input,
            snapshots,
            cancel,
            supervisor,
            metrics,
        }
    }

    /// The trip this handle controls.
    #[must_use]
    pub const fn trip(&self) -> &TripId {
        &self.trip
    }

    /// Queue a sample without waiting.
    ///
    /// # Errors
    /// [`StreamError::TripClosed`] once the worker has stopped reading.
    pub fn push(&self, sample: ActualPosition) -> Result<PushOutcome, StreamError> {
        match self.input.try_send(sample) {
            Ok(()) => Ok(PushOutcome::Queued),
            Err(TrySendError::Full(dropped)) => {
                self.metrics.inc(&self.metrics.dropped_samples);
                log::warn!(
                    "trip {}: channel full; dropped sample at {}",
                    self.trip,
                    dropped.timestamp
                );
                Ok(PushOutcome::Dropped)
            }
            Err(TrySendError::Closed(_)) => Err(StreamError::TripClosed(self.trip.clone())),
        }
    }

    /// Queue a sample, waiting for channel capacity instead of dropping.
    ///
    /// # Errors
    /// [`StreamError::TripClosed`] once the worker has stopped reading.
    pub async fn send(&self, sample: ActualPosition) -> Result<(), StreamError> {
        self.input
            .send(sample)
            .await
            .map_err(|_| StreamError::TripClosed(self.trip.clone()))
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn latest(&self) -> Arc<TrajectoryAnalysis> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// A receiver notified on every new snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<TrajectoryAnalysis>> {
        self.snapshots.clone()
    }

    /// Close the input, let the worker drain queued samples and return the
    /// final analysis.
    ///
    /// # Errors
    /// [`StreamError::WorkerFailed`] when the worker exhausted its restarts.
    pub async fn finish(self) -> Result<Arc<TrajectoryAnalysis>, StreamError> {
        let Self {
            trip,
            input,
            supervisor,
            ..
        } = self;
        drop(input);
        join(&trip, supervisor).await
    }

    /// Stop reading immediately, flush buffered samples and return the final
    /// analysis. Samples still queued in the channel are discarded.
    ///
    /// # Errors
    /// As for [`finish`](Self::finish).
    pub async fn cancel(self) -> Result<Arc<TrajectoryAnalysis>, StreamError> {
        self.cancel.cancel();
        let Self {
            trip,
            input,
            supervisor,
            ..
        } = self;
        drop(input);
        join(&trip, supervisor).await
    }
}

async fn join(
    trip: &TripId,
    supervisor: JoinHandle<Result<Arc<TrajectoryAnalysis>, StreamError>>,
) -> Result<Arc<TrajectoryAnalysis>, StreamError> {
    supervisor.await.unwrap_or_else(|err| {
        log::error!("trip {trip}: supervisor failed: {err}");
        Err(StreamError::WorkerFailed { restarts: 0 })
    })
}
