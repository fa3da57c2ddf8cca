//! Background analysis worker.
//!
//! Layout and analytics on large graphs take long enough to stall an
//! interactive caller, so they can be pushed to a dedicated thread. The
//! caller never blocks:
//!
//! - `submit()` stores the request in a single "latest" slot and pokes the
//!   worker through a bounded(1) crossbeam channel with `try_send`
//! - every request gets a generation from an `AtomicU64`; a newer submit
//!   overwrites an older request that has not started yet
//! - a result whose generation is no longer the newest is discarded when it
//!   finishes (last request wins)
//! - published results go to a bounded results channel; when the caller
//!   does not drain it, results are dropped and counted, never blocking
//!
//! ```ignore
//! let worker = AnalysisWorker::spawn(EngineConfig::default())?;
//! let generation = worker.submit(engine.request(&filters))?;
//! if let Some(result) = worker.recv_timeout(Duration::from_secs(1)) {
//!     render(result.view);
//! }
//! ```

use crate::config::{EngineConfig, LayoutSettings};
use crate::engine::{build_view, GraphView};
use crate::error::GraphError;
use crate::filter::GraphFilters;
use crate::layout::LayoutEngine;
use crate::model::{GraphData, Position};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Snapshot of everything one pipeline run needs.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub graph: Arc<GraphData>,
    pub filters: GraphFilters,
    pub layout: LayoutSettings,
    /// Drag pins to honour
    pub pins: BTreeMap<String, Position>,
}

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Generation of the request that produced this result
    pub generation: u64,
    pub view: GraphView,
    pub elapsed: Duration,
}

/// Worker counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Results published
    pub completed: u64,
    /// Requests skipped or results discarded because a newer one arrived
    pub superseded: u64,
    /// Results dropped because the results channel was full
    pub dropped: u64,
}

struct Shared {
    generation: AtomicU64,
    stopped: AtomicBool,
    pending: Mutex<Option<(u64, AnalysisRequest)>>,
    latest: Mutex<Option<AnalysisResult>>,
    completed: AtomicU64,
    superseded: AtomicU64,
    dropped: AtomicU64,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }
}

/// A poisoned lock only means a pipeline run panicked; the slot is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the background thread. Dropping it shuts the thread down.
pub struct AnalysisWorker {
    shared: Arc<Shared>,
    wake: Sender<()>,
    results: Receiver<AnalysisResult>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for AnalysisWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisWorker")
            .field("generation", &self.generation())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl AnalysisWorker {
    /// Start a worker using the built-in force simulation.
    pub fn spawn(config: EngineConfig) -> Result<Self, GraphError> {
        Self::spawn_with_layout(config, LayoutEngine::new())
    }

    /// Start a worker with a preconfigured layout engine (custom physics).
    pub fn spawn_with_layout(config: EngineConfig, layout: LayoutEngine) -> Result<Self, GraphError> {
        config.validate()?;
        let shared = Arc::new(Shared {
            generation: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
            pending: Mutex::new(None),
            latest: Mutex::new(None),
            completed: AtomicU64::new(0),
            superseded: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        });
        let (wake_tx, wake_rx) = bounded(1);
        let (result_tx, result_rx) = bounded(config.worker.result_buffer);

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name(config.worker.thread_name.clone())
            .spawn(move || run(thread_shared, config, layout, wake_rx, result_tx))?;

        Ok(Self {
            shared,
            wake: wake_tx,
            results: result_rx,
            handle: Some(handle),
        })
    }

    /// Queue a request. Returns its generation. Never blocks.
    pub fn submit(&self, request: AnalysisRequest) -> Result<u64, GraphError> {
        if self.shared.stopped.load(Ordering::Acquire) {
            return Err(GraphError::WorkerStopped);
        }
        let generation = {
            let mut pending = lock(&self.shared.pending);
            let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
            if pending.replace((generation, request)).is_some() {
                self.shared.superseded.fetch_add(1, Ordering::Relaxed);
            }
            generation
        };

        match self.wake.try_send(()) {
            // Full: a wake-up is already queued and will see the new slot
            Ok(()) | Err(TrySendError::Full(())) => Ok(generation),
            Err(TrySendError::Disconnected(())) => Err(GraphError::WorkerStopped),
        }
    }

    /// Invalidate the pending and in-flight requests.
    pub fn cancel(&self) {
        let mut pending = lock(&self.shared.pending);
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        if pending.take().is_some() {
            self.shared.superseded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Newest generation handed out.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    /// Most recent published result, if any.
    pub fn latest(&self) -> Option<AnalysisResult> {
        lock(&self.shared.latest).clone()
    }

    /// Wait for the next published result.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<AnalysisResult> {
        match self.results.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Next published result without waiting.
    pub fn try_recv(&self) -> Option<AnalysisResult> {
        self.results.try_recv().ok()
    }

    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            completed: self.shared.completed.load(Ordering::Relaxed),
            superseded: self.shared.superseded.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
        }
    }

    /// Stop the thread and wait for it. Later `submit` calls fail.
    pub fn shutdown(&mut self) {
        if self.shared.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.wake.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("analysis worker panicked");
            }
        }
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(
    shared: Arc<Shared>,
    mut config: EngineConfig,
    mut layout: LayoutEngine,
    wake: Receiver<()>,
    results: Sender<AnalysisResult>,
) {
    tracing::info!("analysis worker started");
    while wake.recv().is_ok() {
        if shared.stopped.load(Ordering::Acquire) {
            break;
        }
        let Some((generation, request)) = lock(&shared.pending).take() else {
            continue;
        };
        if !shared.is_current(generation) {
            shared.superseded.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        let started = Instant::now();
        layout.clear_pins();
        for (id, pos) in &request.pins {
            layout.pin_node(id.as_str(), pos.x, pos.y);
        }
        config.layout = request.layout;
        let view = build_view(&request.graph, &request.filters, &config, &layout);
        let elapsed = started.elapsed();

        if !shared.is_current(generation) {
            tracing::debug!(generation, "discarding superseded analysis result");
            shared.superseded.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        let result = AnalysisResult {
            generation,
            view,
            elapsed,
        };
        *lock(&shared.latest) = Some(result.clone());
        shared.completed.fetch_add(1, Ordering::Relaxed);
        match results.try_send(result) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                shared.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
        tracing::debug!(generation, elapsed_ms = elapsed.as_millis() as u64, "analysis published");
    }
    tracing::info!("analysis worker stopped");
}
