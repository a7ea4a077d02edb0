//! Run orchestration: spawning the task graph, tracking progress,
//! and swapping the finished variants into the shared cache.
//!
//! Every task runs on its own thread and blocks on the board until
//! its dependencies publish. A coordinator thread waits for the full
//! board, assembles the [`VariantCache`], and installs it atomically.
//! Cancellation is cooperative: [`RunHandle::abort`] flips the
//! board's cancel flag and workers bail out at their next check, so
//! no thread is ever killed mid-write.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread;
use std::time::Instant;

use pbrgen_pipeline::{PixelBuffer, Rgb, RgbBuffer};

use crate::cache::{Channel, GenerationSettings, VariantCache};
use crate::diagnostics::{DiagnosticsRecorder, RunDiagnostics};
use crate::error::GenerateError;
use crate::graph::{self, TASK_COUNT};
use crate::task::{DependencyTask, TaskBoard};

/// Completion callback invoked once when a run's cache is installed.
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// Where a run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Tasks are still executing.
    Running,
    /// All tasks finished and the cache was swapped in.
    Done,
    /// The run was aborted, or a task failed; no cache was installed.
    Cancelled,
}

/// Snapshot of how many tasks a run has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Tasks that have published their output.
    pub completed: usize,
    /// Total tasks in the run.
    pub total: usize,
}

impl Progress {
    /// Completed fraction in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f32 / self.total as f32
    }
}

struct CompletionState {
    status: RunStatus,
    callback: Option<CompletionCallback>,
    diagnostics: Option<RunDiagnostics>,
}

struct RunShared {
    board: Arc<TaskBoard>,
    recorder: DiagnosticsRecorder,
    completion: Mutex<CompletionState>,
    finished: Condvar,
}

impl RunShared {
    fn new(board: Arc<TaskBoard>) -> Self {
        Self {
            board,
            recorder: DiagnosticsRecorder::new(),
            completion: Mutex::new(CompletionState {
                status: RunStatus::Running,
                callback: None,
                diagnostics: None,
            }),
            finished: Condvar::new(),
        }
    }

    fn lock_completion(&self) -> MutexGuard<'_, CompletionState> {
        self.completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to one in-flight or finished generation run.
///
/// Cheap to clone; all clones observe the same run.
#[derive(Clone)]
pub struct RunHandle {
    shared: Arc<RunShared>,
}

impl RunHandle {
    /// Current task completion counts.
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.shared.board.completed(),
            total: TASK_COUNT,
        }
    }

    /// Current run status.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        self.shared.lock_completion().status
    }

    /// Request cooperative cancellation.
    ///
    /// Safe to call at any time and from any thread. A run that has
    /// already finished is unaffected; its cache stays installed. Any
    /// registered completion callback is dropped without firing.
    pub fn abort(&self) {
        let mut completion = self.shared.lock_completion();
        if completion.status != RunStatus::Running {
            return;
        }
        completion.status = RunStatus::Cancelled;
        completion.callback = None;
        self.shared.board.cancel();
        self.shared.finished.notify_all();
        log::info!("generation run aborted");
    }

    /// Block until the run finishes or is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Cancelled`] if the run was aborted or
    /// a task failed.
    pub fn wait(&self) -> Result<(), GenerateError> {
        let mut completion = self.shared.lock_completion();
        loop {
            match completion.status {
                RunStatus::Running => {
                    completion = self
                        .shared
                        .finished
                        .wait(completion)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                RunStatus::Done => return Ok(()),
                RunStatus::Cancelled => return Err(GenerateError::Cancelled),
            }
        }
    }

    /// Register a callback fired once, after the cache swap.
    ///
    /// If the run already finished the callback fires immediately on
    /// the calling thread. A cancelled run never fires it. A second
    /// registration replaces a pending one.
    pub fn on_complete(&self, callback: CompletionCallback) {
        let mut completion = self.shared.lock_completion();
        match completion.status {
            RunStatus::Running => completion.callback = Some(callback),
            RunStatus::Done => {
                drop(completion);
                callback();
            }
            RunStatus::Cancelled => {}
        }
    }

    /// Per-task timing for a finished run. `None` while running or
    /// after cancellation.
    #[must_use]
    pub fn diagnostics(&self) -> Option<RunDiagnostics> {
        self.shared.lock_completion().diagnostics.clone()
    }
}

/// Owns the variant cache and launches generation runs against it.
///
/// Starting a new run aborts the previous one; the cache keeps
/// serving the last completed run's variants until the new run
/// finishes and swaps its own in.
pub struct Generator {
    cache: Arc<RwLock<Option<Arc<VariantCache>>>>,
    current: Mutex<Option<RunHandle>>,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Arc::new(RwLock::new(None)),
            current: Mutex::new(None),
        }
    }

    /// Start a generation run over raw linear RGB pixels in row-major
    /// order. Returns immediately; the work happens on background
    /// threads.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Pipeline`] if `pixels` does not match
    /// `width * height`, or [`GenerateError::Internal`] if the task
    /// graph fails its wiring check.
    pub fn begin_generation(
        &self,
        pixels: Vec<Rgb>,
        width: u32,
        height: u32,
    ) -> Result<RunHandle, GenerateError> {
        let raw = Arc::new(RgbBuffer::from_raw(width, height, pixels)?);

        let mut current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            previous.abort();
        }

        let board = Arc::new(TaskBoard::new(TASK_COUNT));
        let built = graph::build(&raw, &board);
        graph::verify_acyclic(&built.tasks)?;

        log::info!("starting generation run: {width}x{height}, {TASK_COUNT} tasks");
        let shared = Arc::new(RunShared::new(Arc::clone(&board)));

        for task in built.tasks {
            let worker_shared = Arc::clone(&shared);
            thread::spawn(move || run_task(task, &worker_shared));
        }

        let coordinator_shared = Arc::clone(&shared);
        let cache_slot = Arc::clone(&self.cache);
        let outputs = built.outputs;
        thread::spawn(move || {
            let result = coordinator_shared
                .board
                .wait_all_done()
                .and_then(|()| VariantCache::from_outputs(&outputs));
            match result {
                Ok(cache) => install_cache(&coordinator_shared, &cache_slot, Arc::new(cache)),
                Err(err) => {
                    log::info!("generation run ended without install: {err}");
                    let mut completion = coordinator_shared.lock_completion();
                    if completion.status == RunStatus::Running {
                        completion.status = RunStatus::Cancelled;
                        completion.callback = None;
                    }
                    drop(completion);
                    coordinator_shared.finished.notify_all();
                }
            }
        });

        let handle = RunHandle { shared };
        *current = Some(handle.clone());
        Ok(handle)
    }

    /// Blend one channel from the most recently completed run.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::NoDataYet`] if no run has completed.
    pub fn get_channel(
        &self,
        channel: Channel,
        settings: &GenerationSettings,
    ) -> Result<PixelBuffer, GenerateError> {
        let cache = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
            .ok_or(GenerateError::NoDataYet)?;
        cache.get_channel(channel, settings)
    }

    /// Snapshot of the current cache, if any run has completed.
    #[must_use]
    pub fn cache(&self) -> Option<Arc<VariantCache>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }

    /// Abort the most recently started run, if any. An installed
    /// cache is unaffected.
    pub fn abort(&self) {
        if let Some(run) = self.current_run() {
            run.abort();
        }
    }

    /// Handle to the most recently started run.
    #[must_use]
    pub fn current_run(&self) -> Option<RunHandle> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Worker body: wait for dependencies, execute, publish the state
/// transition. Aborts propagate through the board so downstream
/// waiters wake instead of parking forever.
fn run_task(task: DependencyTask, shared: &RunShared) {
    let board = &shared.board;
    if board.wait_done(task.dependencies()).is_err() || !board.mark_running(task.id) {
        board.mark_aborted(task.id);
        return;
    }
    let name = task.name();
    let started = Instant::now();
    match (task.job)() {
        Ok(()) => {
            shared.recorder.record(name, started, Instant::now());
            log::debug!("task {name} done");
            board.mark_done(task.id);
        }
        Err(GenerateError::Cancelled) => {
            log::debug!("task {name} cancelled");
            board.mark_aborted(task.id);
        }
        Err(err) => {
            log::error!("task {name} failed: {err}");
            board.cancel();
            board.mark_aborted(task.id);
        }
    }
}

/// Swap the finished cache in, unless an abort won the race.
///
/// The status check and the cache write share the completion lock, so
/// an abort observed as `Cancelled` here can never leave a stale
/// cache installed afterwards.
fn install_cache(
    shared: &RunShared,
    slot: &RwLock<Option<Arc<VariantCache>>>,
    cache: Arc<VariantCache>,
) {
    let mut completion = shared.lock_completion();
    if completion.status != RunStatus::Running {
        return;
    }
    *slot.write().unwrap_or_else(PoisonError::into_inner) = Some(cache);
    completion.status = RunStatus::Done;
    completion.diagnostics = Some(shared.recorder.finish());
    let callback = completion.callback.take();
    drop(completion);
    log::info!("generation run complete, cache installed");
    // Fire the callback before waking waiters, so anyone blocked in
    // `wait` observes its effects.
    if let Some(callback) = callback {
        callback();
    }
    shared.finished.notify_all();
}
