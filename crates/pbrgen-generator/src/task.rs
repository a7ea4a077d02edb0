//! Dependency tasks and the shared task board.
//!
//! Each pipeline run wraps its operator invocations in
//! [`DependencyTask`]s tracked on a [`TaskBoard`]: a mutex-guarded
//! state vector with a condition variable. Downstream tasks block on
//! [`TaskBoard::wait_done`] until every upstream task reports `Done`;
//! cancelling the board wakes every waiter, so no task is ever left
//! blocked on an upstream that will never finish. There is no polling
//! loop anywhere -- waits are genuine condvar blocks.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::GenerateError;

/// Index of a task within one run's task graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub(crate) usize);

/// Lifecycle state of a dependency task. Transitions only move
/// forward: `Pending -> Running -> Done`, or to `Aborted` from either
/// live state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Created, upstream dependencies not yet satisfied.
    Pending,
    /// Operator currently executing.
    Running,
    /// Output published; downstream tasks may read it.
    Done,
    /// Abandoned due to cancellation or an upstream failure.
    Aborted,
}

/// A unit of work in the task graph: one or more operator invocations
/// gated on upstream task completion.
pub struct DependencyTask {
    pub(crate) id: TaskId,
    pub(crate) name: &'static str,
    pub(crate) deps: Vec<TaskId>,
    pub(crate) job: Job,
}

pub(crate) type Job = Box<dyn FnOnce() -> Result<(), GenerateError> + Send + 'static>;

impl DependencyTask {
    pub(crate) fn new(id: TaskId, name: &'static str, deps: Vec<TaskId>, job: Job) -> Self {
        Self {
            id,
            name,
            deps,
            job,
        }
    }

    /// Task name, used for logging and diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Upstream tasks this task blocks on.
    #[must_use]
    pub fn dependencies(&self) -> &[TaskId] {
        &self.deps
    }
}

struct BoardState {
    states: Vec<TaskState>,
    cancelled: bool,
}

/// Shared completion board for one run's tasks.
pub struct TaskBoard {
    state: Mutex<BoardState>,
    cond: Condvar,
}

impl TaskBoard {
    /// Create a board tracking `task_count` tasks, all `Pending`.
    #[must_use]
    pub fn new(task_count: usize) -> Self {
        Self {
            state: Mutex::new(BoardState {
                states: vec![TaskState::Pending; task_count],
                cancelled: false,
            }),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        // A poisoned board means a task panicked while holding the
        // lock; the state vector is still plain data, so recover it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move a task to `Running` unless the run is cancelled.
    ///
    /// Returns `false` when the run is cancelled and the task should
    /// not start.
    pub fn mark_running(&self, id: TaskId) -> bool {
        let mut state = self.lock();
        if state.cancelled {
            return false;
        }
        state.states[id.0] = TaskState::Running;
        true
    }

    /// Publish a task's completion and wake all waiters.
    pub fn mark_done(&self, id: TaskId) {
        let mut state = self.lock();
        state.states[id.0] = TaskState::Done;
        drop(state);
        self.cond.notify_all();
    }

    /// Record a task as abandoned and wake all waiters, so nothing
    /// blocks on a task that will never finish.
    pub fn mark_aborted(&self, id: TaskId) {
        let mut state = self.lock();
        state.states[id.0] = TaskState::Aborted;
        drop(state);
        self.cond.notify_all();
    }

    /// Cooperatively cancel the run: every current and future wait
    /// returns [`GenerateError::Cancelled`].
    pub fn cancel(&self) {
        let mut state = self.lock();
        state.cancelled = true;
        drop(state);
        self.cond.notify_all();
    }

    /// Whether the run has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// Current state of a task.
    #[must_use]
    pub fn state(&self, id: TaskId) -> TaskState {
        self.lock().states[id.0]
    }

    /// Number of tasks that have reached `Done`.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.lock()
            .states
            .iter()
            .filter(|&&s| s == TaskState::Done)
            .count()
    }

    /// Block until every listed task is `Done`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Cancelled`] if the run is cancelled or
    /// any listed task aborts while waiting.
    pub fn wait_done(&self, deps: &[TaskId]) -> Result<(), GenerateError> {
        let mut state = self.lock();
        loop {
            if state.cancelled {
                return Err(GenerateError::Cancelled);
            }
            if deps
                .iter()
                .any(|id| state.states[id.0] == TaskState::Aborted)
            {
                return Err(GenerateError::Cancelled);
            }
            if deps.iter().all(|id| state.states[id.0] == TaskState::Done) {
                return Ok(());
            }
            state = self
                .cond
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until every task on the board is `Done`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Cancelled`] if the run is cancelled or
    /// any task aborts.
    pub fn wait_all_done(&self) -> Result<(), GenerateError> {
        let mut state = self.lock();
        loop {
            if state.cancelled {
                return Err(GenerateError::Cancelled);
            }
            if state.states.iter().any(|&s| s == TaskState::Aborted) {
                return Err(GenerateError::Cancelled);
            }
            if state.states.iter().all(|&s| s == TaskState::Done) {
                return Ok(());
            }
            state = self
                .cond
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn tasks_start_pending() {
        let board = TaskBoard::new(3);
        for i in 0..3 {
            assert_eq!(board.state(TaskId(i)), TaskState::Pending);
        }
        assert_eq!(board.completed(), 0);
    }

    #[test]
    fn wait_done_returns_when_dependencies_complete() {
        let board = Arc::new(TaskBoard::new(2));
        let waiter_board = Arc::clone(&board);
        let waiter = thread::spawn(move || waiter_board.wait_done(&[TaskId(0), TaskId(1)]));

        // Complete both tasks from this thread; the waiter must return Ok.
        thread::sleep(Duration::from_millis(10));
        board.mark_done(TaskId(0));
        thread::sleep(Duration::from_millis(10));
        board.mark_done(TaskId(1));

        let result = waiter.join().unwrap_or(Err(GenerateError::Internal("join")));
        assert!(result.is_ok(), "waiter should see both tasks done");
    }

    #[test]
    fn wait_done_with_satisfied_deps_returns_immediately() {
        let board = TaskBoard::new(1);
        board.mark_done(TaskId(0));
        assert!(board.wait_done(&[TaskId(0)]).is_ok());
    }

    #[test]
    fn cancel_wakes_blocked_waiters() {
        let board = Arc::new(TaskBoard::new(1));
        let waiter_board = Arc::clone(&board);
        // Task 0 will never complete; only cancellation can release this.
        let waiter = thread::spawn(move || waiter_board.wait_done(&[TaskId(0)]));

        thread::sleep(Duration::from_millis(10));
        board.cancel();

        let result = waiter.join().unwrap_or(Ok(()));
        assert!(
            matches!(result, Err(GenerateError::Cancelled)),
            "cancellation must release the waiter with Cancelled",
        );
    }

    #[test]
    fn aborted_dependency_releases_waiters() {
        let board = Arc::new(TaskBoard::new(2));
        let waiter_board = Arc::clone(&board);
        let waiter = thread::spawn(move || waiter_board.wait_done(&[TaskId(0)]));

        thread::sleep(Duration::from_millis(10));
        board.mark_aborted(TaskId(0));

        let result = waiter.join().unwrap_or(Ok(()));
        assert!(matches!(result, Err(GenerateError::Cancelled)));
    }

    #[test]
    fn mark_running_refuses_after_cancel() {
        let board = TaskBoard::new(1);
        board.cancel();
        assert!(!board.mark_running(TaskId(0)));
        assert!(board.is_cancelled());
    }

    #[test]
    fn completed_counts_only_done_tasks() {
        let board = TaskBoard::new(4);
        board.mark_done(TaskId(0));
        board.mark_done(TaskId(2));
        board.mark_aborted(TaskId(3));
        assert_eq!(board.completed(), 2);
    }

    #[test]
    fn wait_all_done_sees_full_board() {
        let board = TaskBoard::new(3);
        for i in 0..3 {
            board.mark_done(TaskId(i));
        }
        assert!(board.wait_all_done().is_ok());
    }
}
