//! Next-cycle task queue for the UI thread.
//!
//! Overlay components often cannot finish an operation in the same UI cycle
//! that starts it: content must be mounted before it can be measured, and a
//! measurement result arrives one round-trip later. [`UiDispatcher`] models
//! that cooperative scheduling. Tasks posted during a cycle run in the *next*
//! cycle, never in the one currently draining, so a chain of continuations
//! advances exactly one step per [`run_cycle`](UiDispatcher::run_cycle).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::logging::{span_names, targets};

/// A unique identifier for a posted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

type BoxedTask = Box<dyn FnOnce() + Send + 'static>;

struct TaskData {
    id: TaskId,
    task: BoxedTask,
}

/// The task queue of the logical UI thread.
///
/// The queue lock is never held while a task runs, so tasks may post further
/// tasks or cancel pending ones.
pub struct UiDispatcher {
    tasks: Mutex<VecDeque<TaskData>>,
}

impl UiDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    /// Post a task to run on the next UI cycle.
    pub fn post<F>(&self, task: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = next_task_id();
        self.tasks.lock().push_back(TaskData {
            id,
            task: Box::new(task),
        });
        tracing::trace!(target: targets::DISPATCHER, task = id.as_u64(), "task posted");
        id
    }

    /// Cancel a pending task.
    ///
    /// Returns `true` if the task was found and cancelled.
    pub fn cancel(&self, id: TaskId) -> bool {
        let mut tasks = self.tasks.lock();
        if let Some(pos) = tasks.iter().position(|t| t.id == id) {
            tasks.remove(pos);
            true
        } else {
            false
        }
    }

    /// Check if there are any pending tasks.
    pub fn has_pending(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    /// Get the number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Run one UI cycle: every task that was pending when the cycle began.
    ///
    /// Returns the number of tasks executed.
    pub fn run_cycle(&self) -> usize {
        let batch: Vec<TaskData> = self.tasks.lock().drain(..).collect();
        let count = batch.len();
        let _span = tracing::trace_span!(target: targets::DISPATCHER, span_names::DISPATCH, count).entered();
        for task_data in batch {
            (task_data.task)();
        }
        if count > 0 {
            tracing::trace!(target: targets::DISPATCHER, count, "ui cycle processed");
        }
        count
    }

    /// Run cycles until the queue is empty or `max_cycles` have run.
    ///
    /// Returns the number of cycles that executed at least one task.
    pub fn run_until_idle(&self, max_cycles: usize) -> usize {
        let mut cycles = 0;
        while cycles < max_cycles && self.run_cycle() > 0 {
            cycles += 1;
        }
        cycles
    }
}

impl Default for UiDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UiDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiDispatcher")
            .field("pending", &self.pending_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(UiDispatcher: Send, Sync);
