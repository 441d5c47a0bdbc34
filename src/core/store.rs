//! In-memory task store shared by the HTTP surface and the download workers

use crate::core::task::{CompletedDownload, Task, TaskStatus};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Process-wide map from task ID to task state.
///
/// Clones share the same map. Every key has a single writer (its worker);
/// once a task is terminal, later writes are dropped.
#[derive(Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<BTreeMap<String, Task>>>,
    last_id_micros: Arc<AtomicI64>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a task ID from the current time, `"{seconds}.{micros}"`.
    ///
    /// Two IDs requested within the same microsecond are bumped apart, so IDs
    /// are unique for the lifetime of the store.
    pub fn next_id(&self) -> String {
        let now = Utc::now().timestamp_micros();
        let mut last = self.last_id_micros.load(Ordering::Relaxed);
        let micros = loop {
            let candidate = now.max(last + 1);
            match self.last_id_micros.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break candidate,
                Err(actual) => last = actual,
            }
        };
        format!("{}.{:06}", micros.div_euclid(1_000_000), micros.rem_euclid(1_000_000))
    }

    /// Create the task as downloading at 0%
    pub fn register(&self, task_id: &str) {
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        tasks.insert(task_id.to_string(), Task::new());
        debug!("Registered task {}", task_id);
    }

    /// Record download progress for a running task
    pub fn set_progress(&self, task_id: &str, percent: f64) {
        self.update(task_id, |task| task.progress = percent.clamp(0.0, 100.0));
    }

    /// Record the terminal success state
    pub fn complete(&self, task_id: &str, download: CompletedDownload) {
        self.update(task_id, |task| {
            task.status = TaskStatus::Completed;
            task.download = Some(download);
        });
    }

    /// Record the terminal failure state
    pub fn fail(&self, task_id: &str, message: impl Into<String>) {
        let message = message.into();
        self.update(task_id, |task| {
            task.status = TaskStatus::Error;
            task.error = Some(message);
        });
    }

    /// Snapshot of a task, `None` when the ID is unknown
    pub fn get(&self, task_id: &str) -> Option<Task> {
        let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        tasks.get(task_id).cloned()
    }

    /// All completed tasks, oldest first
    pub fn completed(&self) -> Vec<Task> {
        let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        tasks.values().filter(|t| t.is_completed()).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update(&self, task_id: &str, apply: impl FnOnce(&mut Task)) {
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        match tasks.get_mut(task_id) {
            Some(task) if task.is_terminal() => {
                warn!("Ignoring write to finished task {}", task_id);
            }
            Some(task) => apply(task),
            None => warn!("Ignoring write to unknown task {}", task_id),
        }
    }
}
