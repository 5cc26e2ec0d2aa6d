//! In-memory task registry
//!
//! Single source of truth for every task the depot has accepted. The map
//! keeps insertion order, so listings page through tasks in the order they
//! were requested. Critical sections are short synchronous field updates that
//! never cross an await point, which lets the synchronous transfer progress
//! callback write here directly.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{
    DepotStats, Priority, SourceRef, Task, TaskId, TaskPage, TaskStatus, TaskSummary,
};

/// Progress recorded the moment a task enters processing
pub const PROGRESS_STARTED: f64 = 0.1;

/// Progress recorded once media metadata has been resolved
pub const PROGRESS_RESOLVED: f64 = 0.2;

/// Shared in-memory store of download tasks
///
/// Terminal tasks (completed, failed, expired) are write-protected: any
/// attempt to update one is rejected with [`Error::InvalidTransition`]. The
/// single exception is [`TaskRegistry::invalidate_artifact`], which retires a
/// completed record whose file turned out to be unusable.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: RwLock<IndexMap<TaskId, Task>>,
}

impl TaskRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Every write section is a plain batch of field assignments, so a
    // poisoned lock still holds consistent records.
    fn read_guard(&self) -> RwLockReadGuard<'_, IndexMap<TaskId, Task>> {
        self.tasks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, IndexMap<TaskId, Task>> {
        self.tasks.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn writable<'a>(
        guard: &'a mut IndexMap<TaskId, Task>,
        id: TaskId,
        to: TaskStatus,
    ) -> Result<&'a mut Task> {
        let task = guard.get_mut(&id).ok_or(Error::NotFound { id })?;
        if task.status.is_terminal() {
            return Err(Error::InvalidTransition {
                id,
                from: task.status,
                to,
            });
        }
        Ok(task)
    }

    /// Register a new pending task and return its record
    pub fn create(&self, source: SourceRef, priority: Priority) -> Task {
        let task = Task::new(TaskId::new(), source, priority);
        debug!(task_id = %task.id, source = %source, priority = %priority, "Task registered");
        self.write_guard().insert(task.id, task.clone());
        task
    }

    /// Fetch a point-in-time copy of a task
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no task with `id` exists.
    pub fn get(&self, id: TaskId) -> Result<Task> {
        self.read_guard()
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound { id })
    }

    /// Page through tasks in insertion order
    ///
    /// The window `[offset, offset + limit)` is cut from the full insertion
    /// order first; `status` then filters within that window. `total` counts
    /// every registered task and `filtered` the entries actually returned.
    pub fn list(&self, status: Option<TaskStatus>, limit: usize, offset: usize) -> TaskPage {
        let guard = self.read_guard();
        let total = guard.len();
        let tasks: Vec<TaskSummary> = guard
            .values()
            .skip(offset)
            .take(limit)
            .filter(|task| status.is_none_or(|want| task.status == want))
            .map(TaskSummary::from)
            .collect();
        let filtered = tasks.len();
        TaskPage {
            tasks,
            total,
            filtered,
        }
    }

    /// Move a task into processing
    ///
    /// Stamps `started_at` and raises progress to the initial processing
    /// mark.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown ids and
    /// [`Error::InvalidTransition`] when the task already reached a terminal
    /// state.
    pub fn mark_processing(&self, id: TaskId) -> Result<()> {
        let mut guard = self.write_guard();
        let task = Self::writable(&mut guard, id, TaskStatus::Processing)?;
        task.status = TaskStatus::Processing;
        task.started_at = Some(Utc::now());
        task.progress = task.progress.max(PROGRESS_STARTED);
        Ok(())
    }

    /// Record the resolved file identity of a task's media
    ///
    /// Called once metadata resolution succeeds, before any bytes move.
    /// `expected_size` is `None` when the provider does not know the size.
    /// The artifact path is recorded by [`TaskRegistry::complete`] only, so
    /// `file_path` stays unset on tasks that never finish.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown ids and
    /// [`Error::InvalidTransition`] for terminal tasks.
    pub fn set_expected_file(
        &self,
        id: TaskId,
        file_name: String,
        expected_size: Option<u64>,
    ) -> Result<()> {
        let mut guard = self.write_guard();
        let task = Self::writable(&mut guard, id, TaskStatus::Processing)?;
        task.file_name = Some(file_name);
        task.expected_size_bytes = expected_size;
        task.progress = task.progress.max(PROGRESS_RESOLVED);
        Ok(())
    }

    /// Raise a task's progress
    ///
    /// Progress is monotonic: values below the stored progress are absorbed
    /// without effect, and values outside `[0, 1]` are clamped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown ids and
    /// [`Error::InvalidTransition`] for terminal tasks, so stale callbacks
    /// from an abandoned transfer cannot resurrect a finished record.
    pub fn set_progress(&self, id: TaskId, progress: f64) -> Result<()> {
        let mut guard = self.write_guard();
        let task = Self::writable(&mut guard, id, TaskStatus::Processing)?;
        task.progress = task.progress.max(progress.clamp(0.0, 1.0));
        Ok(())
    }

    /// Mark a task completed
    ///
    /// Records the artifact location, its verified size, the wall-clock
    /// transfer time and the humanized throughput, and forces progress
    /// to 1.0. A task carries a `file_path` if and only if this write
    /// succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown ids and
    /// [`Error::InvalidTransition`] for terminal tasks.
    pub fn complete(
        &self,
        id: TaskId,
        file_path: PathBuf,
        actual_size: u64,
        download_time: Duration,
        throughput: Option<String>,
    ) -> Result<()> {
        let mut guard = self.write_guard();
        let task = Self::writable(&mut guard, id, TaskStatus::Completed)?;
        task.status = TaskStatus::Completed;
        task.progress = 1.0;
        task.file_path = Some(file_path);
        task.actual_size_bytes = Some(actual_size);
        task.download_time = Some(download_time);
        task.throughput = throughput;
        task.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Mark a task failed
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown ids and
    /// [`Error::InvalidTransition`] for terminal tasks.
    pub fn fail(&self, id: TaskId, error: impl Into<String>) -> Result<()> {
        let mut guard = self.write_guard();
        let task = Self::writable(&mut guard, id, TaskStatus::Failed)?;
        task.status = TaskStatus::Failed;
        task.error = Some(error.into());
        task.failed_at = Some(Utc::now());
        Ok(())
    }

    /// Retire a completed task whose stored artifact is unusable
    ///
    /// Delivery calls this when the file behind a completed record is missing
    /// or empty. This is the only permitted write to a terminal task, and
    /// only from `Completed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown ids and
    /// [`Error::InvalidTransition`] when the task is not currently completed.
    pub fn invalidate_artifact(&self, id: TaskId, reason: impl Into<String>) -> Result<()> {
        let mut guard = self.write_guard();
        let task = guard.get_mut(&id).ok_or(Error::NotFound { id })?;
        if task.status != TaskStatus::Completed {
            return Err(Error::InvalidTransition {
                id,
                from: task.status,
                to: TaskStatus::Failed,
            });
        }
        task.status = TaskStatus::Failed;
        task.error = Some(reason.into());
        task.failed_at = Some(Utc::now());
        Ok(())
    }

    /// Expire pending and processing tasks older than `max_age`
    ///
    /// Returns the ids that were expired. In-flight transfers are not
    /// interrupted; their later writes bounce off the terminal state.
    pub fn expire_stale(&self, max_age: Duration) -> Vec<TaskId> {
        let now = Utc::now();
        let mut expired = Vec::new();
        let mut guard = self.write_guard();
        for task in guard.values_mut() {
            if !matches!(task.status, TaskStatus::Pending | TaskStatus::Processing) {
                continue;
            }
            let age = now
                .signed_duration_since(task.created_at)
                .to_std()
                .unwrap_or_default();
            if age > max_age {
                task.status = TaskStatus::Expired;
                warn!(task_id = %task.id, age_seconds = age.as_secs(), "Task expired");
                expired.push(task.id);
            }
        }
        expired
    }

    /// Aggregate task counts by status
    pub fn stats(&self) -> DepotStats {
        let guard = self.read_guard();
        let mut stats = DepotStats {
            total: guard.len(),
            ..DepotStats::default()
        };
        for task in guard.values() {
            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Processing => stats.processing += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed => stats.failed += 1,
                TaskStatus::Expired => stats.expired += 1,
            }
        }
        stats
    }

    /// Write a pretty-printed JSON snapshot of every task to `path`
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the file write fails.
    pub fn snapshot_to(&self, path: &Path) -> Result<()> {
        let serialized = {
            let guard = self.read_guard();
            serde_json::to_vec_pretty(&*guard)?
        };
        std::fs::write(path, serialized)?;
        debug!(path = %path.display(), "Task state snapshot written");
        Ok(())
    }
}
