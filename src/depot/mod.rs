//! Core depot implementation split into focused submodules.
//!
//! The `MediaDepot` struct and its methods are organized by domain:
//! - [`executor`] - Download task execution
//! - [`progress`] - Transfer progress reporting
//! - [`sweeper`] - Stale task expiry

mod executor;
mod progress;
mod sweeper;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::provider::MediaProvider;
use crate::registry::TaskRegistry;
use crate::types::{DepotStats, Priority, SourceRef, Task, TaskId, TaskPage, TaskStatus};

/// Main depot instance (cloneable - all fields are Arc-wrapped)
///
/// The depot accepts download requests, runs each one on a detached task,
/// tracks every task in the shared registry and serves the stored artifacts
/// back out through the API layer.
#[derive(Clone)]
pub struct MediaDepot {
    /// Task registry shared with executors, the sweeper and the API layer
    pub(crate) registry: Arc<TaskRegistry>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Remote media service handle (trait object for pluggable implementations)
    pub(crate) provider: Arc<dyn MediaProvider>,
    /// Flag to indicate whether new downloads are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Cancellation token for the expiry sweeper
    sweeper_cancel: CancellationToken,
    /// Sweeper join handle, awaited during shutdown
    sweeper_task: Arc<tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>>,
}

impl MediaDepot {
    /// Create a new MediaDepot instance
    ///
    /// This initializes all core components:
    /// - Creates the storage and log directories
    /// - Sets up the shared task registry
    /// - Spawns the background expiry sweeper
    ///
    /// # Errors
    ///
    /// Returns an error when a working directory cannot be created.
    pub async fn new(config: Config, provider: Arc<dyn MediaProvider>) -> Result<Self> {
        // Ensure storage and log directories exist
        tokio::fs::create_dir_all(config.storage_dir())
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create storage directory '{}': {}",
                        config.storage_dir().display(),
                        e
                    ),
                ))
            })?;
        tokio::fs::create_dir_all(config.log_dir())
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create log directory '{}': {}",
                        config.log_dir().display(),
                        e
                    ),
                ))
            })?;

        let registry = Arc::new(TaskRegistry::new());
        let sweeper_cancel = CancellationToken::new();

        // The sweeper's first tick fires immediately, which doubles as the
        // startup sweep.
        let sweeper_handle = sweeper::spawn_expiry_sweeper(
            registry.clone(),
            config.expiry.clone(),
            sweeper_cancel.clone(),
        );

        tracing::info!(
            storage_dir = %config.storage_dir().display(),
            sweep_interval_secs = config.expiry.sweep_interval.as_secs(),
            max_task_age_secs = config.expiry.max_task_age.as_secs(),
            "Media depot initialized"
        );

        Ok(Self {
            registry,
            config: Arc::new(config),
            provider,
            accepting_new: Arc::new(AtomicBool::new(true)),
            sweeper_cancel,
            sweeper_task: Arc::new(tokio::sync::Mutex::new(Some(sweeper_handle))),
        })
    }

    /// Accept a download request and start executing it
    ///
    /// The returned task is a snapshot of the freshly created record; the
    /// actual download runs on a detached background task and reports its
    /// outcome only through the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] once shutdown has begun.
    pub fn request_download(&self, source: SourceRef, priority: Priority) -> Result<Task> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let task = self.registry.create(source, priority);
        tracing::info!(
            task_id = %task.id,
            source = %source,
            priority = %priority,
            "Download task accepted"
        );

        let depot = self.clone();
        let id = task.id;
        tokio::spawn(async move {
            executor::run_download_task(depot, id).await;
        });

        Ok(task)
    }

    /// Fetch a point-in-time copy of a task
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown task ids.
    pub fn task(&self, id: TaskId) -> Result<Task> {
        self.registry.get(id)
    }

    /// Validate a completed artifact immediately before delivery
    ///
    /// Re-checks that `file_path` still points at a non-empty regular file
    /// and returns the task snapshot together with the size measured on
    /// disk. A completed task whose artifact is gone or empty is demoted to
    /// `Failed` so later status queries reflect reality.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown ids, [`Error::NotReady`]
    /// while the task has not completed, and [`Error::MissingArtifact`] or
    /// [`Error::CorruptArtifact`] when the validation fails.
    pub async fn validate_artifact(&self, id: TaskId) -> Result<(Task, u64)> {
        let task = self.registry.get(id)?;
        if task.status != TaskStatus::Completed {
            return Err(Error::NotReady {
                id,
                status: task.status,
            });
        }

        let Some(path) = task.file_path.as_deref() else {
            // Completed tasks always carry a path; a bare record means the
            // registry was corrupted.
            self.demote_invalid(id, "artifact path missing from completed task");
            return Err(Error::MissingArtifact { id });
        };

        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {
                let size = meta.len();
                Ok((task, size))
            }
            Ok(_) => {
                self.demote_invalid(id, "artifact is empty or not a regular file");
                Err(Error::CorruptArtifact { id })
            }
            Err(_) => {
                self.demote_invalid(id, "artifact missing from storage");
                Err(Error::MissingArtifact { id })
            }
        }
    }

    /// Demote a completed task whose artifact failed delivery validation.
    fn demote_invalid(&self, id: TaskId, reason: &str) {
        tracing::warn!(task_id = %id, reason, "Artifact failed delivery validation");
        if let Err(e) = self.registry.invalidate_artifact(id, reason) {
            tracing::warn!(task_id = %id, error = %e, "Could not demote invalid artifact");
        }
    }

    /// Page through tasks in insertion order, optionally filtered by status
    pub fn list_tasks(
        &self,
        status: Option<TaskStatus>,
        limit: usize,
        offset: usize,
    ) -> TaskPage {
        self.registry.list(status, limit, offset)
    }

    /// Aggregate task counts by status
    pub fn stats(&self) -> DepotStats {
        self.registry.stats()
    }

    /// Get the current configuration
    ///
    /// The configuration is wrapped in an Arc, so this is a cheap clone
    /// operation.
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Get a handle to the media provider
    ///
    /// Used by the API layer for operations that bypass the task registry,
    /// such as the health probe and channel scans.
    pub fn provider(&self) -> Arc<dyn MediaProvider> {
        Arc::clone(&self.provider)
    }

    /// Gracefully shut down the depot
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new download requests
    /// 2. Cancels and awaits the expiry sweeper
    /// 3. Writes a task state snapshot for operational inspection
    ///
    /// In-flight transfers are left running; they finish (or fail) against
    /// the registry on their own detached tasks.
    ///
    /// # Errors
    ///
    /// Never fails today; the snapshot step logs and continues on error so
    /// the rest of the sequence always runs.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new downloads
        self.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new downloads");

        // 2. Stop the expiry sweeper
        self.sweeper_cancel.cancel();
        if let Some(handle) = self.sweeper_task.lock().await.take()
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, "Expiry sweeper did not shut down cleanly");
        }

        // 3. Persist a snapshot of the registry
        let snapshot_path = self.config.snapshot_path();
        if let Err(e) = self.registry.snapshot_to(&snapshot_path) {
            tracing::error!(error = %e, "Failed to write task state snapshot during shutdown");
            // Continue with shutdown even if the snapshot fails
        } else {
            tracing::info!(path = %snapshot_path.display(), "Task state snapshot written");
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Spawn the REST API server in a background task
    ///
    /// This method spawns the API server as a separate async task using `tokio::spawn`.
    /// The server runs concurrently with download processing and listens on the configured
    /// bind address (default: 127.0.0.1:8000).
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let depot = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(depot, config).await })
    }
}
