//! Core types for media-depot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Error;

/// Unique identifier for a retrieval task
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Generate a fresh random task identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    pub fn get(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TaskId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<TaskId> for Uuid {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Lifecycle status of a retrieval task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepted, waiting for the executor to pick it up
    Pending,
    /// Executor is resolving metadata or transferring bytes
    Processing,
    /// Artifact is on disk and ready to fetch
    Completed,
    /// Retrieval failed, or a completed artifact turned out invalid
    Failed,
    /// Sat in Pending/Processing past the staleness threshold
    Expired,
}

impl TaskStatus {
    /// Whether this status admits no further forward progress.
    ///
    /// `Completed` is terminal for the executor, yet delivery-time validation
    /// may still demote it to `Failed` (the one permitted late transition).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Expired
        )
    }

    /// Wire representation (lowercase), shared by serde and Display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory download priority, validated to the range 1 (lowest) to 5 (highest)
///
/// Nothing in this crate reorders work by priority; the value is recorded so
/// external schedulers and clients can make their own decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    /// Lowest accepted priority
    pub const MIN: u8 = 1;
    /// Highest accepted priority
    pub const MAX: u8 = 5;

    /// Create a priority, rejecting values outside 1..=5
    pub fn new(value: u8) -> Result<Self, Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidPriority { value })
        }
    }

    /// Get the inner value
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u8> for Priority {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provider-side coordinates of the media to retrieve
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct SourceRef {
    /// Chat (channel/group) identifier on the provider
    pub chat_id: i64,
    /// Message identifier within the chat
    pub message_id: i64,
}

impl SourceRef {
    /// Create a source reference
    pub fn new(chat_id: i64, message_id: i64) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.chat_id, self.message_id)
    }
}

/// Full registry record for one retrieval task
///
/// This is the authoritative in-memory state; API responses project it down
/// to [`TaskSummary`], and the shutdown snapshot serializes it as-is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier
    pub id: TaskId,

    /// Where the media lives on the provider
    pub source: SourceRef,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// Advisory priority recorded at submission
    pub priority: Priority,

    /// Normalized progress in [0.0, 1.0]; 0.2 marks the end of setup,
    /// the remaining 0.8 tracks the byte transfer
    pub progress: f64,

    /// Sanitized file name chosen for the artifact
    pub file_name: Option<String>,

    /// Artifact location in storage, recorded when the task completes
    pub file_path: Option<PathBuf>,

    /// Size the provider reported before the transfer
    pub expected_size_bytes: Option<u64>,

    /// Size measured on disk after the transfer
    pub actual_size_bytes: Option<u64>,

    /// Wall time the transfer took, measured by the executor
    pub download_time: Option<Duration>,

    /// Humanized transfer rate, e.g. "12.34 MB/s"; None when the elapsed
    /// time was too short to measure
    pub throughput: Option<String>,

    /// Error message for failed tasks
    pub error: Option<String>,

    /// When the task was accepted
    pub created_at: DateTime<Utc>,

    /// When the executor picked the task up
    pub started_at: Option<DateTime<Utc>>,

    /// When the task reached Completed
    pub completed_at: Option<DateTime<Utc>>,

    /// When the task reached Failed
    pub failed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a fresh Pending task record
    pub fn new(id: TaskId, source: SourceRef, priority: Priority) -> Self {
        Self {
            id,
            source,
            status: TaskStatus::Pending,
            priority,
            progress: 0.0,
            file_name: None,
            file_path: None,
            expected_size_bytes: None,
            actual_size_bytes: None,
            download_time: None,
            throughput: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            failed_at: None,
        }
    }
}

/// Wire projection of a task, returned by the status and listing endpoints
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskSummary {
    /// Unique task identifier
    pub task_id: TaskId,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// When the task was accepted
    pub created_at: DateTime<Utc>,

    /// Normalized progress in [0.0, 1.0]
    pub progress: f64,

    /// Artifact location in storage; present only once the task completed
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub file_path: Option<PathBuf>,

    /// On-disk artifact size in bytes, measured at completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,

    /// Error message for failed tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id,
            status: task.status,
            created_at: task.created_at,
            progress: task.progress,
            file_path: task.file_path.clone(),
            file_size: task.actual_size_bytes,
            error: task.error.clone(),
        }
    }
}

/// Listing envelope for `GET /download/tasks`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskPage {
    /// Tasks in the requested window, oldest first
    pub tasks: Vec<TaskSummary>,

    /// Total number of tasks in the registry, ignoring filter and window
    pub total: usize,

    /// Number of tasks returned after filtering the window
    pub filtered: usize,
}

/// Per-status task counts, used by the health endpoint
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DepotStats {
    /// Total number of tasks tracked
    pub total: usize,
    /// Tasks waiting for an executor
    pub pending: usize,
    /// Tasks currently resolving or transferring
    pub processing: usize,
    /// Tasks with a ready artifact
    pub completed: usize,
    /// Tasks that failed
    pub failed: usize,
    /// Tasks aged out by the sweeper
    pub expired: usize,
}
