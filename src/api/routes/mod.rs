//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`download`] — Download submission, status, delivery, listing
//! - [`channel`] — Channel media listing and message forwarding
//! - [`system`] — Health and OpenAPI
//!
//! The request/query/response wire types shared by the handlers and the
//! OpenAPI components live at the bottom of this module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::MediaItem;
use crate::types::{TaskId, TaskStatus};
use crate::utils::{format_file_size, format_media_duration};

mod channel;
mod download;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use channel::*;
pub use download::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Request body for POST /download/request
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadRequest {
    /// Chat (channel/group) identifier holding the media
    pub chat_id: i64,
    /// Message identifier within the chat
    pub message_id: i64,
    /// Advisory priority between 1 and 5 (default: 1)
    pub priority: Option<u8>,
}

/// Response for POST /download/request - the freshly accepted task
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RequestDownloadResponse {
    /// Handle for polling status and fetching the artifact
    pub task_id: TaskId,
    /// Always "pending" at acceptance time
    pub status: TaskStatus,
    /// When the task was accepted
    pub created_at: DateTime<Utc>,
}

/// Query parameters for GET /download/tasks
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ListTasksQuery {
    /// Keep only tasks with this status, applied after the window
    pub status: Option<TaskStatus>,
    /// Maximum number of tasks in the window (default: 50)
    pub limit: Option<usize>,
    /// Number of tasks to skip (default: 0)
    pub offset: Option<usize>,
}

/// Query parameters for GET /channel/:channel_id/media
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ChannelMediaQuery {
    /// Maximum number of history messages to scan (default: 2000)
    pub limit: Option<usize>,
    /// Inclusive start date, `YYYY-MM-DD`
    pub date_from: Option<String>,
    /// Inclusive end date, `YYYY-MM-DD`
    pub date_to: Option<String>,
}

/// One media entry in a channel listing response
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ChannelMediaItem {
    /// Message identifier within the channel
    pub message_id: i64,
    /// Channel the message belongs to
    pub chat_id: i64,
    /// Provider-reported file name, if any
    pub file_name: Option<String>,
    /// Raw media size in bytes
    pub file_size_bytes: u64,
    /// Humanized media size, e.g. "1.40 GB"
    pub file_size_formatted: String,
    /// Playback duration in seconds; 0 when unknown
    pub duration_seconds: u32,
    /// Duration as `M:SS`, or "Unknown"
    pub duration_formatted: String,
    /// When the message was posted (ISO 8601)
    pub date: DateTime<Utc>,
    /// Posting time as `YYYY-MM-DD HH:MM:SS`
    pub date_formatted: String,
    /// Public link to the message, if the channel has one
    pub link: Option<String>,
    /// Message caption; empty when the message has none
    pub caption: String,
    /// Whether the media carries a thumbnail
    pub has_thumbnail: bool,
}

impl From<&MediaItem> for ChannelMediaItem {
    fn from(item: &MediaItem) -> Self {
        Self {
            message_id: item.message_id,
            chat_id: item.chat_id,
            file_name: item.file_name.clone(),
            file_size_bytes: item.size_bytes,
            file_size_formatted: format_file_size(item.size_bytes),
            duration_seconds: item.duration_seconds,
            duration_formatted: format_media_duration(item.duration_seconds),
            date: item.sent_at,
            date_formatted: item.sent_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            link: item.link.clone(),
            caption: item.caption.clone().unwrap_or_default(),
            has_thumbnail: item.has_thumbnail,
        }
    }
}

/// Date window actually applied to a channel scan
///
/// `to` is the end-exclusive bound, one day past the requested `date_to`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DateRange {
    /// Inclusive lower bound
    pub from: DateTime<Utc>,
    /// Exclusive upper bound
    pub to: DateTime<Utc>,
}

/// Response for GET /channel/:channel_id/media
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ChannelMediaResponse {
    /// Media found inside the window, newest first
    pub items: Vec<ChannelMediaItem>,
    /// Number of items returned
    pub total_found: usize,
    /// How many history messages were examined
    pub messages_scanned: u64,
    /// The window the scan ran with
    pub date_range: DateRange,
}

/// Request body for POST /forward
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ForwardRequest {
    /// Chat the messages currently live in
    pub from_chat_id: i64,
    /// Destination chat: numeric id or public username
    pub to_chat_id: String,
    /// Messages to forward, in order
    pub message_ids: Vec<i64>,
}

/// Response for POST /forward
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ForwardResponse {
    /// Always "success" when the provider accepted the batch
    pub status: String,
    /// Number of messages forwarded
    pub forwarded_count: usize,
}
