//! Media provider interface
//!
//! The depot never talks to a remote service itself: metadata resolution,
//! byte transfer, channel scanning and forwarding all go through a
//! [`MediaProvider`] implementation supplied by the embedder. Implementations
//! can wrap a real messaging client or provide scripted behavior for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::error::ProviderError;
use crate::types::SourceRef;

/// Result type alias for provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Identity of the authenticated provider account
#[must_use]
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    /// Display name of the account
    pub display_name: String,
    /// Numeric account identifier
    pub user_id: i64,
}

impl std::fmt::Display for ProviderIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.user_id)
    }
}

/// Metadata the provider reports for a single piece of media
#[must_use]
#[derive(Debug, Clone)]
pub struct MediaMetadata {
    /// Provider-reported file name, unsanitized; None when the provider
    /// has no name for the media
    pub file_name: Option<String>,
    /// Provider-reported size in bytes; 0 when unknown
    pub size_bytes: u64,
}

/// A media entry discovered while scanning a channel
#[derive(Debug, Clone)]
pub struct MediaItem {
    /// Message identifier within the channel
    pub message_id: i64,
    /// Channel the message belongs to
    pub chat_id: i64,
    /// Provider-reported file name, if any
    pub file_name: Option<String>,
    /// Media size in bytes; 0 when unknown
    pub size_bytes: u64,
    /// Playback duration in seconds; 0 when unknown
    pub duration_seconds: u32,
    /// When the message was posted
    pub sent_at: DateTime<Utc>,
    /// Public link to the message, if the channel has one
    pub link: Option<String>,
    /// Message caption
    pub caption: Option<String>,
    /// Whether the media carries a thumbnail
    pub has_thumbnail: bool,
}

/// Date window and size limit for a channel scan
#[derive(Debug, Clone, Copy)]
pub struct MediaFilter {
    /// Maximum number of history messages to examine
    pub limit: usize,
    /// Inclusive lower bound on message date
    pub from: DateTime<Utc>,
    /// Exclusive upper bound on message date
    pub until: DateTime<Utc>,
}

impl MediaFilter {
    /// Filter for an explicit date window
    pub fn new(limit: usize, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self { limit, from, until }
    }

    /// Filter covering all history up to now
    pub fn recent(limit: usize) -> Self {
        Self {
            limit,
            from: DateTime::UNIX_EPOCH,
            until: Utc::now(),
        }
    }
}

/// Result of a channel scan
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct MediaListing {
    /// Media found inside the filter window, newest first
    pub items: Vec<MediaItem>,
    /// How many history messages were examined to produce the items
    pub messages_scanned: u64,
}

/// Reference to a channel: numeric identifier or public username
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// Numeric channel identifier
    Id(i64),
    /// Public username, without a leading @
    Username(String),
}

impl ChannelRef {
    /// Interpret a raw path segment as a channel reference
    ///
    /// Anything that parses as an integer is treated as a numeric id;
    /// everything else is passed through as a username.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(id) => ChannelRef::Id(id),
            Err(_) => ChannelRef::Username(raw.to_string()),
        }
    }
}

impl std::fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelRef::Id(id) => write!(f, "{id}"),
            ChannelRef::Username(name) => f.write_str(name),
        }
    }
}

/// Trait for the remote media service behind the depot
///
/// Implementations must be cheap to share (`Arc<dyn MediaProvider>`); every
/// in-flight download holds a clone for the duration of its transfer.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Verify connectivity and report the authenticated identity
    ///
    /// # Errors
    ///
    /// Returns an error when the provider session is unusable; the health
    /// endpoint maps this to an unhealthy response.
    async fn identity(&self) -> ProviderResult<ProviderIdentity>;

    /// Resolve a source reference to media metadata without moving bytes
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingMedia`] when the message does not
    /// exist or carries nothing downloadable, or a transport/rejection error
    /// when the provider cannot be asked at all.
    async fn resolve(&self, source: &SourceRef) -> ProviderResult<MediaMetadata>;

    /// Transfer the media behind `source` into the file at `destination`
    ///
    /// Implementations invoke `progress` with `(bytes_transferred,
    /// bytes_total)` as the transfer advances; `bytes_total` may be 0 when
    /// the provider does not know the final size.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::RateLimited`] when the provider demands a
    /// back-off (the depot honors the requested delay and retries), or a
    /// transport/rejection error for other failures.
    async fn transfer(
        &self,
        source: &SourceRef,
        destination: &Path,
        progress: &mut (dyn FnMut(u64, u64) + Send),
    ) -> ProviderResult<()>;

    /// Scan a channel's history, newest first, for media inside the window
    ///
    /// Implementations should stop scanning once history older than
    /// `filter.from` is reached; history is ordered, so nothing beyond it
    /// can match.
    async fn list_media(
        &self,
        channel: &ChannelRef,
        filter: &MediaFilter,
    ) -> ProviderResult<MediaListing>;

    /// Forward messages from one chat to another
    async fn forward(
        &self,
        from_chat_id: i64,
        to_chat: &ChannelRef,
        message_ids: &[i64],
    ) -> ProviderResult<()>;
}
