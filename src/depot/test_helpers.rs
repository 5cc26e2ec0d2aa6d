//! Shared test helpers for creating MediaDepot instances in tests.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tempfile::tempdir;

use crate::config::Config;
use crate::depot::MediaDepot;
use crate::error::ProviderError;
use crate::provider::{
    ChannelRef, MediaFilter, MediaItem, MediaListing, MediaMetadata, MediaProvider,
    ProviderIdentity, ProviderResult,
};
use crate::types::SourceRef;

/// Scriptable in-memory provider.
///
/// Successful transfers write `payload` to the destination and report
/// progress halfway and at the end. Failures are scripted per call through
/// the error queues.
pub(crate) struct ScriptedProvider {
    /// File name reported by resolve; None simulates unnamed media
    pub(crate) media_name: Option<String>,
    /// Bytes written by a successful transfer
    pub(crate) payload: Vec<u8>,
    /// Errors returned by resolve before it starts succeeding
    pub(crate) resolve_errors: std::sync::Mutex<Vec<ProviderError>>,
    /// Errors returned by transfer before it starts succeeding
    pub(crate) transfer_errors: std::sync::Mutex<Vec<ProviderError>>,
    /// Number of transfer calls observed
    pub(crate) transfer_calls: AtomicU32,
    /// When true, identity() reports a dead session
    pub(crate) identity_fails: bool,
    /// Channel items returned by list_media
    pub(crate) channel_items: Vec<MediaItem>,
    /// Forward calls observed: (from_chat_id, to_chat, message_ids)
    pub(crate) forwards: std::sync::Mutex<Vec<(i64, String, Vec<i64>)>>,
    /// When true, forward() rejects every call
    pub(crate) forward_fails: bool,
}

impl ScriptedProvider {
    /// Provider that resolves and transfers successfully
    pub(crate) fn with_payload(media_name: &str, payload: &[u8]) -> Self {
        Self {
            media_name: Some(media_name.to_string()),
            payload: payload.to_vec(),
            resolve_errors: std::sync::Mutex::new(Vec::new()),
            transfer_errors: std::sync::Mutex::new(Vec::new()),
            transfer_calls: AtomicU32::new(0),
            identity_fails: false,
            channel_items: Vec::new(),
            forwards: std::sync::Mutex::new(Vec::new()),
            forward_fails: false,
        }
    }

    /// Provider whose first resolve fails with `error`
    pub(crate) fn failing_resolve(error: ProviderError) -> Self {
        let provider = Self::with_payload("unreachable.bin", b"unused");
        provider.resolve_errors.lock().unwrap().push(error);
        provider
    }

    /// Provider whose first transfers fail with `errors`, then succeed
    pub(crate) fn transfer_errors_then_ok(
        errors: Vec<ProviderError>,
        media_name: &str,
        payload: &[u8],
    ) -> Self {
        let provider = Self::with_payload(media_name, payload);
        // Stored in reverse so pop() yields them in order
        let mut queued = errors;
        queued.reverse();
        *provider.transfer_errors.lock().unwrap() = queued;
        provider
    }

    /// Sample channel item for listing tests
    pub(crate) fn sample_item(message_id: i64) -> MediaItem {
        MediaItem {
            message_id,
            chat_id: -100999,
            file_name: Some(format!("episode_{message_id}.mkv")),
            size_bytes: 1024 * message_id as u64,
            duration_seconds: 65,
            sent_at: Utc::now(),
            link: Some(format!("https://t.example/c/999/{message_id}")),
            caption: Some("sample".to_string()),
            has_thumbnail: true,
        }
    }
}

#[async_trait]
impl MediaProvider for ScriptedProvider {
    async fn identity(&self) -> ProviderResult<ProviderIdentity> {
        if self.identity_fails {
            return Err(ProviderError::Transport("session is dead".to_string()));
        }
        Ok(ProviderIdentity {
            display_name: "Scripted".to_string(),
            user_id: 7_700_000,
        })
    }

    async fn resolve(&self, _source: &SourceRef) -> ProviderResult<MediaMetadata> {
        if let Some(error) = self.resolve_errors.lock().unwrap().pop() {
            return Err(error);
        }
        Ok(MediaMetadata {
            file_name: self.media_name.clone(),
            size_bytes: self.payload.len() as u64,
        })
    }

    async fn transfer(
        &self,
        _source: &SourceRef,
        destination: &Path,
        progress: &mut (dyn FnMut(u64, u64) + Send),
    ) -> ProviderResult<()> {
        self.transfer_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.transfer_errors.lock().unwrap().pop() {
            return Err(error);
        }

        let total = self.payload.len() as u64;
        progress(total / 2, total);
        tokio::fs::write(destination, &self.payload)
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        progress(total, total);
        Ok(())
    }

    async fn list_media(
        &self,
        _channel: &ChannelRef,
        filter: &MediaFilter,
    ) -> ProviderResult<MediaListing> {
        let items: Vec<MediaItem> = self
            .channel_items
            .iter()
            .filter(|item| item.sent_at >= filter.from && item.sent_at < filter.until)
            .take(filter.limit)
            .cloned()
            .collect();
        let scanned = self.channel_items.len() as u64;
        Ok(MediaListing {
            items,
            messages_scanned: scanned,
        })
    }

    async fn forward(
        &self,
        from_chat_id: i64,
        to_chat: &ChannelRef,
        message_ids: &[i64],
    ) -> ProviderResult<()> {
        if self.forward_fails {
            return Err(ProviderError::Rejected("forwarding disabled".to_string()));
        }
        self.forwards
            .lock()
            .unwrap()
            .push((from_chat_id, to_chat.to_string(), message_ids.to_vec()));
        Ok(())
    }
}

/// Helper to create a test MediaDepot instance backed by a scripted provider.
/// Returns the depot and the tempdir (which must be kept alive).
pub(crate) async fn create_test_depot(
    provider: Arc<dyn MediaProvider>,
) -> (MediaDepot, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.storage.storage_dir = temp_dir.path().join("storage");
    config.storage.log_dir = temp_dir.path().join("logs");
    // Port 0 = OS assigns a free port, so concurrent tests never collide
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    // Keep retries fast so failure-path tests finish quickly
    config.retry.initial_delay = Duration::from_millis(5);
    config.retry.max_delay = Duration::from_millis(20);
    config.retry.max_rate_limit_delay = Duration::from_millis(50);
    config.retry.jitter = false;

    let depot = MediaDepot::new(config, provider).await.unwrap();
    (depot, temp_dir)
}
