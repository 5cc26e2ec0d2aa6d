//! # media-depot
//!
//! Asynchronous media retrieval backend for chat-channel downloads.
//!
//! ## Design Philosophy
//!
//! media-depot is designed to be:
//! - **Task-based** - Every download is an addressable task with observable progress
//! - **Provider-agnostic** - The chat service sits behind a trait, bring any session
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **HTTP-ready** - Ships an axum REST API with OpenAPI docs for remote control
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use media_depot::{Config, MediaDepot, MediaProvider, run_with_shutdown};
//!
//! async fn run(provider: Arc<dyn MediaProvider>) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.storage.storage_dir = "/var/lib/media-depot".into();
//!
//!     let depot = Arc::new(MediaDepot::new(config, provider).await?);
//!
//!     // Serve the REST API alongside download processing
//!     depot.spawn_api_server();
//!
//!     // Block until SIGTERM/SIGINT, then shut down gracefully
//!     run_with_shutdown(depot).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Core depot implementation (decomposed into focused submodules)
pub mod depot;
/// Error types
pub mod error;
/// Media provider abstraction
pub mod provider;
/// In-memory task registry
pub mod registry;
/// Retry logic with exponential backoff
pub mod retry;
/// Core task types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{ApiConfig, Config, ExpiryConfig, RetryConfig, StorageConfig};
pub use depot::MediaDepot;
pub use error::{ApiError, Error, ErrorDetail, ProviderError, Result, ToHttpStatus};
pub use provider::{
    ChannelRef, MediaFilter, MediaItem, MediaListing, MediaMetadata, MediaProvider,
    ProviderIdentity, ProviderResult,
};
pub use registry::TaskRegistry;
pub use types::{DepotStats, Priority, SourceRef, Task, TaskId, TaskPage, TaskStatus, TaskSummary};

use std::sync::Arc;

/// Helper function to run the depot with graceful signal handling.
///
/// Waits for a termination signal and then calls the depot's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use media_depot::{Config, MediaDepot, MediaProvider, run_with_shutdown};
///
/// async fn run(provider: Arc<dyn MediaProvider>) -> Result<(), Box<dyn std::error::Error>> {
///     let depot = Arc::new(MediaDepot::new(Config::default(), provider).await?);
///
///     // Run with automatic signal handling
///     run_with_shutdown(depot).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(depot: Arc<MediaDepot>) -> Result<()> {
    wait_for_signal().await;
    depot.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
