//! Background expiry sweeping for stale tasks.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ExpiryConfig;
use crate::registry::TaskRegistry;

/// Spawn a background task that periodically expires stale tasks.
///
/// Pending and processing tasks older than `config.max_task_age` are moved to
/// the expired state on every sweep. The interval's first tick fires
/// immediately, which doubles as the startup sweep.
pub(crate) fn spawn_expiry_sweeper(
    registry: Arc<TaskRegistry>,
    config: ExpiryConfig,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.sweep_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let expired = registry.expire_stale(config.max_task_age);
                    if expired.is_empty() {
                        tracing::debug!("Expiry sweep found no stale tasks");
                    } else {
                        tracing::info!(expired_count = expired.len(), "Expiry sweep retired stale tasks");
                    }
                }
                _ = cancel_token.cancelled() => {
                    break;
                }
            }
        }
    })
}
