//! Download task execution — top-level lifecycle for a single download.

use std::time::Instant;

use crate::retry::transfer_with_retry;
use crate::types::TaskId;
use crate::utils::{format_throughput, sanitize_file_name};

use super::MediaDepot;
use super::progress::ProgressReporter;

/// Core download task -- orchestrates the full lifecycle of a single download.
///
/// Phases:
/// 1. Move the task into processing
/// 2. Resolve media metadata from the provider
/// 3. Derive the artifact name and storage location
/// 4. Transfer the bytes, with retry and progress reporting
/// 5. Verify the artifact landed on disk
/// 6. Record completion
///
/// Every failure is recorded into the task record; nothing propagates out of
/// this function, since it runs detached.
pub(crate) async fn run_download_task(depot: MediaDepot, id: TaskId) {
    // Phase 1: move the task into processing
    let source = match depot.registry.get(id) {
        Ok(task) => task.source,
        Err(e) => {
            tracing::error!(task_id = %id, error = %e, "Task vanished before execution");
            return;
        }
    };
    if let Err(e) = depot.registry.mark_processing(id) {
        tracing::warn!(task_id = %id, error = %e, "Task is no longer runnable");
        return;
    }
    tracing::info!(task_id = %id, source = %source, "Processing download task");

    // Phase 2: resolve media metadata
    let metadata = match depot.provider.resolve(&source).await {
        Ok(metadata) => metadata,
        Err(e) => {
            record_failure(&depot, id, e.to_string());
            return;
        }
    };

    // Phase 3: derive the artifact name and storage location
    let file_name = sanitize_file_name(metadata.file_name.as_deref(), &source);
    let destination = depot.config.storage_dir().join(&file_name);
    let expected_size = (metadata.size_bytes > 0).then_some(metadata.size_bytes);
    if let Err(e) = depot
        .registry
        .set_expected_file(id, file_name.clone(), expected_size)
    {
        tracing::warn!(task_id = %id, error = %e, "Task expired before transfer started");
        return;
    }
    tracing::info!(
        task_id = %id,
        file_name = %file_name,
        expected_size_bytes = metadata.size_bytes,
        "Media metadata resolved"
    );

    // Phase 4: transfer the bytes, with retry and progress reporting
    let transfer_start = Instant::now();
    let provider = depot.provider.clone();
    let registry = depot.registry.clone();
    let transfer_result = transfer_with_retry(&depot.config.retry, || {
        let provider = provider.clone();
        let destination = destination.clone();
        // A fresh reporter per attempt; the registry's monotonic clamp
        // absorbs the restart.
        let mut reporter = ProgressReporter::new(registry.clone(), id);
        async move {
            let mut report = |transferred: u64, total: u64| reporter.report(transferred, total);
            provider.transfer(&source, &destination, &mut report).await
        }
    })
    .await;

    if let Err(e) = transfer_result {
        record_failure(&depot, id, e.to_string());
        return;
    }

    // Phase 5: verify the artifact landed on disk
    let actual_size = match tokio::fs::metadata(&destination).await {
        Ok(meta) if meta.len() > 0 => meta.len(),
        Ok(_) => {
            record_failure(
                &depot,
                id,
                format!("downloaded file is empty: {}", destination.display()),
            );
            return;
        }
        Err(e) => {
            record_failure(
                &depot,
                id,
                format!("downloaded file missing after transfer: {e}"),
            );
            return;
        }
    };

    // Phase 6: record completion
    let download_time = transfer_start.elapsed();
    let throughput = format_throughput(actual_size, download_time);
    match depot
        .registry
        .complete(id, destination, actual_size, download_time, throughput)
    {
        Ok(()) => {
            tracing::info!(
                task_id = %id,
                file_name = %file_name,
                size_bytes = actual_size,
                elapsed_ms = download_time.as_millis() as u64,
                "Download task completed"
            );
        }
        Err(e) => {
            // The task expired mid-transfer; the artifact stays on disk but
            // the terminal record is left untouched.
            tracing::warn!(task_id = %id, error = %e, "Transfer finished but task is no longer writable");
        }
    }
}

/// Record a failure into the task and log it.
fn record_failure(depot: &MediaDepot, id: TaskId, message: String) {
    tracing::error!(task_id = %id, error = %message, "Download task failed");
    if let Err(e) = depot.registry.fail(id, message) {
        tracing::warn!(task_id = %id, error = %e, "Could not record task failure");
    }
}
