//! Transfer progress reporting.

use std::sync::Arc;

use crate::registry::{PROGRESS_RESOLVED, TaskRegistry};
use crate::types::TaskId;

/// Minimum progress advance between registry writes (~10% of a transfer)
const WRITE_STEP: f64 = 0.08;

/// Maps provider transfer callbacks onto a task's progress field.
///
/// Metadata resolution already accounts for the head of the progress range,
/// so a transfer covers `[PROGRESS_RESOLVED, 1.0]`. Registry writes are
/// throttled to roughly every 10% of the transfer; the final callback always
/// writes. The registry's monotonic clamp keeps reads consistent across
/// retried transfers.
pub(crate) struct ProgressReporter {
    registry: Arc<TaskRegistry>,
    id: TaskId,
    last_written: f64,
}

impl ProgressReporter {
    pub(crate) fn new(registry: Arc<TaskRegistry>, id: TaskId) -> Self {
        Self {
            registry,
            id,
            last_written: PROGRESS_RESOLVED,
        }
    }

    /// Record a provider progress callback of `(transferred, total)` bytes.
    ///
    /// A zero `total` means the provider does not know the final size; the
    /// stored progress is left untouched in that case.
    pub(crate) fn report(&mut self, transferred: u64, total: u64) {
        if total == 0 {
            return;
        }

        let fraction = (transferred as f64 / total as f64).clamp(0.0, 1.0);
        let progress = PROGRESS_RESOLVED + fraction * (1.0 - PROGRESS_RESOLVED);

        if progress - self.last_written < WRITE_STEP && fraction < 1.0 {
            return;
        }
        self.last_written = progress;

        tracing::debug!(
            task_id = %self.id,
            transferred_bytes = transferred,
            total_bytes = total,
            percent = (fraction * 100.0) as u64,
            "Transfer progress"
        );

        // A rejected write means the task reached a terminal state while the
        // transfer kept running; the executor discovers that at completion.
        if let Err(e) = self.registry.set_progress(self.id, progress) {
            tracing::debug!(task_id = %self.id, error = %e, "Progress write rejected");
        }
    }
}
