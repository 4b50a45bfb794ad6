use std::time::Duration;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed,
    Cancelled,
}

/// Sleeps for `duration` unless `cancel` fires first.
///
/// Never interrupts anything but the sleep itself: callers only reach this
/// between chain calls. Both the timer and the cancellation listener are
/// dropped when this returns.
pub async fn wait_cancellable(duration: Duration, cancel: &CancellationToken) -> WaitOutcome {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => WaitOutcome::Cancelled,
        _ = tokio::time::sleep(duration) => WaitOutcome::Completed,
    }
}
