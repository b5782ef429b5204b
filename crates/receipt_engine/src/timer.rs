use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Sleeps for `after` unless `cancel` fires first. Returns `true` when the
/// full duration elapsed.
pub async fn dismiss_after(after: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(after) => true,
    }
}
