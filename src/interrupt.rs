//! Ctrl-C handling for a running export.

use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

/// Cancel `token` on the first interrupt.
///
/// Returns `true` when a second interrupt arrives, meaning the caller should
/// exit without waiting: a stalled query never reaches a cancellation check.
/// Returns `false` once the interrupt source closes.
pub async fn watch_interrupts(
    token: CancellationToken,
    mut interrupts: UnboundedReceiver<()>,
) -> bool {
    if interrupts.recv().await.is_none() {
        return false;
    }
    tracing::warn!("Interrupt received, stopping at the next row batch (Ctrl-C again to abort)");
    token.cancel();

    interrupts.recv().await.is_some()
}
