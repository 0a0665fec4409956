//! Rollback handling for failed placements.

use store::OrderTx;

use crate::error::OrderError;

/// Aborts an in-flight transaction after `cause` terminated the
/// placement sequence.
///
/// Consumes the transaction, so a terminated placement cannot be
/// re-entered, and the gateway releases the connection exactly once no
/// matter which step failed. A secondary error from the abort itself is
/// logged, never propagated: it must not mask the original cause.
pub(crate) async fn abort<T: OrderTx>(tx: T, cause: &OrderError) {
    if let Err(abort_err) = tx.rollback().await {
        tracing::warn!(%cause, error = %abort_err, "rollback itself failed after aborted placement");
    }
}
