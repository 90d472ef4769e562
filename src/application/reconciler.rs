use crate::domain::ports::SessionBox;
use crate::domain::transaction::TransactionOutcome;

/// The single write path into the session's wallet balance.
///
/// Only server-confirmed balances are written. A failure leaves the snapshot
/// untouched.
#[derive(Clone)]
pub struct BalanceReconciler {
    session: SessionBox,
}

impl BalanceReconciler {
    pub fn new(session: SessionBox) -> Self {
        Self { session }
    }

    /// Applies `outcome` to the session balance. Returns whether a write
    /// happened.
    pub async fn reconcile(&self, outcome: &TransactionOutcome) -> bool {
        match outcome {
            TransactionOutcome::Success {
                reference,
                balance_after,
                ..
            } => {
                tracing::debug!(%reference, %balance_after, "reconciling wallet balance");
                self.session.set_balance(*balance_after).await;
                true
            }
            TransactionOutcome::Failure { .. } => false,
        }
    }
}
