use crate::domain::ports::{Navigator, PrimaryWallet, SessionCollaborator};
use crate::domain::transaction::{TransactionKind, TransactionOutcome};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug)]
struct SessionData {
    balance: Decimal,
    balance_writes: u32,
    logged_out: bool,
}

/// A session held in memory.
///
/// Uses `Arc<RwLock<..>>` so the CLI, tests and every flow controller can
/// share one balance snapshot.
#[derive(Clone)]
pub struct InMemorySession {
    data: Arc<RwLock<SessionData>>,
    primary_wallet: Option<PrimaryWallet>,
}

impl InMemorySession {
    pub fn new(balance: Decimal, primary_wallet: Option<PrimaryWallet>) -> Self {
        Self {
            data: Arc::new(RwLock::new(SessionData {
                balance,
                balance_writes: 0,
                logged_out: false,
            })),
            primary_wallet,
        }
    }

    pub async fn current_balance(&self) -> Decimal {
        self.data.read().await.balance
    }

    /// How many times the balance has been written since creation.
    pub async fn balance_writes(&self) -> u32 {
        self.data.read().await.balance_writes
    }

    pub async fn is_logged_out(&self) -> bool {
        self.data.read().await.logged_out
    }
}

#[async_trait]
impl SessionCollaborator for InMemorySession {
    async fn balance(&self) -> Decimal {
        self.current_balance().await
    }

    async fn set_balance(&self, balance: Decimal) {
        let mut data = self.data.write().await;
        data.balance = balance;
        data.balance_writes += 1;
    }

    async fn primary_wallet(&self) -> Option<PrimaryWallet> {
        self.primary_wallet.clone()
    }

    async fn force_logout(&self) {
        self.data.write().await.logged_out = true;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Completed(TransactionKind, TransactionOutcome),
    Abandoned(TransactionKind),
}

/// A navigator that records every end-of-flow signal it receives.
#[derive(Default, Clone)]
pub struct RecordingNavigator {
    events: Arc<RwLock<Vec<NavigationEvent>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<NavigationEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn flow_completed(&self, kind: TransactionKind, outcome: &TransactionOutcome) {
        self.events
            .write()
            .await
            .push(NavigationEvent::Completed(kind, outcome.clone()));
    }

    async fn flow_abandoned(&self, kind: TransactionKind) {
        self.events
            .write()
            .await
            .push(NavigationEvent::Abandoned(kind));
    }
}
