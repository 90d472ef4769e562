use super::pin::Pin;
use super::transaction::{
    Quote, TransactionKind, TransactionOutcome, TransactionRequest, VerificationRequest,
    VerificationResult,
};
use crate::error::GatewayError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Looks up one counterparty (bank account, wallet, meter, smart card).
#[async_trait]
pub trait CounterpartyLookup: Send + Sync {
    async fn lookup(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationResult, GatewayError>;
}

/// The remote initiate/process pairing.
///
/// `initiate` is a dry run and must not touch balances. `process` commits and
/// reports either a success or a server-side rejection as an outcome.
#[async_trait]
pub trait TransactionService: Send + Sync {
    async fn initiate(&self, request: &TransactionRequest) -> Result<Quote, GatewayError>;
    async fn process(
        &self,
        request: &TransactionRequest,
        pin: &Pin,
    ) -> Result<TransactionOutcome, GatewayError>;
}

/// The wallet that funds outgoing transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryWallet {
    pub id: String,
    pub currency_code: String,
}

/// Session state owned outside the engine.
#[async_trait]
pub trait SessionCollaborator: Send + Sync {
    async fn balance(&self) -> Decimal;
    /// Only ever called by the balance reconciler.
    async fn set_balance(&self, balance: Decimal);
    async fn primary_wallet(&self) -> Option<PrimaryWallet>;
    async fn force_logout(&self);
}

/// Receives the end-of-flow signals. Owns no engine state.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn flow_completed(&self, kind: TransactionKind, outcome: &TransactionOutcome);
    async fn flow_abandoned(&self, kind: TransactionKind);
}

pub type CounterpartyLookupBox = Arc<dyn CounterpartyLookup>;
pub type TransactionServiceBox = Arc<dyn TransactionService>;
pub type SessionBox = Arc<dyn SessionCollaborator>;
pub type NavigatorBox = Arc<dyn Navigator>;
