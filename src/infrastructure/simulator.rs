use crate::config::SimulatorConfig;
use crate::domain::pin::Pin;
use crate::domain::ports::{CounterpartyLookup, TransactionService};
use crate::domain::transaction::{
    Quote, TransactionKind, TransactionOutcome, TransactionRequest, VerificationRequest,
    VerificationResult, failure_reason,
};
use crate::error::GatewayError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub lookups: u32,
    pub initiates: u32,
    pub processes: u32,
}

#[derive(Debug)]
struct Ledger {
    balance: Decimal,
    sequence: u64,
    offline: bool,
    session_expired: bool,
    calls: CallCounts,
}

/// An in-process stand-in for the remote banking service.
///
/// Holds the authoritative balance, a directory of known counterparties, a
/// flat fee and the expected PIN. Failure modes (offline, expired session,
/// balance changed elsewhere) can be switched on to exercise the engine.
#[derive(Clone)]
pub struct SimulatedBank {
    ledger: Arc<RwLock<Ledger>>,
    directory: HashMap<String, String>,
    currency_code: String,
    currency_symbol: String,
    flat_fee: Decimal,
    pin: String,
}

impl SimulatedBank {
    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(Ledger {
                balance: config.opening_balance,
                sequence: 0,
                offline: false,
                session_expired: false,
                calls: CallCounts::default(),
            })),
            directory: config
                .counterparties
                .iter()
                .map(|entry| (entry.reference.clone(), entry.name.clone()))
                .collect(),
            currency_code: config.currency_code.clone(),
            currency_symbol: config.currency_symbol.clone(),
            flat_fee: config.flat_fee,
            pin: config.pin.clone(),
        }
    }

    /// Adds a counterparty under its lookup reference, e.g. `B1:0123456789`.
    pub fn with_counterparty(mut self, reference: &str, name: &str) -> Self {
        self.directory.insert(reference.to_string(), name.to_string());
        self
    }

    pub async fn balance(&self) -> Decimal {
        self.ledger.read().await.balance
    }

    /// Changes the balance behind the client's back, as a debit from another
    /// device would.
    pub async fn set_balance(&self, balance: Decimal) {
        self.ledger.write().await.balance = balance;
    }

    pub async fn set_offline(&self, offline: bool) {
        self.ledger.write().await.offline = offline;
    }

    pub async fn expire_session(&self) {
        self.ledger.write().await.session_expired = true;
    }

    pub async fn calls(&self) -> CallCounts {
        self.ledger.read().await.calls
    }

    fn check_reachable(ledger: &Ledger) -> Result<(), GatewayError> {
        if ledger.offline {
            return Err(GatewayError::Network("service unreachable".to_string()));
        }
        if ledger.session_expired {
            return Err(GatewayError::SessionExpired);
        }
        Ok(())
    }

    fn instrument_code(kind: TransactionKind, sequence: u64) -> Option<String> {
        match kind {
            TransactionKind::ElectricityPurchase => {
                let digits = format!("{:020}", sequence.wrapping_mul(7_919_000_003));
                let groups: Vec<&str> = (0..5).map(|i| &digits[i * 4..i * 4 + 4]).collect();
                Some(groups.join("-"))
            }
            TransactionKind::FixedDepositInvestment => Some(format!("FD{sequence:06}")),
            _ => None,
        }
    }
}

#[async_trait]
impl CounterpartyLookup for SimulatedBank {
    async fn lookup(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationResult, GatewayError> {
        let mut ledger = self.ledger.write().await;
        ledger.calls.lookups += 1;
        Self::check_reachable(&ledger)?;

        let reference = request.reference();
        let name = self.directory.get(&reference).ok_or_else(|| {
            GatewayError::NotFound(format!("no counterparty found for {reference}"))
        })?;

        let mut meta = BTreeMap::new();
        meta.insert("reference".to_string(), reference.clone());
        Ok(VerificationResult {
            counterparty_name: name.clone(),
            counterparty_meta: meta,
            raw: serde_json::json!({ "request": request, "name": name }),
        })
    }
}

#[async_trait]
impl TransactionService for SimulatedBank {
    async fn initiate(&self, request: &TransactionRequest) -> Result<Quote, GatewayError> {
        let mut ledger = self.ledger.write().await;
        ledger.calls.initiates += 1;
        Self::check_reachable(&ledger)?;

        let total = request.amount + self.flat_fee;
        if total > ledger.balance {
            return Err(GatewayError::InsufficientFunds(format!(
                "{total} exceeds the available balance"
            )));
        }
        Ok(Quote {
            currency_code: self.currency_code.clone(),
            currency_symbol: self.currency_symbol.clone(),
            amount_processable: request.amount,
            platform_fee: self.flat_fee,
            total_processable: total,
            balance_before: ledger.balance,
            balance_after_expected: ledger.balance - total,
        })
    }

    async fn process(
        &self,
        request: &TransactionRequest,
        pin: &Pin,
    ) -> Result<TransactionOutcome, GatewayError> {
        let mut ledger = self.ledger.write().await;
        ledger.calls.processes += 1;
        Self::check_reachable(&ledger)?;

        if pin.expose() != self.pin {
            return Ok(TransactionOutcome::failure(
                failure_reason::INVALID_PIN,
                "incorrect transaction PIN",
            ));
        }
        let total = request.amount + self.flat_fee;
        if total > ledger.balance {
            return Ok(TransactionOutcome::failure(
                failure_reason::INSUFFICIENT_FUNDS,
                "insufficient balance to complete this transaction",
            ));
        }

        ledger.balance -= total;
        ledger.sequence += 1;
        Ok(TransactionOutcome::Success {
            reference: format!("TXN{:08}", ledger.sequence),
            instrument_code: Self::instrument_code(request.kind, ledger.sequence),
            amount_charged: request.amount,
            fee: self.flat_fee,
            balance_after: ledger.balance,
        })
    }
}
