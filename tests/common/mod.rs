#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::sync::Semaphore;
use txflow::application::controller::{FlowServices, TransactionFlowController};
use txflow::application::verification::VerificationGateway;
use txflow::config::{LimitTable, SimulatorConfig};
use txflow::domain::flow::{FlowIntent, FlowState};
use txflow::domain::pin::Pin;
use txflow::domain::ports::{CounterpartyLookup, PrimaryWallet, TransactionService};
use txflow::domain::transaction::{
    LookupProvider, MeterType, Quote, Selection, TransactionKind, TransactionOutcome,
    TransactionRequest, VerificationRequest, VerificationResult,
};
use txflow::error::GatewayError;
use txflow::infrastructure::in_memory::{InMemorySession, RecordingNavigator};
use txflow::infrastructure::simulator::SimulatedBank;

pub struct Harness<B> {
    pub bank: Arc<B>,
    pub session: Arc<InMemorySession>,
    pub navigator: Arc<RecordingNavigator>,
    pub services: Arc<FlowServices>,
}

impl<B> Harness<B> {
    pub fn start(&self, kind: TransactionKind) -> TransactionFlowController {
        TransactionFlowController::start(kind, self.services.clone())
    }
}

pub fn simulated_bank() -> SimulatedBank {
    SimulatedBank::from_config(&SimulatorConfig::default())
        .with_counterparty("B1:0123456789", "Jane Doe")
        .with_counterparty("W-77", "John Roe")
        .with_counterparty("IKEDC:45012345678", "Ada Obi")
        .with_counterparty("DSTV:7012345678", "Tunde Ade")
}

/// Wires a full set of services around `bank` with a 10000 balance session.
pub fn harness_with<B>(bank: B) -> Harness<B>
where
    B: TransactionService + CounterpartyLookup + 'static,
{
    let bank = Arc::new(bank);
    let session = Arc::new(InMemorySession::new(
        dec!(10000),
        Some(PrimaryWallet {
            id: "WALLET-001".to_string(),
            currency_code: "NGN".to_string(),
        }),
    ));
    let navigator = Arc::new(RecordingNavigator::new());

    let mut verification = VerificationGateway::new();
    for provider in [
        LookupProvider::BankAccount,
        LookupProvider::Wallet,
        LookupProvider::Meter,
        LookupProvider::SmartCard,
    ] {
        verification = verification.with_lookup(provider, bank.clone());
    }

    let services = Arc::new(FlowServices::new(
        bank.clone(),
        verification,
        session.clone(),
        navigator.clone(),
        LimitTable::default(),
    ));

    Harness {
        bank,
        session,
        navigator,
        services,
    }
}

pub fn harness() -> Harness<SimulatedBank> {
    harness_with(simulated_bank())
}

pub fn bank_selection() -> Selection {
    Selection::BankTransfer {
        bank_id: "B1".to_string(),
        account_number: "0123456789".to_string(),
    }
}

/// A valid selection for every kind, matching the simulated directory.
pub fn selection_for(kind: TransactionKind) -> Selection {
    match kind {
        TransactionKind::BankTransfer => bank_selection(),
        TransactionKind::WalletTransfer => Selection::WalletTransfer {
            wallet_number: "W-77".to_string(),
        },
        TransactionKind::CryptoTransfer => Selection::CryptoTransfer {
            asset: "USDT".to_string(),
            network: "TRC20".to_string(),
            address: "TQ5NoR2bY8vT8s9vZ3sWm5yG7XnTzY1aB2".to_string(),
        },
        TransactionKind::CurrencySwap => Selection::CurrencySwap {
            from_currency: "NGN".to_string(),
            to_currency: "USD".to_string(),
        },
        TransactionKind::AirtimePurchase => Selection::AirtimePurchase {
            network: "MTN".to_string(),
            phone_number: "08030000000".to_string(),
        },
        TransactionKind::DataBundlePurchase => Selection::DataBundlePurchase {
            network: "MTN".to_string(),
            phone_number: "08030000000".to_string(),
            product_code: "1GB-30D".to_string(),
        },
        TransactionKind::ElectricityPurchase => Selection::ElectricityPurchase {
            disco: "IKEDC".to_string(),
            meter_number: "45012345678".to_string(),
            meter_type: MeterType::Prepaid,
        },
        TransactionKind::CableTvSubscription => Selection::CableTvSubscription {
            provider: "DSTV".to_string(),
            smart_card_number: "7012345678".to_string(),
            package_code: "COMPACT".to_string(),
        },
        TransactionKind::FixedDepositInvestment => Selection::FixedDepositInvestment {
            plan_id: "PLAN-90".to_string(),
            tenor_days: 90,
        },
    }
}

pub fn intent_for(kind: TransactionKind) -> FlowIntent {
    FlowIntent {
        selection: selection_for(kind),
        amount: "1000".to_string(),
        description: "test".to_string(),
        pin: "1234".to_string(),
    }
}

/// Yields until the flow has a call in flight.
pub async fn wait_until_pending(controller: &TransactionFlowController) -> FlowState {
    for _ in 0..10_000 {
        let state = controller.snapshot().await;
        if state.is_pending() {
            return state;
        }
        tokio::task::yield_now().await;
    }
    panic!("flow never became pending");
}

/// Wraps a `SimulatedBank` so every remote call waits for `release()`.
pub struct GatedBank {
    pub inner: SimulatedBank,
    gate: Semaphore,
}

impl GatedBank {
    pub fn new(inner: SimulatedBank) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    async fn pass(&self) {
        self.gate.acquire().await.expect("gate closed").forget();
    }
}

#[async_trait]
impl CounterpartyLookup for GatedBank {
    async fn lookup(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationResult, GatewayError> {
        self.pass().await;
        self.inner.lookup(request).await
    }
}

#[async_trait]
impl TransactionService for GatedBank {
    async fn initiate(&self, request: &TransactionRequest) -> Result<Quote, GatewayError> {
        self.pass().await;
        self.inner.initiate(request).await
    }

    async fn process(
        &self,
        request: &TransactionRequest,
        pin: &Pin,
    ) -> Result<TransactionOutcome, GatewayError> {
        self.pass().await;
        self.inner.process(request, pin).await
    }
}
