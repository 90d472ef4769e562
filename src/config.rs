use crate::domain::amount::AmountLimits;
use crate::domain::transaction::TransactionKind;
use crate::error::AppError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Amount limits per transaction kind. Kinds without an entry fall back to
/// the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LimitTable(HashMap<TransactionKind, AmountLimits>);

impl LimitTable {
    pub fn get(&self, kind: TransactionKind) -> AmountLimits {
        self.0
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_limits(kind))
    }

    pub fn with(mut self, kind: TransactionKind, limits: AmountLimits) -> Self {
        self.0.insert(kind, limits);
        self
    }
}

fn default_limits(kind: TransactionKind) -> AmountLimits {
    match kind {
        TransactionKind::BankTransfer => AmountLimits::new(dec!(100), Some(dec!(5000000))),
        TransactionKind::WalletTransfer => AmountLimits::new(dec!(50), Some(dec!(5000000))),
        TransactionKind::CryptoTransfer => AmountLimits::new(dec!(1), None),
        TransactionKind::CurrencySwap => AmountLimits::new(dec!(1), None),
        TransactionKind::AirtimePurchase => AmountLimits::new(dec!(50), Some(dec!(50000))),
        TransactionKind::DataBundlePurchase => AmountLimits::new(dec!(50), Some(dec!(100000))),
        TransactionKind::ElectricityPurchase => AmountLimits::new(dec!(500), Some(dec!(500000))),
        TransactionKind::CableTvSubscription => AmountLimits::new(dec!(100), Some(dec!(500000))),
        TransactionKind::FixedDepositInvestment => AmountLimits::new(dec!(1000), None),
    }
}

/// A counterparty known to the simulated remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartyEntry {
    /// Lookup reference, e.g. `B1:0123456789` for a bank account.
    pub reference: String,
    pub name: String,
}

/// Settings for the in-process simulated remote service used by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub opening_balance: Decimal,
    pub currency_code: String,
    pub currency_symbol: String,
    pub flat_fee: Decimal,
    pub pin: String,
    pub primary_wallet_id: String,
    pub counterparties: Vec<CounterpartyEntry>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            opening_balance: dec!(10000),
            currency_code: "NGN".to_string(),
            currency_symbol: "₦".to_string(),
            flat_fee: dec!(10),
            pin: "1234".to_string(),
            primary_wallet_id: "WALLET-001".to_string(),
            counterparties: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub limits: LimitTable,
    pub simulator: SimulatorConfig,
}

impl EngineConfig {
    /// Loads a JSON config file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => {
                let reader = BufReader::new(File::open(path)?);
                Ok(serde_json::from_reader(reader)?)
            }
            None => Ok(Self::default()),
        }
    }
}
