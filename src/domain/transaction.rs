use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Every kind of money movement the engine can guide a user through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    BankTransfer,
    WalletTransfer,
    CryptoTransfer,
    CurrencySwap,
    AirtimePurchase,
    DataBundlePurchase,
    ElectricityPurchase,
    CableTvSubscription,
    FixedDepositInvestment,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 9] = [
        TransactionKind::BankTransfer,
        TransactionKind::WalletTransfer,
        TransactionKind::CryptoTransfer,
        TransactionKind::CurrencySwap,
        TransactionKind::AirtimePurchase,
        TransactionKind::DataBundlePurchase,
        TransactionKind::ElectricityPurchase,
        TransactionKind::CableTvSubscription,
        TransactionKind::FixedDepositInvestment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::BankTransfer => "bank_transfer",
            TransactionKind::WalletTransfer => "wallet_transfer",
            TransactionKind::CryptoTransfer => "crypto_transfer",
            TransactionKind::CurrencySwap => "currency_swap",
            TransactionKind::AirtimePurchase => "airtime_purchase",
            TransactionKind::DataBundlePurchase => "data_bundle_purchase",
            TransactionKind::ElectricityPurchase => "electricity_purchase",
            TransactionKind::CableTvSubscription => "cable_tv_subscription",
            TransactionKind::FixedDepositInvestment => "fixed_deposit_investment",
        }
    }

    /// The lookup provider that identifies the counterparty, if this kind
    /// verifies one before amount entry.
    pub fn lookup_provider(&self) -> Option<LookupProvider> {
        match self {
            TransactionKind::BankTransfer => Some(LookupProvider::BankAccount),
            TransactionKind::WalletTransfer => Some(LookupProvider::Wallet),
            TransactionKind::ElectricityPurchase => Some(LookupProvider::Meter),
            TransactionKind::CableTvSubscription => Some(LookupProvider::SmartCard),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterType {
    Prepaid,
    Postpaid,
}

impl MeterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeterType::Prepaid => "prepaid",
            MeterType::Postpaid => "postpaid",
        }
    }
}

impl FromStr for MeterType {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prepaid" => Ok(MeterType::Prepaid),
            "postpaid" => Ok(MeterType::Postpaid),
            other => Err(SelectionError::InvalidField {
                field: "meter_type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("selection is for {found}, but this flow is {expected}")]
    KindMismatch {
        expected: TransactionKind,
        found: TransactionKind,
    },
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// The kind-specific choices captured on the `Selection` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    BankTransfer {
        bank_id: String,
        account_number: String,
    },
    WalletTransfer {
        wallet_number: String,
    },
    CryptoTransfer {
        asset: String,
        network: String,
        address: String,
    },
    CurrencySwap {
        from_currency: String,
        to_currency: String,
    },
    AirtimePurchase {
        network: String,
        phone_number: String,
    },
    DataBundlePurchase {
        network: String,
        phone_number: String,
        product_code: String,
    },
    ElectricityPurchase {
        disco: String,
        meter_number: String,
        meter_type: MeterType,
    },
    CableTvSubscription {
        provider: String,
        smart_card_number: String,
        package_code: String,
    },
    FixedDepositInvestment {
        plan_id: String,
        tenor_days: u32,
    },
}

fn require(field: &'static str, value: &str) -> Result<(), SelectionError> {
    if value.trim().is_empty() {
        Err(SelectionError::MissingField(field))
    } else {
        Ok(())
    }
}

fn require_digits(field: &'static str, value: &str) -> Result<(), SelectionError> {
    require(field, value)?;
    if value.trim().chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(SelectionError::InvalidField {
            field,
            value: value.to_string(),
        })
    }
}

fn require_phone(value: &str) -> Result<(), SelectionError> {
    require("phone_number", value)?;
    let digits = value.trim().strip_prefix('+').unwrap_or(value.trim());
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(SelectionError::InvalidField {
            field: "phone_number",
            value: value.to_string(),
        })
    }
}

impl Selection {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Selection::BankTransfer { .. } => TransactionKind::BankTransfer,
            Selection::WalletTransfer { .. } => TransactionKind::WalletTransfer,
            Selection::CryptoTransfer { .. } => TransactionKind::CryptoTransfer,
            Selection::CurrencySwap { .. } => TransactionKind::CurrencySwap,
            Selection::AirtimePurchase { .. } => TransactionKind::AirtimePurchase,
            Selection::DataBundlePurchase { .. } => TransactionKind::DataBundlePurchase,
            Selection::ElectricityPurchase { .. } => TransactionKind::ElectricityPurchase,
            Selection::CableTvSubscription { .. } => TransactionKind::CableTvSubscription,
            Selection::FixedDepositInvestment { .. } => TransactionKind::FixedDepositInvestment,
        }
    }

    /// Checks that every identifying field is present and well formed.
    pub fn validate(&self) -> Result<(), SelectionError> {
        match self {
            Selection::BankTransfer {
                bank_id,
                account_number,
            } => {
                require("bank_id", bank_id)?;
                require_digits("account_number", account_number)
            }
            Selection::WalletTransfer { wallet_number } => require("wallet_number", wallet_number),
            Selection::CryptoTransfer {
                asset,
                network,
                address,
            } => {
                require("asset", asset)?;
                require("network", network)?;
                require("address", address)
            }
            Selection::CurrencySwap {
                from_currency,
                to_currency,
            } => {
                require("from_currency", from_currency)?;
                require("to_currency", to_currency)?;
                if from_currency.trim().eq_ignore_ascii_case(to_currency.trim()) {
                    return Err(SelectionError::InvalidField {
                        field: "to_currency",
                        value: to_currency.clone(),
                    });
                }
                Ok(())
            }
            Selection::AirtimePurchase {
                network,
                phone_number,
            } => {
                require("network", network)?;
                require_phone(phone_number)
            }
            Selection::DataBundlePurchase {
                network,
                phone_number,
                product_code,
            } => {
                require("network", network)?;
                require_phone(phone_number)?;
                require("product_code", product_code)
            }
            Selection::ElectricityPurchase {
                disco,
                meter_number,
                ..
            } => {
                require("disco", disco)?;
                require_digits("meter_number", meter_number)
            }
            Selection::CableTvSubscription {
                provider,
                smart_card_number,
                package_code,
            } => {
                require("provider", provider)?;
                require_digits("smart_card_number", smart_card_number)?;
                require("package_code", package_code)
            }
            Selection::FixedDepositInvestment {
                plan_id,
                tenor_days,
            } => {
                require("plan_id", plan_id)?;
                if *tenor_days == 0 {
                    return Err(SelectionError::InvalidField {
                        field: "tenor_days",
                        value: tenor_days.to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    /// The counterparty lookup for this selection, if its kind verifies one.
    pub fn lookup(&self) -> Option<VerificationRequest> {
        match self {
            Selection::BankTransfer {
                bank_id,
                account_number,
            } => Some(VerificationRequest::BankAccount {
                account_number: account_number.trim().to_string(),
                bank_id: bank_id.trim().to_string(),
            }),
            Selection::WalletTransfer { wallet_number } => Some(VerificationRequest::Wallet {
                wallet_number: wallet_number.trim().to_string(),
            }),
            Selection::ElectricityPurchase {
                disco,
                meter_number,
                meter_type,
            } => Some(VerificationRequest::Meter {
                meter_number: meter_number.trim().to_string(),
                disco: disco.trim().to_string(),
                meter_type: *meter_type,
            }),
            Selection::CableTvSubscription {
                provider,
                smart_card_number,
                ..
            } => Some(VerificationRequest::SmartCard {
                card_number: smart_card_number.trim().to_string(),
                provider: provider.trim().to_string(),
            }),
            _ => None,
        }
    }

    /// The value sent as `destination` in the remote payload.
    pub fn destination(&self) -> String {
        let destination = match self {
            Selection::BankTransfer { account_number, .. } => account_number,
            Selection::WalletTransfer { wallet_number } => wallet_number,
            Selection::CryptoTransfer { address, .. } => address,
            Selection::CurrencySwap { to_currency, .. } => to_currency,
            Selection::AirtimePurchase { phone_number, .. } => phone_number,
            Selection::DataBundlePurchase { phone_number, .. } => phone_number,
            Selection::ElectricityPurchase { meter_number, .. } => meter_number,
            Selection::CableTvSubscription {
                smart_card_number, ..
            } => smart_card_number,
            Selection::FixedDepositInvestment { plan_id, .. } => plan_id,
        };
        destination.trim().to_string()
    }

    /// Kind-specific identification fields sent alongside the payload.
    pub fn identification_fields(&self) -> BTreeMap<String, String> {
        let pairs: Vec<(&str, String)> = match self {
            Selection::BankTransfer { bank_id, .. } => vec![("bank_id", bank_id.clone())],
            Selection::WalletTransfer { .. } => vec![],
            Selection::CryptoTransfer { asset, network, .. } => {
                vec![("asset", asset.clone()), ("network", network.clone())]
            }
            Selection::CurrencySwap { from_currency, .. } => {
                vec![("from_currency", from_currency.clone())]
            }
            Selection::AirtimePurchase { network, .. } => vec![("network", network.clone())],
            Selection::DataBundlePurchase {
                network,
                product_code,
                ..
            } => vec![
                ("network", network.clone()),
                ("product_code", product_code.clone()),
            ],
            Selection::ElectricityPurchase {
                disco, meter_type, ..
            } => vec![
                ("disco", disco.clone()),
                ("meter_type", meter_type.as_str().to_string()),
            ],
            Selection::CableTvSubscription {
                provider,
                package_code,
                ..
            } => vec![
                ("provider", provider.clone()),
                ("package_code", package_code.clone()),
            ],
            Selection::FixedDepositInvestment { tenor_days, .. } => {
                vec![("tenor_days", tenor_days.to_string())]
            }
        };
        pairs
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.trim().to_string()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupProvider {
    BankAccount,
    Wallet,
    Meter,
    SmartCard,
}

/// One counterparty lookup, in the shape its provider expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "lookup", rename_all = "snake_case")]
pub enum VerificationRequest {
    BankAccount {
        account_number: String,
        bank_id: String,
    },
    Wallet {
        wallet_number: String,
    },
    Meter {
        meter_number: String,
        disco: String,
        meter_type: MeterType,
    },
    SmartCard {
        card_number: String,
        provider: String,
    },
}

impl VerificationRequest {
    pub fn provider(&self) -> LookupProvider {
        match self {
            VerificationRequest::BankAccount { .. } => LookupProvider::BankAccount,
            VerificationRequest::Wallet { .. } => LookupProvider::Wallet,
            VerificationRequest::Meter { .. } => LookupProvider::Meter,
            VerificationRequest::SmartCard { .. } => LookupProvider::SmartCard,
        }
    }

    /// A stable key naming the looked-up counterparty, e.g. `B1:0123456789`.
    pub fn reference(&self) -> String {
        match self {
            VerificationRequest::BankAccount {
                account_number,
                bank_id,
            } => format!("{bank_id}:{account_number}"),
            VerificationRequest::Wallet { wallet_number } => wallet_number.clone(),
            VerificationRequest::Meter {
                meter_number,
                disco,
                ..
            } => format!("{disco}:{meter_number}"),
            VerificationRequest::SmartCard {
                card_number,
                provider,
            } => format!("{provider}:{card_number}"),
        }
    }
}

/// Normalized result of any counterparty lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub counterparty_name: String,
    #[serde(default)]
    pub counterparty_meta: BTreeMap<String, String>,
    /// Provider payload, kept as-is for the receipt boundary.
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl VerificationResult {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            counterparty_name: name.into(),
            counterparty_meta: BTreeMap::new(),
            raw: serde_json::Value::Null,
        }
    }
}

/// The logical payload shared by the initiate and process calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub kind: TransactionKind,
    pub source: String,
    pub destination: String,
    pub amount: Decimal,
    pub description: String,
    pub fields: BTreeMap<String, String>,
}

/// Server-computed fee preview for a prospective transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub currency_code: String,
    pub currency_symbol: String,
    pub amount_processable: Decimal,
    pub platform_fee: Decimal,
    pub total_processable: Decimal,
    pub balance_before: Decimal,
    pub balance_after_expected: Decimal,
}

impl Quote {
    /// Whether the server's total matches its own amount and fee.
    pub fn is_consistent(&self) -> bool {
        self.total_processable == self.amount_processable + self.platform_fee
    }
}

/// Failure reasons the remote service is known to send.
pub mod failure_reason {
    pub const INVALID_PIN: &str = "invalid_pin";
    pub const INSUFFICIENT_FUNDS: &str = "insufficient_funds";
    pub const AMOUNT_MISMATCH: &str = "amount_mismatch";
    pub const QUOTE_EXPIRED: &str = "quote_expired";
    pub const NOT_FOUND: &str = "not_found";
}

/// Terminal result of an authorization attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransactionOutcome {
    Success {
        reference: String,
        instrument_code: Option<String>,
        amount_charged: Decimal,
        fee: Decimal,
        balance_after: Decimal,
    },
    Failure {
        reason: String,
        message: String,
    },
}

impl TransactionOutcome {
    pub fn failure(reason: impl Into<String>, message: impl Into<String>) -> Self {
        TransactionOutcome::Failure {
            reason: reason.into(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransactionOutcome::Success { .. })
    }

    /// Whether this failure means the held quote no longer matches what the
    /// server is willing to commit.
    pub fn invalidates_quote(&self) -> bool {
        match self {
            TransactionOutcome::Failure { reason, .. } => matches!(
                reason.as_str(),
                failure_reason::INSUFFICIENT_FUNDS
                    | failure_reason::AMOUNT_MISMATCH
                    | failure_reason::QUOTE_EXPIRED
            ),
            TransactionOutcome::Success { .. } => false,
        }
    }
}
