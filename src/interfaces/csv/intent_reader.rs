use crate::domain::flow::FlowIntent;
use crate::domain::transaction::{Selection, SelectionError, TransactionKind};
use crate::error::AppError;
use serde::Deserialize;
use std::io::Read;

/// One CSV row: a transaction intent in a kind-agnostic column layout.
///
/// `target` is the main identifier (account, wallet, phone, meter, card,
/// address, plan). `provider` and `variant` carry the secondary choices whose
/// meaning depends on `kind`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct IntentRecord {
    pub kind: TransactionKind,
    pub target: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub variant: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pin: String,
}

impl TryFrom<IntentRecord> for FlowIntent {
    type Error = SelectionError;

    fn try_from(record: IntentRecord) -> Result<Self, Self::Error> {
        let IntentRecord {
            kind,
            target,
            provider,
            variant,
            amount,
            description,
            pin,
        } = record;

        let selection = match kind {
            TransactionKind::BankTransfer => Selection::BankTransfer {
                bank_id: provider,
                account_number: target,
            },
            TransactionKind::WalletTransfer => Selection::WalletTransfer {
                wallet_number: target,
            },
            TransactionKind::CryptoTransfer => Selection::CryptoTransfer {
                asset: provider,
                network: variant,
                address: target,
            },
            TransactionKind::CurrencySwap => Selection::CurrencySwap {
                from_currency: provider,
                to_currency: target,
            },
            TransactionKind::AirtimePurchase => Selection::AirtimePurchase {
                network: provider,
                phone_number: target,
            },
            TransactionKind::DataBundlePurchase => Selection::DataBundlePurchase {
                network: provider,
                phone_number: target,
                product_code: variant,
            },
            TransactionKind::ElectricityPurchase => Selection::ElectricityPurchase {
                disco: provider,
                meter_number: target,
                meter_type: variant.parse()?,
            },
            TransactionKind::CableTvSubscription => Selection::CableTvSubscription {
                provider,
                smart_card_number: target,
                package_code: variant,
            },
            TransactionKind::FixedDepositInvestment => Selection::FixedDepositInvestment {
                plan_id: target,
                tenor_days: variant.trim().parse().map_err(|_| SelectionError::InvalidField {
                    field: "tenor_days",
                    value: variant.clone(),
                })?,
            },
        };

        Ok(FlowIntent {
            selection,
            amount,
            description,
            pin,
        })
    }
}

/// Reads flow intents from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths.
/// Short rows are padded with empty fields, so trailing optional columns may
/// be left off.
pub struct IntentReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> IntentReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and converts each row.
    pub fn intents(mut self) -> impl Iterator<Item = Result<FlowIntent, AppError>> {
        let headers = self.reader.headers().cloned().unwrap_or_default();
        self.reader.into_records().map(move |result| {
            let mut row = result?;
            while row.len() < headers.len() {
                row.push_field("");
            }
            let record: IntentRecord = row.deserialize(Some(&headers))?;
            FlowIntent::try_from(record).map_err(|err| AppError::IntentError(err.to_string()))
        })
    }
}
