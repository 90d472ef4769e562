use crate::domain::flow::{FlowState, FlowStatus};
use crate::domain::transaction::{TransactionKind, TransactionOutcome};
use crate::error::{AppError, FlowError};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// One output row per intent.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct OutcomeRecord {
    pub row: usize,
    pub kind: TransactionKind,
    pub status: &'static str,
    pub reference: Option<String>,
    pub instrument_code: Option<String>,
    pub amount: Option<Decimal>,
    pub fee: Option<Decimal>,
    pub balance_after: Option<Decimal>,
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl OutcomeRecord {
    fn empty(row: usize, kind: TransactionKind, status: &'static str) -> Self {
        Self {
            row,
            kind,
            status,
            reference: None,
            instrument_code: None,
            amount: None,
            fee: None,
            balance_after: None,
            reason: None,
            message: None,
        }
    }

    /// Builds the row for a flow that ended normally.
    pub fn from_state(row: usize, state: &FlowState) -> Self {
        match &state.outcome {
            Some(TransactionOutcome::Success {
                reference,
                instrument_code,
                amount_charged,
                fee,
                balance_after,
            }) => Self {
                reference: Some(reference.clone()),
                instrument_code: instrument_code.clone(),
                amount: Some(*amount_charged),
                fee: Some(*fee),
                balance_after: Some(*balance_after),
                ..Self::empty(row, state.kind, "success")
            },
            Some(TransactionOutcome::Failure { reason, message }) => Self {
                reason: Some(reason.clone()),
                message: Some(message.clone()),
                ..Self::empty(row, state.kind, "failure")
            },
            None => {
                let status = match state.status {
                    FlowStatus::Abandoned => "abandoned",
                    FlowStatus::SessionExpired => "session_expired",
                    _ => "incomplete",
                };
                Self::empty(row, state.kind, status)
            }
        }
    }

    /// Builds the row for a flow that stopped on an error.
    pub fn from_error(row: usize, kind: TransactionKind, err: &FlowError) -> Self {
        Self {
            message: Some(err.to_string()),
            ..Self::empty(row, kind, "error")
        }
    }
}

/// Writes outcome rows as CSV.
pub struct OutcomeWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write(&mut self, record: &OutcomeRecord) -> Result<(), AppError> {
        self.writer.serialize(record)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(), AppError> {
        self.writer.flush()?;
        Ok(())
    }
}
