use crate::domain::pin::Pin;
use crate::domain::ports::TransactionServiceBox;
use crate::domain::transaction::{TransactionOutcome, TransactionRequest, failure_reason};
use crate::error::{FlowError, GatewayError, Result};

/// Performs the PIN-gated `process` call that commits a transaction.
///
/// Server-side rejections (wrong PIN, insufficient funds, expired quote) come
/// back as `TransactionOutcome::Failure`. Only transport problems and session
/// expiry are errors.
#[derive(Clone)]
pub struct AuthorizationGate {
    service: TransactionServiceBox,
}

impl AuthorizationGate {
    pub fn new(service: TransactionServiceBox) -> Self {
        Self { service }
    }

    pub async fn authorize(
        &self,
        request: &TransactionRequest,
        pin: &Pin,
    ) -> Result<TransactionOutcome> {
        match self.service.process(request, pin).await {
            Ok(outcome) => Ok(outcome),
            Err(GatewayError::Rejected { reason, message }) => {
                Ok(TransactionOutcome::Failure { reason, message })
            }
            Err(GatewayError::InsufficientFunds(message)) => Ok(TransactionOutcome::failure(
                failure_reason::INSUFFICIENT_FUNDS,
                message,
            )),
            Err(GatewayError::NotFound(message)) => {
                Ok(TransactionOutcome::failure(failure_reason::NOT_FOUND, message))
            }
            Err(GatewayError::SessionExpired) => Err(FlowError::SessionExpired),
            Err(GatewayError::Network(message) | GatewayError::MalformedResponse(message)) => {
                Err(FlowError::Network(message))
            }
        }
    }
}
