use crate::domain::ports::TransactionServiceBox;
use crate::domain::transaction::{Quote, TransactionRequest, failure_reason};
use crate::error::{FlowError, GatewayError, Result};

/// Obtains fee quotes through the non-committing `initiate` call.
#[derive(Clone)]
pub struct QuoteGateway {
    service: TransactionServiceBox,
}

impl QuoteGateway {
    pub fn new(service: TransactionServiceBox) -> Self {
        Self { service }
    }

    /// Requests a quote for `request`. Safe to repeat; nothing is committed.
    ///
    /// The fee and total are taken from the server as-is. A quote whose total
    /// disagrees with its own amount and fee is rejected rather than shown.
    pub async fn initiate(&self, request: &TransactionRequest) -> Result<Quote> {
        let quote = self.service.initiate(request).await.map_err(initiate_error)?;
        if !quote.is_consistent() {
            tracing::warn!(
                kind = %request.kind,
                total = %quote.total_processable,
                "quote total does not match amount plus fee"
            );
            return Err(FlowError::Network(
                "received an inconsistent quote, please try again".to_string(),
            ));
        }
        Ok(quote)
    }
}

fn initiate_error(err: GatewayError) -> FlowError {
    match err {
        GatewayError::InsufficientFunds(message) => FlowError::InsufficientFunds(message),
        GatewayError::SessionExpired => FlowError::SessionExpired,
        GatewayError::Rejected { reason, message } => FlowError::Rejected { reason, message },
        GatewayError::NotFound(message) => FlowError::Rejected {
            reason: failure_reason::NOT_FOUND.to_string(),
            message,
        },
        GatewayError::Network(message) | GatewayError::MalformedResponse(message) => {
            FlowError::Network(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pin::Pin;
    use crate::domain::ports::TransactionService;
    use crate::domain::transaction::{TransactionKind, TransactionOutcome};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct QuoteOnly(std::result::Result<Quote, GatewayError>);

    #[async_trait]
    impl TransactionService for QuoteOnly {
        async fn initiate(
            &self,
            _request: &TransactionRequest,
        ) -> std::result::Result<Quote, GatewayError> {
            self.0.clone()
        }

        async fn process(
            &self,
            _request: &TransactionRequest,
            _pin: &Pin,
        ) -> std::result::Result<TransactionOutcome, GatewayError> {
            Err(GatewayError::Network("not used".to_string()))
        }
    }

    fn request() -> TransactionRequest {
        TransactionRequest {
            kind: TransactionKind::BankTransfer,
            source: "WALLET-001".to_string(),
            destination: "0123456789".to_string(),
            amount: dec!(2000),
            description: String::new(),
            fields: BTreeMap::new(),
        }
    }

    fn quote(total: rust_decimal::Decimal) -> Quote {
        Quote {
            currency_code: "NGN".to_string(),
            currency_symbol: "₦".to_string(),
            amount_processable: dec!(2000),
            platform_fee: dec!(10),
            total_processable: total,
            balance_before: dec!(10000),
            balance_after_expected: dec!(10000) - total,
        }
    }

    #[tokio::test]
    async fn test_initiate_returns_server_quote() {
        let gateway = QuoteGateway::new(Arc::new(QuoteOnly(Ok(quote(dec!(2010))))));
        let result = gateway.initiate(&request()).await.unwrap();
        assert_eq!(result.total_processable, dec!(2010));
        assert_eq!(result.balance_after_expected, dec!(7990));
    }

    #[tokio::test]
    async fn test_initiate_rejects_inconsistent_quote() {
        let gateway = QuoteGateway::new(Arc::new(QuoteOnly(Ok(quote(dec!(2000))))));
        assert!(matches!(
            gateway.initiate(&request()).await,
            Err(FlowError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_initiate_maps_insufficient_funds() {
        let gateway = QuoteGateway::new(Arc::new(QuoteOnly(Err(
            GatewayError::InsufficientFunds("balance too low".to_string()),
        ))));
        assert_eq!(
            gateway.initiate(&request()).await,
            Err(FlowError::InsufficientFunds("balance too low".to_string()))
        );
    }
}
