use crate::domain::ports::CounterpartyLookupBox;
use crate::domain::transaction::{
    LookupProvider, TransactionKind, VerificationRequest, VerificationResult,
};
use crate::error::{FlowError, GatewayError, Result};
use std::collections::HashMap;

/// Routes counterparty lookups to the provider registered for them and
/// normalizes the answer.
///
/// Results are never cached: every call performs a live lookup.
#[derive(Default, Clone)]
pub struct VerificationGateway {
    lookups: HashMap<LookupProvider, CounterpartyLookupBox>,
}

impl VerificationGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the lookup used for `provider`, replacing any previous one.
    pub fn with_lookup(mut self, provider: LookupProvider, lookup: CounterpartyLookupBox) -> Self {
        self.lookups.insert(provider, lookup);
        self
    }

    pub async fn verify(
        &self,
        kind: TransactionKind,
        request: &VerificationRequest,
    ) -> Result<VerificationResult> {
        let provider = request.provider();
        if kind.lookup_provider() != Some(provider) {
            return Err(FlowError::Unexpected(format!(
                "{kind} does not verify counterparties via {provider:?}"
            )));
        }
        let lookup = self.lookups.get(&provider).ok_or_else(|| {
            FlowError::Unexpected(format!("no lookup registered for {provider:?}"))
        })?;

        let mut result = lookup.lookup(request).await.map_err(lookup_error)?;

        let name = result.counterparty_name.trim().to_string();
        if name.is_empty() {
            return Err(FlowError::Verification(format!(
                "no counterparty name returned for {}",
                request.reference()
            )));
        }
        result.counterparty_name = name;
        Ok(result)
    }
}

fn lookup_error(err: GatewayError) -> FlowError {
    match err {
        GatewayError::NotFound(message) => FlowError::Verification(message),
        GatewayError::Rejected { message, .. } => FlowError::Verification(message),
        GatewayError::SessionExpired => FlowError::SessionExpired,
        GatewayError::Network(message) | GatewayError::MalformedResponse(message) => {
            FlowError::Network(message)
        }
        GatewayError::InsufficientFunds(message) => FlowError::InsufficientFunds(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CounterpartyLookup;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedLookup {
        answer: std::result::Result<VerificationResult, GatewayError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CounterpartyLookup for FixedLookup {
        async fn lookup(
            &self,
            _request: &VerificationRequest,
        ) -> std::result::Result<VerificationResult, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    fn bank_request() -> VerificationRequest {
        VerificationRequest::BankAccount {
            account_number: "0123456789".to_string(),
            bank_id: "B1".to_string(),
        }
    }

    fn gateway_with(
        answer: std::result::Result<VerificationResult, GatewayError>,
    ) -> (VerificationGateway, Arc<FixedLookup>) {
        let lookup = Arc::new(FixedLookup {
            answer,
            calls: AtomicUsize::new(0),
        });
        let gateway =
            VerificationGateway::new().with_lookup(LookupProvider::BankAccount, lookup.clone());
        (gateway, lookup)
    }

    #[tokio::test]
    async fn test_verify_normalizes_name_and_does_not_cache() {
        let (gateway, lookup) = gateway_with(Ok(VerificationResult::named("  Jane Doe ")));

        let result = gateway
            .verify(TransactionKind::BankTransfer, &bank_request())
            .await
            .unwrap();
        assert_eq!(result.counterparty_name, "Jane Doe");

        gateway
            .verify(TransactionKind::BankTransfer, &bank_request())
            .await
            .unwrap();
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_verify_maps_errors() {
        let (gateway, _) = gateway_with(Err(GatewayError::NotFound("unknown account".to_string())));
        assert_eq!(
            gateway.verify(TransactionKind::BankTransfer, &bank_request()).await,
            Err(FlowError::Verification("unknown account".to_string()))
        );

        let (gateway, _) = gateway_with(Err(GatewayError::SessionExpired));
        assert_eq!(
            gateway.verify(TransactionKind::BankTransfer, &bank_request()).await,
            Err(FlowError::SessionExpired)
        );

        let (gateway, _) = gateway_with(Err(GatewayError::Network("timeout".to_string())));
        assert_eq!(
            gateway.verify(TransactionKind::BankTransfer, &bank_request()).await,
            Err(FlowError::Network("timeout".to_string()))
        );
    }

    #[tokio::test]
    async fn test_verify_rejects_blank_name() {
        let (gateway, _) = gateway_with(Ok(VerificationResult::named("   ")));
        assert!(matches!(
            gateway.verify(TransactionKind::BankTransfer, &bank_request()).await,
            Err(FlowError::Verification(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_rejects_provider_mismatch() {
        let (gateway, lookup) = gateway_with(Ok(VerificationResult::named("Jane Doe")));
        let result = gateway
            .verify(TransactionKind::WalletTransfer, &bank_request())
            .await;
        assert!(matches!(result, Err(FlowError::Unexpected(_))));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }
}
