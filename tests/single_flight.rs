mod common;

use common::{GatedBank, bank_selection, harness_with, simulated_bank, wait_until_pending};
use rust_decimal_macros::dec;
use txflow::domain::flow::{FlowStatus, StepInput};
use txflow::domain::plan::StepId;
use txflow::domain::transaction::TransactionKind;
use txflow::error::FlowError;
use txflow::infrastructure::in_memory::NavigationEvent;

#[tokio::test]
async fn test_second_advance_while_pending_is_rejected() {
    let h = harness_with(GatedBank::new(simulated_bank()));
    let flow = h.start(TransactionKind::BankTransfer);
    flow.advance(StepInput::Select(bank_selection())).await.unwrap();

    let first = tokio::spawn({
        let flow = flow.clone();
        async move { flow.advance(StepInput::Confirm).await }
    });
    let pending = wait_until_pending(&flow).await;
    assert!(!pending.primary_action_enabled());

    assert_eq!(flow.advance(StepInput::Confirm).await, Err(FlowError::Busy));
    assert_eq!(flow.retreat().await, Err(FlowError::Busy));

    h.bank.release();
    let state = first.await.unwrap().unwrap();
    assert_eq!(state.current_step, StepId::AmountEntry);
    assert_eq!(state.status, FlowStatus::Active);
    assert_eq!(h.bank.inner.calls().await.lookups, 1);
}

#[tokio::test]
async fn test_response_after_abandon_is_discarded() {
    let h = harness_with(GatedBank::new(simulated_bank()));
    let flow = h.start(TransactionKind::AirtimePurchase);
    flow.advance(StepInput::Select(common::selection_for(
        TransactionKind::AirtimePurchase,
    )))
    .await
    .unwrap();
    flow.advance(StepInput::Amount {
        text: "500".to_string(),
        description: String::new(),
    })
    .await
    .unwrap();

    let commit = tokio::spawn({
        let flow = flow.clone();
        async move { flow.advance(StepInput::Pin("1234".to_string())).await }
    });
    wait_until_pending(&flow).await;

    let state = flow.abandon().await.unwrap();
    assert_eq!(state.status, FlowStatus::Abandoned);

    // The server still debits; the flow must not act on it
    h.bank.release();
    assert_eq!(commit.await.unwrap(), Err(FlowError::Discarded));
    assert_eq!(h.bank.inner.balance().await, dec!(9490));

    let state = flow.snapshot().await;
    assert_eq!(state.status, FlowStatus::Abandoned);
    assert_eq!(state.current_step, StepId::Authorization);
    assert!(state.outcome.is_none());
    assert_eq!(h.session.current_balance().await, dec!(10000));
    assert_eq!(h.session.balance_writes().await, 0);
    assert_eq!(
        h.navigator.events().await,
        vec![NavigationEvent::Abandoned(TransactionKind::AirtimePurchase)]
    );
}

#[tokio::test]
async fn test_snapshot_stays_available_while_pending() {
    let h = harness_with(GatedBank::new(simulated_bank()));
    let flow = h.start(TransactionKind::CurrencySwap);
    flow.advance(StepInput::Select(common::selection_for(TransactionKind::CurrencySwap)))
        .await
        .unwrap();
    flow.advance(StepInput::Amount {
        text: "1000".to_string(),
        description: String::new(),
    })
    .await
    .unwrap();

    let quote = tokio::spawn({
        let flow = flow.clone();
        async move { flow.advance(StepInput::Confirm).await }
    });
    let pending = wait_until_pending(&flow).await;
    assert_eq!(pending.current_step, StepId::Quote);
    assert!(pending.quote.is_none());

    h.bank.release();
    let state = quote.await.unwrap().unwrap();
    assert_eq!(state.current_step, StepId::Authorization);
    assert!(state.quote.is_some());
}

#[tokio::test]
async fn test_double_pin_submit_commits_once() {
    let h = harness_with(GatedBank::new(simulated_bank()));
    let flow = h.start(TransactionKind::AirtimePurchase);
    flow.advance(StepInput::Select(common::selection_for(
        TransactionKind::AirtimePurchase,
    )))
    .await
    .unwrap();
    flow.advance(StepInput::Amount {
        text: "500".to_string(),
        description: String::new(),
    })
    .await
    .unwrap();

    let commit = tokio::spawn({
        let flow = flow.clone();
        async move { flow.advance(StepInput::Pin("1234".to_string())).await }
    });
    wait_until_pending(&flow).await;

    assert_eq!(
        flow.advance(StepInput::Pin("1234".to_string())).await,
        Err(FlowError::Busy)
    );

    h.bank.release();
    let state = commit.await.unwrap().unwrap();
    assert_eq!(state.status, FlowStatus::Completed);
    assert_eq!(state.pin_attempts, 1);
    assert_eq!(h.bank.inner.calls().await.processes, 1);
    assert_eq!(h.bank.inner.balance().await, dec!(9490));
    assert_eq!(h.session.balance_writes().await, 1);
}

#[tokio::test]
async fn test_session_expiry_after_abandon_still_logs_out() {
    let h = harness_with(GatedBank::new(simulated_bank()));
    let flow = h.start(TransactionKind::BankTransfer);
    flow.advance(StepInput::Select(bank_selection())).await.unwrap();

    let verify = tokio::spawn({
        let flow = flow.clone();
        async move { flow.advance(StepInput::Confirm).await }
    });
    wait_until_pending(&flow).await;
    flow.abandon().await.unwrap();

    h.bank.inner.expire_session().await;
    h.bank.release();
    assert_eq!(verify.await.unwrap(), Err(FlowError::Discarded));

    assert!(h.session.is_logged_out().await);
    let state = flow.snapshot().await;
    assert_eq!(state.status, FlowStatus::Abandoned);
    assert!(state.last_error.is_none());
}
