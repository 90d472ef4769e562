use crate::application::authorization::AuthorizationGate;
use crate::application::quote::QuoteGateway;
use crate::application::reconciler::BalanceReconciler;
use crate::application::verification::VerificationGateway;
use crate::config::LimitTable;
use crate::domain::flow::{FlowState, FlowStatus, HeldQuote, StepInput};
use crate::domain::pin::Pin;
use crate::domain::plan::{StepGateway, StepId, StepPlan};
use crate::domain::ports::{NavigatorBox, SessionBox, TransactionServiceBox};
use crate::domain::transaction::{
    Selection, SelectionError, TransactionKind, TransactionOutcome, TransactionRequest,
    VerificationRequest, VerificationResult,
};
use crate::error::{FlowError, Result, ValidationError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

/// Collaborators shared by every flow of a session.
pub struct FlowServices {
    pub verification: VerificationGateway,
    pub quotes: QuoteGateway,
    pub authorization: AuthorizationGate,
    pub reconciler: BalanceReconciler,
    pub session: SessionBox,
    pub navigator: NavigatorBox,
    pub limits: LimitTable,
}

impl FlowServices {
    /// Wires the gateways around one remote transaction service.
    pub fn new(
        service: TransactionServiceBox,
        verification: VerificationGateway,
        session: SessionBox,
        navigator: NavigatorBox,
        limits: LimitTable,
    ) -> Self {
        Self {
            verification,
            quotes: QuoteGateway::new(service.clone()),
            authorization: AuthorizationGate::new(service),
            reconciler: BalanceReconciler::new(session.clone()),
            session,
            navigator,
            limits,
        }
    }
}

/// A remote call prepared by a step whose input passed validation.
enum StepCall {
    Verify(VerificationRequest),
    Initiate(TransactionRequest),
    Authorize(TransactionRequest, Pin),
}

enum StepResponse {
    Verified(VerificationResult),
    Quoted(HeldQuote),
    Committed(TransactionOutcome),
}

/// Drives one flow through the step plan of its transaction kind.
///
/// The handle is cheap to clone; clones share the same `FlowState`. The state
/// lock is released while a gateway call is in flight, so `abandon` and
/// `snapshot` stay responsive. The `Pending` status keeps a second `advance`
/// from starting another call, and a response that arrives after the flow was
/// abandoned is dropped without touching the state or the session balance.
#[derive(Clone)]
pub struct TransactionFlowController {
    plan: StepPlan,
    services: Arc<FlowServices>,
    state: Arc<Mutex<FlowState>>,
}

impl TransactionFlowController {
    pub fn start(kind: TransactionKind, services: Arc<FlowServices>) -> Self {
        tracing::info!(%kind, "starting transaction flow");
        Self {
            plan: StepPlan::for_kind(kind),
            services,
            state: Arc::new(Mutex::new(FlowState::new(kind))),
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.plan.kind()
    }

    pub fn plan(&self) -> StepPlan {
        self.plan
    }

    /// A copy of the current state, for rendering.
    pub async fn snapshot(&self) -> FlowState {
        self.state.lock().await.clone()
    }

    /// Submits the current step's input.
    ///
    /// Invalid input is rejected without touching the state. Valid input on a
    /// local step moves the flow on immediately; otherwise the step's gateway
    /// is called and the flow moves on only if the call succeeds. Gateway
    /// errors are recorded on the state and returned.
    #[instrument(skip_all, fields(kind = %self.plan.kind()))]
    pub async fn advance(&self, input: StepInput) -> Result<FlowState> {
        let (step, call) = {
            let mut state = self.state.lock().await;
            ensure_interactive(&state)?;
            let step = state.current_step;

            match self.prepare(&mut state, input).await? {
                None => {
                    self.move_forward(&mut state);
                    return Ok(state.clone());
                }
                Some(call) => {
                    if let StepCall::Authorize(..) = call {
                        state.pin_attempts += 1;
                    }
                    state.status = FlowStatus::Pending;
                    state.last_error = None;
                    (step, call)
                }
            }
        };

        tracing::debug!(%step, "calling step gateway");
        let response = self.execute(call).await;

        let mut state = self.state.lock().await;
        if state.status != FlowStatus::Pending {
            tracing::debug!(%step, status = ?state.status, "discarding late gateway response");
            // An expired session outlives the flow that noticed it
            if matches!(response, Err(FlowError::SessionExpired)) {
                tracing::warn!("session expired after the flow ended, forcing logout");
                self.services.session.force_logout().await;
            }
            return Err(FlowError::Discarded);
        }
        state.status = FlowStatus::Active;

        match response {
            Ok(response) => {
                self.apply(&mut state, response).await;
                Ok(state.clone())
            }
            Err(err) => Err(self.record_error(&mut state, err).await),
        }
    }

    /// Steps back to the previous step of the plan.
    ///
    /// Going back to `Quote` or earlier drops the held quote; going back to
    /// `Verification` or earlier drops the verified counterparty. Stepping
    /// back from the first step abandons the flow.
    #[instrument(skip_all, fields(kind = %self.plan.kind()))]
    pub async fn retreat(&self) -> Result<FlowState> {
        let mut state = self.state.lock().await;
        ensure_interactive(&state)?;

        match self.plan.previous(state.current_step) {
            None => self.terminate(&mut state).await,
            Some(previous) => {
                tracing::debug!(from = %state.current_step, to = %previous, "retreating");
                state.current_step = previous;
                if previous <= StepId::Quote {
                    state.quote = None;
                }
                if previous <= StepId::Verification {
                    state.verification = None;
                }
                state.last_error = None;
                state.last_failure = None;
            }
        }
        Ok(state.clone())
    }

    /// Ends the flow. Allowed while a call is pending; its response will be
    /// discarded.
    #[instrument(skip_all, fields(kind = %self.plan.kind()))]
    pub async fn abandon(&self) -> Result<FlowState> {
        let mut state = self.state.lock().await;
        if state.status.is_terminal() {
            return Err(FlowError::Finished);
        }
        self.terminate(&mut state).await;
        Ok(state.clone())
    }

    /// Accepts the last commit failure as the flow's result.
    #[instrument(skip_all, fields(kind = %self.plan.kind()))]
    pub async fn finish_with_failure(&self) -> Result<FlowState> {
        let mut state = self.state.lock().await;
        ensure_interactive(&state)?;
        if !state.can_finish_with_failure() {
            return Err(ValidationError::MissingPrerequisite {
                step: state.current_step,
                missing: "a commit failure",
            }
            .into());
        }
        let Some(outcome) = state.last_failure.take() else {
            return Err(FlowError::Unexpected("commit failure vanished".to_string()));
        };

        state.current_step = StepId::Result;
        state.status = FlowStatus::Completed;
        state.outcome = Some(outcome.clone());
        tracing::info!("flow finished with a failure outcome");
        self.services
            .navigator
            .flow_completed(self.kind(), &outcome)
            .await;
        Ok(state.clone())
    }

    /// Validates `input` for the current step.
    ///
    /// Local steps apply their update here and return `None`. Remote steps
    /// return the call to make and leave the state untouched.
    async fn prepare(&self, state: &mut FlowState, input: StepInput) -> Result<Option<StepCall>> {
        let step = state.current_step;
        if let Some(missing) = state.missing_prerequisite() {
            return Err(ValidationError::MissingPrerequisite { step, missing }.into());
        }

        match (step.gateway(), input) {
            (StepGateway::Terminal, _) => Err(FlowError::Finished),
            (StepGateway::Local, input) => {
                self.apply_local(state, input).await?;
                Ok(None)
            }
            (StepGateway::Verify, StepInput::Confirm) => {
                let request = state
                    .selection
                    .as_ref()
                    .and_then(Selection::lookup)
                    .ok_or_else(|| {
                        FlowError::Unexpected(format!("{} has no counterparty lookup", self.kind()))
                    })?;
                Ok(Some(StepCall::Verify(request)))
            }
            (StepGateway::Initiate, StepInput::Confirm) => {
                let request = self.build_request(state).await?;
                Ok(Some(StepCall::Initiate(request)))
            }
            (StepGateway::Authorize, StepInput::Pin(text)) => {
                let pin = Pin::parse(&text)?;
                let request = match &state.quote {
                    Some(held) => held.request.clone(),
                    None => self.build_request(state).await?,
                };
                Ok(Some(StepCall::Authorize(request, pin)))
            }
            (_, input) => Err(ValidationError::UnexpectedInput {
                step,
                input: input.label(),
            }
            .into()),
        }
    }

    /// Applies the input of a step that needs no remote call.
    async fn apply_local(&self, state: &mut FlowState, input: StepInput) -> Result<()> {
        match (state.current_step, input) {
            (StepId::Selection, StepInput::Select(selection)) => {
                if selection.kind() != self.kind() {
                    return Err(SelectionError::KindMismatch {
                        expected: self.kind(),
                        found: selection.kind(),
                    }
                    .into());
                }
                selection.validate()?;

                if state.selection.as_ref() != Some(&selection) {
                    state.verification = None;
                    state.quote = None;
                }
                state.selection = Some(selection);
            }
            (StepId::AmountEntry, StepInput::Amount { text, description }) => {
                let limits = self.services.limits.get(self.kind());
                let balance = self.services.session.balance().await;
                let amount = limits.check(&text, balance)?;

                state.amount = Some(amount);
                state.description = description.trim().to_string();
                state.quote = None;
            }
            (step, input) => {
                return Err(ValidationError::UnexpectedInput {
                    step,
                    input: input.label(),
                }
                .into());
            }
        }
        Ok(())
    }

    async fn build_request(&self, state: &FlowState) -> Result<TransactionRequest> {
        let wallet = self
            .services
            .session
            .primary_wallet()
            .await
            .ok_or(FlowError::NoPrimaryWallet)?;
        let selection = state
            .selection
            .as_ref()
            .ok_or_else(|| FlowError::Unexpected("selection missing".to_string()))?;
        let amount = state
            .amount
            .ok_or_else(|| FlowError::Unexpected("amount missing".to_string()))?;

        let mut fields = selection.identification_fields();
        if let Some(verification) = &state.verification {
            fields.insert(
                "counterparty_name".to_string(),
                verification.counterparty_name.clone(),
            );
        }

        Ok(TransactionRequest {
            kind: self.kind(),
            source: wallet.id,
            destination: selection.destination(),
            amount,
            description: state.description.clone(),
            fields,
        })
    }

    async fn execute(&self, call: StepCall) -> Result<StepResponse> {
        match call {
            StepCall::Verify(request) => self
                .services
                .verification
                .verify(self.kind(), &request)
                .await
                .map(StepResponse::Verified),
            StepCall::Initiate(request) => {
                let quote = self.services.quotes.initiate(&request).await?;
                Ok(StepResponse::Quoted(HeldQuote { quote, request }))
            }
            StepCall::Authorize(request, pin) => self
                .services
                .authorization
                .authorize(&request, &pin)
                .await
                .map(StepResponse::Committed),
        }
    }

    async fn apply(&self, state: &mut FlowState, response: StepResponse) {
        match response {
            StepResponse::Verified(result) => {
                state.verification = Some(result);
                self.move_forward(state);
            }
            StepResponse::Quoted(held) => {
                tracing::debug!(total = %held.quote.total_processable, "quote received");
                state.quote = Some(held);
                self.move_forward(state);
            }
            StepResponse::Committed(outcome) if outcome.is_success() => {
                self.complete(state, outcome).await;
            }
            StepResponse::Committed(outcome) => {
                tracing::info!(?outcome, "commit rejected");
                if outcome.invalidates_quote() {
                    state.quote = None;
                }
                state.last_failure = Some(outcome);
            }
        }
    }

    /// The terminal success transition. The only caller of the reconciler.
    async fn complete(&self, state: &mut FlowState, outcome: TransactionOutcome) {
        state.current_step = StepId::Result;
        state.status = FlowStatus::Completed;
        state.last_failure = None;
        state.outcome = Some(outcome.clone());

        self.services.reconciler.reconcile(&outcome).await;
        tracing::info!("flow completed");
        self.services
            .navigator
            .flow_completed(self.kind(), &outcome)
            .await;
    }

    fn move_forward(&self, state: &mut FlowState) {
        if let Some(next) = self.plan.next(state.current_step) {
            tracing::debug!(from = %state.current_step, to = %next, "advancing");
            state.current_step = next;
        }
        state.last_error = None;
    }

    async fn record_error(&self, state: &mut FlowState, err: FlowError) -> FlowError {
        state.last_error = Some(err.clone());
        if err == FlowError::SessionExpired {
            tracing::warn!("session expired, forcing logout");
            state.status = FlowStatus::SessionExpired;
            self.services.session.force_logout().await;
        } else {
            tracing::debug!(error = %err, "step gateway failed");
        }
        err
    }

    async fn terminate(&self, state: &mut FlowState) {
        state.status = FlowStatus::Abandoned;
        state.quote = None;
        tracing::info!(step = %state.current_step, "flow abandoned");
        self.services.navigator.flow_abandoned(self.kind()).await;
    }
}

fn ensure_interactive(state: &FlowState) -> Result<()> {
    match state.status {
        FlowStatus::Pending => Err(FlowError::Busy),
        status if status.is_terminal() => Err(FlowError::Finished),
        _ => Ok(()),
    }
}
