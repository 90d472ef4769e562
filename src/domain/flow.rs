use crate::domain::plan::{StepId, StepPlan};
use crate::domain::transaction::{
    Quote, Selection, TransactionKind, TransactionOutcome, TransactionRequest, VerificationResult,
};
use crate::error::FlowError;
use rust_decimal::Decimal;

/// Input carried by a step's primary ("continue") action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepInput {
    Select(Selection),
    /// Continue on steps that only trigger a remote call.
    Confirm,
    Amount {
        text: String,
        description: String,
    },
    Pin(String),
}

impl StepInput {
    pub fn label(&self) -> &'static str {
        match self {
            StepInput::Select(_) => "selection",
            StepInput::Confirm => "confirm",
            StepInput::Amount { .. } => "amount",
            StepInput::Pin(_) => "pin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    /// Waiting for user input on the current step.
    Active,
    /// A gateway call is in flight. Further advances are rejected.
    Pending,
    /// Reached `Result` with an outcome.
    Completed,
    /// Left by back-navigation or `abandon`.
    Abandoned,
    /// Ended by a session expiry signal from a gateway.
    SessionExpired,
}

impl FlowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowStatus::Completed | FlowStatus::Abandoned | FlowStatus::SessionExpired
        )
    }
}

/// A quote together with the exact request that produced it. Authorization
/// replays `request` verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldQuote {
    pub quote: Quote,
    pub request: TransactionRequest,
}

/// Everything one in-progress flow knows about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowState {
    pub kind: TransactionKind,
    pub current_step: StepId,
    pub status: FlowStatus,
    pub selection: Option<Selection>,
    pub amount: Option<Decimal>,
    pub description: String,
    pub verification: Option<VerificationResult>,
    pub quote: Option<HeldQuote>,
    /// Number of PINs sent to the server. The PIN itself is never kept.
    pub pin_attempts: u32,
    pub last_failure: Option<TransactionOutcome>,
    pub last_error: Option<FlowError>,
    pub outcome: Option<TransactionOutcome>,
}

impl FlowState {
    pub fn new(kind: TransactionKind) -> Self {
        Self {
            kind,
            current_step: StepPlan::for_kind(kind).first(),
            status: FlowStatus::Active,
            selection: None,
            amount: None,
            description: String::new(),
            verification: None,
            quote: None,
            pin_attempts: 0,
            last_failure: None,
            last_error: None,
            outcome: None,
        }
    }

    pub fn plan(&self) -> StepPlan {
        StepPlan::for_kind(self.kind)
    }

    pub fn is_pending(&self) -> bool {
        self.status == FlowStatus::Pending
    }

    /// The first missing prerequisite of the current step, if any.
    pub fn missing_prerequisite(&self) -> Option<&'static str> {
        let plan = self.plan();
        match self.current_step {
            StepId::Selection | StepId::Result => None,
            StepId::Verification => self.selection.is_none().then_some("a selection"),
            StepId::AmountEntry => {
                if self.selection.is_none() {
                    Some("a selection")
                } else if plan.requires_verification() && self.verification.is_none() {
                    Some("a verified counterparty")
                } else {
                    None
                }
            }
            StepId::Quote => self.amount.is_none().then_some("a validated amount"),
            StepId::Authorization => {
                if plan.requires_quote() {
                    self.quote.is_none().then_some("a current quote")
                } else {
                    self.amount.is_none().then_some("a validated amount")
                }
            }
        }
    }

    /// Whether the current step's continue action should be enabled.
    pub fn primary_action_enabled(&self) -> bool {
        self.status == FlowStatus::Active
            && self.current_step != StepId::Result
            && self.missing_prerequisite().is_none()
    }

    /// Whether the last commit failure can be accepted as the final result.
    pub fn can_finish_with_failure(&self) -> bool {
        self.status == FlowStatus::Active
            && self.current_step == StepId::Authorization
            && self.last_failure.is_some()
    }
}

/// A complete user intent, used to drive a flow end to end without a UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowIntent {
    pub selection: Selection,
    pub amount: String,
    pub description: String,
    pub pin: String,
}

impl FlowIntent {
    pub fn kind(&self) -> TransactionKind {
        self.selection.kind()
    }

    /// The input this intent supplies for `step`, or `None` for `Result`.
    pub fn input_for(&self, step: StepId) -> Option<StepInput> {
        match step {
            StepId::Selection => Some(StepInput::Select(self.selection.clone())),
            StepId::Verification | StepId::Quote => Some(StepInput::Confirm),
            StepId::AmountEntry => Some(StepInput::Amount {
                text: self.amount.clone(),
                description: self.description.clone(),
            }),
            StepId::Authorization => Some(StepInput::Pin(self.pin.clone())),
            StepId::Result => None,
        }
    }
}
