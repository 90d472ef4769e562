use crate::domain::amount::AmountError;
use crate::domain::pin::PinError;
use crate::domain::plan::StepId;
use crate::domain::transaction::SelectionError;
use thiserror::Error;

/// Errors reported by the remote collaborators (lookup providers and the
/// initiate/process service) before they are mapped at the step boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("session expired")]
    SessionExpired,
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("rejected ({reason}): {message}")]
    Rejected { reason: String, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Local input errors. These never leave the device and never move the flow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error(transparent)]
    Pin(#[from] PinError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("step {step} does not accept {input} input")]
    UnexpectedInput { step: StepId, input: &'static str },
    #[error("step {step} requires {missing} first")]
    MissingPrerequisite { step: StepId, missing: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("verification failed: {0}")]
    Verification(String),
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("request rejected ({reason}): {message}")]
    Rejected { reason: String, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("session expired")]
    SessionExpired,
    #[error("a request for this flow is already in flight")]
    Busy,
    #[error("flow has already ended")]
    Finished,
    #[error("response arrived after the flow was abandoned")]
    Discarded,
    #[error("no primary wallet is available for this session")]
    NoPrimaryWallet,
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl FlowError {
    /// Whether the user can keep interacting with the current step.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            FlowError::SessionExpired | FlowError::Finished | FlowError::Discarded
        )
    }

    /// Whether the balance cannot cover the amount, as judged on the device
    /// before the call or by the server during it.
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(
            self,
            FlowError::InsufficientFunds(_)
                | FlowError::Validation(ValidationError::Amount(AmountError::ExceedsBalance(_)))
        )
    }
}

impl From<AmountError> for FlowError {
    fn from(err: AmountError) -> Self {
        FlowError::Validation(err.into())
    }
}

impl From<PinError> for FlowError {
    fn from(err: PinError) -> Self {
        FlowError::Validation(err.into())
    }
}

impl From<SelectionError> for FlowError {
    fn from(err: SelectionError) -> Self {
        FlowError::Validation(err.into())
    }
}

/// Errors raised by the CLI surface: reading intents, loading config,
/// writing outcomes.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] serde_json::Error),
    #[error("Intent error: {0}")]
    IntentError(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
