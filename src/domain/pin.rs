use std::fmt;
use thiserror::Error;

pub const PIN_LENGTH: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PinError {
    #[error("PIN must be exactly {PIN_LENGTH} digits, got {0}")]
    WrongLength(usize),
    #[error("PIN must contain digits only")]
    NotNumeric,
}

/// A transaction PIN whose shape has been checked locally.
///
/// Correctness is only known to the remote service. The value lives for a
/// single authorization request and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    pub fn parse(text: &str) -> Result<Self, PinError> {
        let length = text.chars().count();
        if length != PIN_LENGTH {
            return Err(PinError::WrongLength(length));
        }
        if !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PinError::NotNumeric);
        }
        Ok(Self(text.to_string()))
    }

    /// The raw digits, for the authorization request only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}
