use thiserror::Error;

/// Generic message returned to the user when the directory rejects the call.
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";

/// Message returned to the user when the linked account is blacklisted.
pub const ACCOUNT_BLACKLISTED: &str = "Authentication failed: the account is blacklisted";

/// Failures raised by the challenge handlers.
///
/// A wrong answer is not an error, see [`super::Verdict`].
#[derive(Debug, Error)]
pub enum FlowError {
    /// Explicit denial surfaced to the user with a generic message.
    #[error("{0}")]
    Client(&'static str),

    /// Anything unexpected. Logged in full, reported as an opaque failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl FlowError {
    #[must_use]
    pub fn is_client(&self) -> bool {
        matches!(self, Self::Client(_))
    }
}
