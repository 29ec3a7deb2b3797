//! Custom challenge flow.
//!
//! The trigger pipeline calls three phases per sign-in attempt, in order:
//!
//! 1. **Decide** ([`decider`]) with an empty history: ask for a custom challenge.
//! 2. **Build** ([`builder`]): pick `BasicAuth` or `ForceChangePassword` from the
//!    user's directory status.
//! 3. **Verify** ([`verifier`]): forward the password(s) to the directory admin
//!    API, exchange the id token for a federated identity and link it to a
//!    local account ([`linker`]).
//! 4. **Decide** again: issue tokens or fail, based on the verify result.
//!
//! Phases are stateless; everything they need arrives in the request and the
//! pipeline carries the results between calls.

pub mod builder;
pub mod decider;
mod error;
pub mod linker;
pub mod types;
mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{FlowError, ACCOUNT_BLACKLISTED, AUTHENTICATION_FAILED};
pub use linker::LinkError;
pub use types::{
    BuiltChallenge, ChallengeAttempt, ChallengeParameters, ChallengeVariant, Decision, Rejection,
    UserStatus, Verdict, VerifyRequest, CUSTOM_CHALLENGE, NEW_PASSWORD_REQUIRED, PARAM_TYPE,
};

use std::sync::Arc;

use crate::accounts::AccountStore;
use crate::directory::AuthenticationService;
use crate::federation::FederationService;

/// The three challenge phases with their external collaborators.
#[derive(Clone)]
pub struct ChallengeFlow {
    directory: Arc<dyn AuthenticationService>,
    federation: Arc<dyn FederationService>,
    accounts: Arc<dyn AccountStore>,
}

impl ChallengeFlow {
    #[must_use]
    pub fn new(
        directory: Arc<dyn AuthenticationService>,
        federation: Arc<dyn FederationService>,
        accounts: Arc<dyn AccountStore>,
    ) -> Self {
        Self {
            directory,
            federation,
            accounts,
        }
    }

    #[must_use]
    pub fn decide(&self, history: &[ChallengeAttempt]) -> Decision {
        decider::decide(history)
    }

    #[must_use]
    pub fn build(&self, status: &UserStatus) -> BuiltChallenge {
        builder::build(status)
    }

    #[must_use]
    pub fn accounts(&self) -> &dyn AccountStore {
        self.accounts.as_ref()
    }
}
