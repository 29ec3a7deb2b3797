//! Decide phase: turn the session history into the next step.

use tracing::info;

use super::types::{ChallengeAttempt, ChallengeVariant, Decision, CUSTOM_CHALLENGE};

/// Inspect the history and decide whether to issue tokens, fail, or ask again.
///
/// Only the first custom challenge carrying a known variant tag counts.
#[must_use]
pub fn decide(history: &[ChallengeAttempt]) -> Decision {
    for attempt in history {
        if attempt.name != CUSTOM_CHALLENGE {
            continue;
        }
        let Some(variant) = attempt.metadata.as_deref().and_then(ChallengeVariant::parse) else {
            continue;
        };

        if attempt.result {
            info!(challenge = %variant, "challenge complete, issuing tokens");
            return Decision::IssueTokens;
        }

        info!(challenge = %variant, "challenge failed, aborting the auth flow");
        return Decision::FailAuthentication;
    }

    Decision::NextChallenge(CUSTOM_CHALLENGE.to_string())
}
