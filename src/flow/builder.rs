//! Build phase: pick the challenge variant for the user.

use super::types::{BuiltChallenge, ChallengeParameters, ChallengeVariant, UserStatus, PARAM_TYPE};

/// Users with a pending password change answer a `ForceChangePassword`
/// challenge, everyone else `BasicAuth`.
#[must_use]
pub fn build(status: &UserStatus) -> BuiltChallenge {
    let variant = match status {
        UserStatus::ForceChangePassword => ChallengeVariant::ForceChangePassword,
        _ => ChallengeVariant::BasicAuth,
    };

    BuiltChallenge {
        variant,
        public_parameters: parameters(variant),
        private_parameters: parameters(variant),
        metadata: variant.as_str().to_string(),
    }
}

fn parameters(variant: ChallengeVariant) -> ChallengeParameters {
    ChallengeParameters::from([(PARAM_TYPE.to_string(), variant.as_str().to_string())])
}
