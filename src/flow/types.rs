//! Values exchanged between the trigger boundary and the challenge handlers.

use secrecy::SecretString;
use std::collections::BTreeMap;
use std::fmt;

use crate::accounts::Account;

/// Challenge name the pipeline uses for custom challenges.
pub const CUSTOM_CHALLENGE: &str = "CUSTOM_CHALLENGE";

/// Follow-up challenge returned by the directory when a password change is pending.
pub const NEW_PASSWORD_REQUIRED: &str = "NEW_PASSWORD_REQUIRED";

/// Key under which the variant is stored in the challenge parameters.
pub const PARAM_TYPE: &str = "type";

/// Public or private parameters attached to an issued challenge.
pub type ChallengeParameters = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChallengeVariant {
    BasicAuth,
    ForceChangePassword,
}

impl ChallengeVariant {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BasicAuth => "BasicAuth",
            Self::ForceChangePassword => "ForceChangePassword",
        }
    }

    /// Parse a variant tag, `None` for anything not issued by this service.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "BasicAuth" => Some(Self::BasicAuth),
            "ForceChangePassword" => Some(Self::ForceChangePassword),
            _ => None,
        }
    }
}

impl fmt::Display for ChallengeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account status reported by the directory when the attempt starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserStatus {
    Unconfirmed,
    Confirmed,
    Archived,
    Compromised,
    ResetRequired,
    ForceChangePassword,
    Unknown(String),
}

impl UserStatus {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "UNCONFIRMED" => Self::Unconfirmed,
            "CONFIRMED" => Self::Confirmed,
            "ARCHIVED" => Self::Archived,
            "COMPROMISED" => Self::Compromised,
            "RESET_REQUIRED" => Self::ResetRequired,
            "FORCE_CHANGE_PASSWORD" => Self::ForceChangePassword,
            other => Self::Unknown(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unconfirmed => "UNCONFIRMED",
            Self::Confirmed => "CONFIRMED",
            Self::Archived => "ARCHIVED",
            Self::Compromised => "COMPROMISED",
            Self::ResetRequired => "RESET_REQUIRED",
            Self::ForceChangePassword => "FORCE_CHANGE_PASSWORD",
            Self::Unknown(value) => value,
        }
    }
}

/// One answered challenge from the session history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeAttempt {
    pub name: String,
    pub metadata: Option<String>,
    pub result: bool,
}

/// Outcome of the decide phase. Exactly one response field is set per decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    IssueTokens,
    FailAuthentication,
    NextChallenge(String),
}

/// Parameters emitted by the build phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltChallenge {
    pub variant: ChallengeVariant,
    pub public_parameters: ChallengeParameters,
    pub private_parameters: ChallengeParameters,
    pub metadata: String,
}

/// Everything the verify phase reads from the session.
#[derive(Debug)]
pub struct VerifyRequest {
    pub user_pool_id: String,
    pub client_id: String,
    pub region: String,
    pub user_name: String,
    pub private_parameters: Option<ChallengeParameters>,
    pub answer: SecretString,
}

/// Why an answer was not accepted. None of these are errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    MissingChallengeType,
    UnsupportedChallengeType(String),
    MalformedAnswer,
    IncompleteAnswer,
    ChallengeNotSatisfied(Option<String>),
    MissingIdToken,
    IdentityNotResolved,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingChallengeType => f.write_str("missing private challenge type"),
            Self::UnsupportedChallengeType(kind) => write!(f, "unsupported challenge type {kind}"),
            Self::MalformedAnswer => f.write_str("answer is not a JSON object"),
            Self::IncompleteAnswer => f.write_str("answer is missing password or newPassword"),
            Self::ChallengeNotSatisfied(Some(name)) => {
                write!(f, "directory returned a {name} challenge")
            }
            Self::ChallengeNotSatisfied(None) => {
                f.write_str("directory returned no authentication result")
            }
            Self::MissingIdToken => f.write_str("authentication result has no id token"),
            Self::IdentityNotResolved => f.write_str("federation returned no identity"),
        }
    }
}

/// Outcome of the verify phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted(Account),
    Rejected(Rejection),
}

impl Verdict {
    #[must_use]
    pub fn answer_correct(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}
