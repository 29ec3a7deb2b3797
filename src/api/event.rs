//! Typed view of the trigger pipeline's event document.
//!
//! The handler keeps the raw JSON, reads what it needs through
//! [`TriggerEvent`], and merges a [`TriggerResponse`] back under `response`,
//! so unknown fields round-trip unchanged.

use anyhow::{anyhow, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

use crate::flow::{BuiltChallenge, ChallengeAttempt, Decision, UserStatus, VerifyRequest};

/// User attribute carrying the directory status of the user.
pub const USER_STATUS_ATTRIBUTE: &str = "cognito:user_status";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerPhase {
    DefineAuthChallenge,
    CreateAuthChallenge,
    VerifyAuthChallengeResponse,
}

impl TriggerPhase {
    #[must_use]
    pub fn parse(trigger_source: &str) -> Option<Self> {
        match trigger_source {
            "DefineAuthChallenge_Authentication" => Some(Self::DefineAuthChallenge),
            "CreateAuthChallenge_Authentication" => Some(Self::CreateAuthChallenge),
            "VerifyAuthChallengeResponse_Authentication" => Some(Self::VerifyAuthChallengeResponse),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    pub trigger_source: String,
    pub region: String,
    pub user_pool_id: String,
    pub user_name: String,
    pub caller_context: CallerContext,
    #[serde(default)]
    pub request: TriggerRequest,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallerContext {
    pub client_id: String,
}

#[derive(Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    #[serde(default)]
    pub user_attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub session: Vec<SessionEntry>,
    #[serde(default)]
    pub private_challenge_parameters: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub challenge_answer: Option<String>,
}

impl fmt::Debug for TriggerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerRequest")
            .field("user_attributes", &self.user_attributes)
            .field("session", &self.session)
            .field(
                "private_challenge_parameters",
                &self.private_challenge_parameters,
            )
            .field(
                "challenge_answer",
                &self.challenge_answer.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    pub challenge_name: String,
    #[serde(default)]
    pub challenge_result: bool,
    #[serde(default)]
    pub challenge_metadata: Option<String>,
}

impl From<SessionEntry> for ChallengeAttempt {
    fn from(entry: SessionEntry) -> Self {
        Self {
            name: entry.challenge_name,
            metadata: entry.challenge_metadata,
            result: entry.challenge_result,
        }
    }
}

impl TriggerEvent {
    /// Directory status from the user attributes, if present.
    #[must_use]
    pub fn user_status(&self) -> Option<UserStatus> {
        self.request
            .user_attributes
            .get(USER_STATUS_ATTRIBUTE)
            .map(|status| UserStatus::parse(status.as_str()))
    }

    #[must_use]
    pub fn into_history(self) -> Vec<ChallengeAttempt> {
        self.request.session.into_iter().map(Into::into).collect()
    }

    #[must_use]
    pub fn into_verify_request(self) -> VerifyRequest {
        VerifyRequest {
            user_pool_id: self.user_pool_id,
            client_id: self.caller_context.client_id,
            region: self.region,
            user_name: self.user_name,
            private_parameters: self.request.private_challenge_parameters,
            answer: SecretString::from(self.request.challenge_answer.unwrap_or_default()),
        }
    }
}

/// Response fields set by one phase. Unset fields are left as they arrived.
#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_tokens: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_authentication: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_challenge_parameters: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_challenge_parameters: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_correct: Option<bool>,
}

impl TriggerResponse {
    #[must_use]
    pub fn answer(correct: bool) -> Self {
        Self {
            answer_correct: Some(correct),
            ..Self::default()
        }
    }

    /// Write the set fields into `event.response`, creating it if needed.
    ///
    /// # Errors
    /// Returns an error if `event` is not a JSON object.
    pub fn merge_into(self, event: &mut Value) -> Result<()> {
        let Value::Object(fields) = serde_json::to_value(self)? else {
            return Err(anyhow!("trigger response did not serialize to an object"));
        };

        let root = event
            .as_object_mut()
            .ok_or_else(|| anyhow!("trigger event is not a JSON object"))?;
        let response = root
            .entry("response")
            .or_insert_with(|| Value::Object(Map::new()));
        if !response.is_object() {
            *response = Value::Object(Map::new());
        }
        if let Value::Object(target) = response {
            target.extend(fields);
        }

        Ok(())
    }
}

impl From<Decision> for TriggerResponse {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::IssueTokens => Self {
                issue_tokens: Some(true),
                ..Self::default()
            },
            Decision::FailAuthentication => Self {
                fail_authentication: Some(true),
                ..Self::default()
            },
            Decision::NextChallenge(name) => Self {
                challenge_name: Some(name),
                ..Self::default()
            },
        }
    }
}

impl From<BuiltChallenge> for TriggerResponse {
    fn from(challenge: BuiltChallenge) -> Self {
        Self {
            public_challenge_parameters: Some(challenge.public_parameters),
            private_challenge_parameters: Some(challenge.private_parameters),
            challenge_metadata: Some(challenge.metadata),
            ..Self::default()
        }
    }
}
