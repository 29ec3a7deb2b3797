//! Scripted collaborators for flow tests.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::directory::{
    AuthResponse, AuthenticationResult, AuthenticationService, ChallengeResponseRequest,
    InitiateAuthRequest,
};
use crate::federation::FederationService;
use crate::rpc::RpcError;

pub(crate) fn completed(id_token: Option<&str>) -> AuthResponse {
    AuthResponse::completed(AuthenticationResult {
        id_token: id_token.map(|token| SecretString::from(token.to_string())),
        ..AuthenticationResult::default()
    })
}

/// Replays queued responses; an empty queue answers with a service error.
#[derive(Default)]
pub(crate) struct FakeDirectory {
    initiate: Mutex<VecDeque<Result<AuthResponse, RpcError>>>,
    respond: Mutex<VecDeque<Result<AuthResponse, RpcError>>>,
    initiate_calls: Mutex<Vec<(String, String)>>,
    respond_calls: Mutex<Vec<(String, Vec<(String, String)>, String)>>,
}

impl FakeDirectory {
    pub(crate) fn with_initiate(responses: Vec<Result<AuthResponse, RpcError>>) -> Self {
        Self {
            initiate: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub(crate) fn and_respond(self, responses: Vec<Result<AuthResponse, RpcError>>) -> Self {
        Self {
            respond: Mutex::new(responses.into()),
            ..self
        }
    }

    /// `(username, password)` per `initiate_auth` call.
    pub(crate) fn initiate_calls(&self) -> Vec<(String, String)> {
        self.initiate_calls.lock().unwrap().clone()
    }

    /// `(challenge, responses, session)` per `respond_to_challenge` call.
    pub(crate) fn respond_calls(&self) -> Vec<(String, Vec<(String, String)>, String)> {
        self.respond_calls.lock().unwrap().clone()
    }
}

fn exhausted() -> Result<AuthResponse, RpcError> {
    Err(RpcError::service("FakeExhausted", "no scripted response"))
}

#[async_trait]
impl AuthenticationService for FakeDirectory {
    async fn initiate_auth(&self, request: InitiateAuthRequest) -> Result<AuthResponse, RpcError> {
        self.initiate_calls.lock().unwrap().push((
            request.username,
            request.password.expose_secret().to_string(),
        ));
        self.initiate
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(exhausted)
    }

    async fn respond_to_challenge(
        &self,
        request: ChallengeResponseRequest,
    ) -> Result<AuthResponse, RpcError> {
        let responses = request
            .responses
            .iter()
            .map(|(key, value)| (key.clone(), value.expose_secret().to_string()))
            .collect();
        self.respond_calls
            .lock()
            .unwrap()
            .push((request.challenge_name, responses, request.session));
        self.respond
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(exhausted)
    }
}

pub(crate) struct FakeFederation {
    outcome: Result<Option<String>, String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeFederation {
    pub(crate) fn resolving(identity: &str) -> Self {
        Self {
            outcome: Ok(Some(identity.to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            outcome: Ok(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            outcome: Err("ResourceNotFoundException".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(provider, token)` per call.
    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FederationService for FakeFederation {
    async fn resolve_identity(
        &self,
        provider: &str,
        token: &SecretString,
    ) -> Result<Option<String>, RpcError> {
        self.calls
            .lock()
            .unwrap()
            .push((provider.to_string(), token.expose_secret().to_string()));
        self.outcome
            .clone()
            .map_err(|kind| RpcError::service(&kind, "identity pool not found"))
    }
}
