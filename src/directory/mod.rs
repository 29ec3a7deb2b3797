//! User-directory authentication service.

mod client;

pub use client::DirectoryClient;

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::BTreeMap;

use crate::rpc::RpcError;

/// Username/password sign-in on behalf of the user.
#[derive(Debug)]
pub struct InitiateAuthRequest {
    pub user_pool_id: String,
    pub client_id: String,
    pub username: String,
    pub password: SecretString,
}

/// Answer to a follow-up challenge returned by a previous call.
#[derive(Debug)]
pub struct ChallengeResponseRequest {
    pub user_pool_id: String,
    pub client_id: String,
    pub challenge_name: String,
    pub responses: BTreeMap<String, SecretString>,
    pub session: String,
}

#[derive(Debug, Default)]
pub struct AuthenticationResult {
    pub id_token: Option<SecretString>,
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub expires_in: Option<i64>,
}

/// Either a completed result or a follow-up challenge (with its session).
#[derive(Debug, Default)]
pub struct AuthResponse {
    pub authentication_result: Option<AuthenticationResult>,
    pub challenge_name: Option<String>,
    pub session: Option<String>,
}

impl AuthResponse {
    #[must_use]
    pub fn completed(result: AuthenticationResult) -> Self {
        Self {
            authentication_result: Some(result),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn challenge(name: &str, session: Option<&str>) -> Self {
        Self {
            authentication_result: None,
            challenge_name: Some(name.to_string()),
            session: session.map(str::to_string),
        }
    }
}

#[async_trait]
pub trait AuthenticationService: Send + Sync {
    async fn initiate_auth(&self, request: InitiateAuthRequest) -> Result<AuthResponse, RpcError>;

    async fn respond_to_challenge(
        &self,
        request: ChallengeResponseRequest,
    ) -> Result<AuthResponse, RpcError>;
}
