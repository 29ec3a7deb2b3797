use anyhow::Result;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::instrument;
use url::Url;

use super::{
    AuthResponse, AuthenticationResult, AuthenticationService, ChallengeResponseRequest,
    InitiateAuthRequest,
};
use crate::rpc::{JsonRpcClient, RpcError};

const SERVICE: &str = "AWSCognitoIdentityProviderService";
const ADMIN_AUTH_FLOW: &str = "ADMIN_NO_SRP_AUTH";

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireAuthenticationResult {
    id_token: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireAuthResponse {
    authentication_result: Option<WireAuthenticationResult>,
    challenge_name: Option<String>,
    session: Option<String>,
}

impl From<WireAuthResponse> for AuthResponse {
    fn from(wire: WireAuthResponse) -> Self {
        Self {
            authentication_result: wire.authentication_result.map(|result| AuthenticationResult {
                id_token: result.id_token.map(SecretString::from),
                access_token: result.access_token.map(SecretString::from),
                refresh_token: result.refresh_token.map(SecretString::from),
                expires_in: result.expires_in,
            }),
            challenge_name: wire.challenge_name,
            session: wire.session,
        }
    }
}

/// Admin API client for the user pool.
#[derive(Clone, Debug)]
pub struct DirectoryClient {
    rpc: JsonRpcClient,
}

impl DirectoryClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built for `endpoint`.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            rpc: JsonRpcClient::new(endpoint, SERVICE, timeout)?,
        })
    }
}

#[async_trait]
impl AuthenticationService for DirectoryClient {
    #[instrument(skip(self, request), fields(user = %request.username))]
    async fn initiate_auth(&self, request: InitiateAuthRequest) -> Result<AuthResponse, RpcError> {
        let body = json!({
            "UserPoolId": request.user_pool_id,
            "ClientId": request.client_id,
            "AuthFlow": ADMIN_AUTH_FLOW,
            "AuthParameters": {
                "USERNAME": request.username,
                "PASSWORD": request.password.expose_secret(),
            },
        });

        let response: WireAuthResponse = self.rpc.call("AdminInitiateAuth", &body).await?;

        Ok(response.into())
    }

    #[instrument(skip(self, request), fields(challenge = %request.challenge_name))]
    async fn respond_to_challenge(
        &self,
        request: ChallengeResponseRequest,
    ) -> Result<AuthResponse, RpcError> {
        let responses: Map<String, Value> = request
            .responses
            .iter()
            .map(|(key, value)| (key.clone(), Value::from(value.expose_secret())))
            .collect();

        let body = json!({
            "UserPoolId": request.user_pool_id,
            "ClientId": request.client_id,
            "ChallengeName": request.challenge_name,
            "ChallengeResponses": responses,
            "Session": request.session,
        });

        let response: WireAuthResponse = self.rpc.call("AdminRespondToAuthChallenge", &body).await?;

        Ok(response.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::net::TcpListener;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    async fn client(server: &MockServer) -> DirectoryClient {
        DirectoryClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn initiate_auth_returns_tokens() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("X-Amz-Target", "AWSCognitoIdentityProviderService.AdminInitiateAuth"))
            .and(body_partial_json(json!({
                "UserPoolId": "us-east-1_pool",
                "ClientId": "client",
                "AuthFlow": "ADMIN_NO_SRP_AUTH",
                "AuthParameters": {"USERNAME": "alice", "PASSWORD": "hunter2"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "AuthenticationResult": {"IdToken": "id", "AccessToken": "access", "ExpiresIn": 3600},
                "ChallengeParameters": {}
            })))
            .mount(&server)
            .await;

        let response = client(&server)
            .await
            .initiate_auth(InitiateAuthRequest {
                user_pool_id: "us-east-1_pool".to_string(),
                client_id: "client".to_string(),
                username: "alice".to_string(),
                password: SecretString::from("hunter2".to_string()),
            })
            .await
            .unwrap();

        let result = response.authentication_result.unwrap();
        assert_eq!(result.id_token.unwrap().expose_secret(), "id");
        assert_eq!(result.expires_in, Some(3600));
        assert!(response.challenge_name.is_none());
    }

    #[tokio::test]
    async fn respond_to_challenge_sends_session_and_responses() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header(
                "X-Amz-Target",
                "AWSCognitoIdentityProviderService.AdminRespondToAuthChallenge",
            ))
            .and(body_partial_json(json!({
                "ChallengeName": "NEW_PASSWORD_REQUIRED",
                "ChallengeResponses": {"NEW_PASSWORD": "n3w", "USERNAME": "alice"},
                "Session": "session-1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ChallengeName": "SMS_MFA",
                "Session": "session-2"
            })))
            .mount(&server)
            .await;

        let responses = BTreeMap::from([
            ("NEW_PASSWORD".to_string(), SecretString::from("n3w".to_string())),
            ("USERNAME".to_string(), SecretString::from("alice".to_string())),
        ]);
        let response = client(&server)
            .await
            .respond_to_challenge(ChallengeResponseRequest {
                user_pool_id: "us-east-1_pool".to_string(),
                client_id: "client".to_string(),
                challenge_name: "NEW_PASSWORD_REQUIRED".to_string(),
                responses,
                session: "session-1".to_string(),
            })
            .await
            .unwrap();

        assert!(response.authentication_result.is_none());
        assert_eq!(response.challenge_name.as_deref(), Some("SMS_MFA"));
        assert_eq!(response.session.as_deref(), Some("session-2"));
    }
}
