use anyhow::Result;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::instrument;
use url::Url;

use super::FederationService;
use crate::rpc::{JsonRpcClient, RpcError};

const SERVICE: &str = "AWSCognitoIdentityService";

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetIdResponse {
    identity_id: Option<String>,
}

/// `GetId` client bound to one identity pool.
#[derive(Clone, Debug)]
pub struct FederationClient {
    rpc: JsonRpcClient,
    identity_pool_id: String,
}

impl FederationClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built for `endpoint`.
    pub fn new(endpoint: Url, identity_pool_id: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            rpc: JsonRpcClient::new(endpoint, SERVICE, timeout)?,
            identity_pool_id,
        })
    }

    #[must_use]
    pub fn identity_pool_id(&self) -> &str {
        &self.identity_pool_id
    }
}

#[async_trait]
impl FederationService for FederationClient {
    #[instrument(skip(self, token), fields(identity_pool = %self.identity_pool_id))]
    async fn resolve_identity(
        &self,
        provider: &str,
        token: &SecretString,
    ) -> Result<Option<String>, RpcError> {
        let body = json!({
            "IdentityPoolId": self.identity_pool_id,
            "Logins": { provider: token.expose_secret() },
        });

        let response: GetIdResponse = self.rpc.call("GetId", &body).await?;

        Ok(response.identity_id.filter(|id| !id.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    #[tokio::test]
    async fn resolve_identity_posts_logins_map() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("X-Amz-Target", "AWSCognitoIdentityService.GetId"))
            .and(body_json(json!({
                "IdentityPoolId": "us-east-1:pool",
                "Logins": {"cognito-idp.us-east-1.amazonaws.com/us-east-1_x": "id-token"}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"IdentityId": "us-east-1:abc"})),
            )
            .mount(&server)
            .await;

        let client = FederationClient::new(
            Url::parse(&server.uri()).unwrap(),
            "us-east-1:pool".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        let identity = client
            .resolve_identity(
                "cognito-idp.us-east-1.amazonaws.com/us-east-1_x",
                &SecretString::from("id-token".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(identity.as_deref(), Some("us-east-1:abc"));
    }

    #[tokio::test]
    async fn missing_identity_is_none() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = FederationClient::new(
            Url::parse(&server.uri()).unwrap(),
            "us-east-1:pool".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        let identity = client
            .resolve_identity("provider", &SecretString::from("id-token".to_string()))
            .await
            .unwrap();

        assert!(identity.is_none());
    }
}
