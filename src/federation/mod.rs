//! Identity-federation service: exchanges a directory id token for a
//! federated identity id.

mod client;

pub use client::FederationClient;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::rpc::RpcError;

/// Login provider name under which a user pool's id tokens are accepted.
#[must_use]
pub fn provider_name(region: &str, user_pool_id: &str) -> String {
    format!("cognito-idp.{region}.amazonaws.com/{user_pool_id}")
}

#[async_trait]
pub trait FederationService: Send + Sync {
    /// Resolve the federated identity for `token` issued by `provider`.
    /// `Ok(None)` means the service answered without an identity.
    async fn resolve_identity(
        &self,
        provider: &str,
        token: &SecretString,
    ) -> Result<Option<String>, RpcError>;
}
