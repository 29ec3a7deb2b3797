//! Verify phase: check the answer with the directory, then resolve and link
//! the federated identity.

use anyhow::{anyhow, Context};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{error, info, instrument};

use super::error::{FlowError, ACCOUNT_BLACKLISTED, AUTHENTICATION_FAILED};
use super::linker::{link, LinkError};
use super::types::{
    ChallengeParameters, ChallengeVariant, Rejection, Verdict, VerifyRequest,
    NEW_PASSWORD_REQUIRED, PARAM_TYPE,
};
use super::ChallengeFlow;
use crate::directory::{
    AuthenticationResult, ChallengeResponseRequest, InitiateAuthRequest,
};
use crate::federation::provider_name;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForceChangePasswordAnswer {
    password: Option<String>,
    new_password: Option<String>,
}

/// Passwords extracted from the answer. `new_password` is only present for
/// `ForceChangePassword` challenges.
struct Credentials {
    password: SecretString,
    new_password: Option<SecretString>,
}

fn parse_credentials(
    private_parameters: Option<&ChallengeParameters>,
    answer: SecretString,
) -> Result<Credentials, Rejection> {
    let Some(kind) = private_parameters.and_then(|parameters| parameters.get(PARAM_TYPE)) else {
        return Err(Rejection::MissingChallengeType);
    };

    match ChallengeVariant::parse(kind) {
        Some(ChallengeVariant::BasicAuth) => Ok(Credentials {
            password: answer,
            new_password: None,
        }),
        Some(ChallengeVariant::ForceChangePassword) => {
            let parsed: ForceChangePasswordAnswer = serde_json::from_str(answer.expose_secret())
                .map_err(|_| Rejection::MalformedAnswer)?;
            match (parsed.password, parsed.new_password) {
                (Some(password), Some(new_password)) => Ok(Credentials {
                    password: SecretString::from(password),
                    new_password: Some(SecretString::from(new_password)),
                }),
                _ => Err(Rejection::IncompleteAnswer),
            }
        }
        None => Err(Rejection::UnsupportedChallengeType(kind.clone())),
    }
}

fn rejected(reason: Rejection) -> Result<Verdict, FlowError> {
    info!(%reason, "answer rejected");
    Ok(Verdict::Rejected(reason))
}

impl ChallengeFlow {
    /// Validate the answer and link the resolved identity to a local account.
    ///
    /// # Errors
    /// [`FlowError::Client`] when a directory call fails or the account is
    /// blacklisted, [`FlowError::Internal`] for federation, store, or
    /// malformed-response failures. A wrong answer is `Ok(Verdict::Rejected)`.
    #[instrument(
        skip(self, request),
        fields(user = %request.user_name, pool = %request.user_pool_id)
    )]
    pub async fn verify(&self, request: VerifyRequest) -> Result<Verdict, FlowError> {
        let VerifyRequest {
            user_pool_id,
            client_id,
            region,
            user_name,
            private_parameters,
            answer,
        } = request;

        let credentials = match parse_credentials(private_parameters.as_ref(), answer) {
            Ok(credentials) => credentials,
            Err(reason) => return rejected(reason),
        };

        let result = match self
            .authenticate(&user_pool_id, &client_id, &user_name, credentials)
            .await?
        {
            Ok(result) => result,
            Err(reason) => return rejected(reason),
        };

        let Some(id_token) = result.id_token else {
            return rejected(Rejection::MissingIdToken);
        };

        let provider = provider_name(&region, &user_pool_id);
        let identity = self
            .federation
            .resolve_identity(&provider, &id_token)
            .await
            .context("failed to resolve federated identity")?;
        let Some(identity) = identity else {
            return rejected(Rejection::IdentityNotResolved);
        };

        match link(self.accounts.as_ref(), &identity, &user_name).await {
            Ok(account) => {
                info!(account_id = %account.account_id, "answer accepted");
                Ok(Verdict::Accepted(account))
            }
            Err(LinkError::Blacklisted(_)) => Err(FlowError::Client(ACCOUNT_BLACKLISTED)),
            Err(LinkError::Store(err)) => {
                Err(anyhow::Error::new(err).context("failed to link account").into())
            }
        }
    }

    /// Sign in with the directory, answering one `NEW_PASSWORD_REQUIRED`
    /// follow-up when a new password was supplied.
    ///
    /// A failed follow-up call is reported as [`AUTHENTICATION_FAILED`], the
    /// same as a failed first call.
    async fn authenticate(
        &self,
        user_pool_id: &str,
        client_id: &str,
        user_name: &str,
        credentials: Credentials,
    ) -> Result<Result<AuthenticationResult, Rejection>, FlowError> {
        let response = self
            .directory
            .initiate_auth(InitiateAuthRequest {
                user_pool_id: user_pool_id.to_string(),
                client_id: client_id.to_string(),
                username: user_name.to_string(),
                password: credentials.password,
            })
            .await
            .map_err(|err| {
                error!("initiate auth failed: {err}");
                FlowError::Client(AUTHENTICATION_FAILED)
            })?;

        if let Some(result) = response.authentication_result {
            return Ok(Ok(result));
        }

        if let Some(challenge) = &response.challenge_name {
            info!(%challenge, "directory returned a follow-up challenge");
        }

        let new_password_required = response.challenge_name.as_deref() == Some(NEW_PASSWORD_REQUIRED);
        let Some(new_password) = credentials.new_password.filter(|_| new_password_required) else {
            return Ok(Err(Rejection::ChallengeNotSatisfied(response.challenge_name)));
        };

        let session = response
            .session
            .ok_or_else(|| anyhow!("{NEW_PASSWORD_REQUIRED} response did not include a session"))?;

        let responses = BTreeMap::from([
            ("NEW_PASSWORD".to_string(), new_password),
            ("USERNAME".to_string(), SecretString::from(user_name.to_string())),
        ]);

        let response = self
            .directory
            .respond_to_challenge(ChallengeResponseRequest {
                user_pool_id: user_pool_id.to_string(),
                client_id: client_id.to_string(),
                challenge_name: NEW_PASSWORD_REQUIRED.to_string(),
                responses,
                session,
            })
            .await
            .map_err(|err| {
                error!("respond to auth challenge failed: {err}");
                FlowError::Client(AUTHENTICATION_FAILED)
            })?;

        match response.authentication_result {
            Some(result) => Ok(Ok(result)),
            None => Ok(Err(Rejection::ChallengeNotSatisfied(response.challenge_name))),
        }
    }
}
