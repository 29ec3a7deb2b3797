//! Minimal client for the JSON 1.1 protocol spoken by the directory and
//! federation services: every operation is a `POST /` carrying an
//! `X-Amz-Target: <service>.<operation>` header and a JSON body.
//!
//! Request signing is not done here; production deployments point the
//! endpoints at a signing proxy.

use anyhow::{anyhow, Result};
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, Instrument};
use url::Url;

pub const CONTENT_TYPE_JSON_1_1: &str = "application/x-amz-json-1.1";
pub const TARGET_HEADER: &str = "X-Amz-Target";

/// Largest response body read from the service.
pub const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service error {kind}: {message}")]
    Service { kind: String, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RpcError {
    #[must_use]
    pub fn service(kind: &str, message: &str) -> Self {
        Self::Service {
            kind: kind.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// `com.amazonaws.foo#NotAuthorizedException` -> `NotAuthorizedException`
fn short_error_kind(kind: &str) -> &str {
    kind.rsplit('#').next().unwrap_or(kind)
}

fn service_error(status: StatusCode, body: &str) -> RpcError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let kind = parsed
        .as_ref()
        .and_then(|error| error.kind.as_deref())
        .map_or_else(|| status.as_str().to_string(), |kind| short_error_kind(kind).to_string());
    let message = parsed
        .and_then(|error| error.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());

    RpcError::Service { kind, message }
}

/// Buffer the body, giving up with `None` past [`MAX_RESPONSE_BYTES`].
async fn read_body(mut response: Response) -> Result<Option<Vec<u8>>, RpcError> {
    if response
        .content_length()
        .is_some_and(|length| length > MAX_RESPONSE_BYTES as u64)
    {
        return Ok(None);
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > MAX_RESPONSE_BYTES {
            return Ok(None);
        }
        body.extend_from_slice(&chunk);
    }

    Ok(Some(body))
}

#[derive(Clone, Debug)]
pub struct JsonRpcClient {
    client: Client,
    endpoint: Url,
    service: &'static str,
}

impl JsonRpcClient {
    /// # Errors
    /// Returns an error if the endpoint is not http(s) or the HTTP client cannot be built.
    pub fn new(endpoint: Url, service: &'static str, timeout: Duration) -> Result<Self> {
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(anyhow!(
                "unsupported scheme {} for {service} endpoint",
                endpoint.scheme()
            ));
        }

        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            service,
        })
    }

    /// Invoke `operation` with `body` and decode the JSON reply.
    ///
    /// # Errors
    /// Returns [`RpcError`] for transport failures, non-success statuses, and
    /// bodies that do not decode as `T`.
    pub async fn call<T: DeserializeOwned>(&self, operation: &str, body: &Value) -> Result<T, RpcError> {
        let target = format!("{}.{operation}", self.service);

        let span = tracing::info_span!(
            "rpc.call",
            rpc.service = self.service,
            rpc.method = operation,
            url = %self.endpoint
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON_1_1)
            .header(TARGET_HEADER, &target)
            .json(body)
            .send()
            .instrument(span)
            .await?;

        let status = response.status();
        let bytes = read_body(response)
            .await?
            .ok_or_else(|| RpcError::Decode(format!("{target}: response body too large")))?;
        let text = String::from_utf8_lossy(&bytes);

        if !status.is_success() {
            let error = service_error(status, &text);
            debug!("{target} failed: {error}");
            return Err(error);
        }

        serde_json::from_str(&text).map_err(|err| RpcError::Decode(format!("{target}: {err}")))
    }
}
