use anyhow::{anyhow, Context};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::api::event::{TriggerEvent, TriggerPhase, TriggerResponse};
use crate::flow::{ChallengeFlow, FlowError, UserStatus};

pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Run the phase named by `triggerSource` against the event.
///
/// # Errors
/// Client errors from the verify phase pass through; unsupported triggers and
/// undecodable events are internal errors.
pub async fn dispatch(flow: &ChallengeFlow, payload: &Value) -> Result<TriggerResponse, FlowError> {
    let event = TriggerEvent::deserialize(payload).context("invalid trigger event")?;
    let user_status = event.user_status();

    info!(
        trigger = %event.trigger_source,
        user = %event.user_name,
        pool = %event.user_pool_id,
        user_status = user_status.as_ref().map_or("none", UserStatus::as_str),
        "trigger received"
    );

    let phase = TriggerPhase::parse(&event.trigger_source)
        .ok_or_else(|| anyhow!("Unsupported event type {}", event.trigger_source))?;

    match phase {
        TriggerPhase::DefineAuthChallenge => Ok(flow.decide(&event.into_history()).into()),
        TriggerPhase::CreateAuthChallenge => {
            let status = user_status.unwrap_or_else(|| UserStatus::Unknown(String::new()));
            Ok(flow.build(&status).into())
        }
        TriggerPhase::VerifyAuthChallengeResponse => {
            let verdict = flow.verify(event.into_verify_request()).await?;
            Ok(TriggerResponse::answer(verdict.answer_correct()))
        }
    }
}

fn message(status: StatusCode, message: &str) -> axum::response::Response {
    (status, Json(json!({ "message": message }))).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/triggers",
    request_body = TriggerEvent,
    responses(
        (status = 200, description = "Event returned with response fields populated", body = TriggerEvent),
        (status = 400, description = "Missing payload or authentication denied", body = String),
        (status = 500, description = "Internal Server Error", body = String)
    ),
    tag = "triggers"
)]
// axum handler for trigger events
pub async fn trigger(
    flow: Extension<Arc<ChallengeFlow>>,
    payload: Option<Json<Value>>,
) -> impl IntoResponse {
    let Some(Json(mut event)) = payload else {
        return message(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let result = dispatch(&flow, &event).await.and_then(|response| {
        response
            .merge_into(&mut event)
            .map_err(FlowError::Internal)
    });

    match result {
        Ok(()) => {
            debug!(response = %event["response"], "trigger handled");
            (StatusCode::OK, Json(event)).into_response()
        }
        Err(FlowError::Client(reason)) => {
            warn!(%reason, "authentication denied");
            message(StatusCode::BAD_REQUEST, reason)
        }
        Err(FlowError::Internal(err)) => {
            // Full detail stays in the logs.
            error!("trigger failed: {err:#}");
            message(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR)
        }
    }
}
