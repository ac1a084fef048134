use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use metrics::counter;
use relay_core::{ConfigError, ConverseEngine, InboundActivity};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::registry::AdapterRegistry;
use crate::turn::{TurnOutcome, process_turn};

/// Shared state injected into the channel routes.
pub struct GatewayState {
    pub registry: AdapterRegistry,
    pub engine: Arc<dyn ConverseEngine>,
    pub channel_tag: String,
}

/// Routes: the channel's message webhook plus a health probe.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/{bot_id}/messages", post(messages))
        .layer(Extension(state))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: &'static str,
}

/// Error surfaced to the channel when a turn cannot even start.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Config(ConfigError::NotFound { .. }) => StatusCode::NOT_FOUND,
            GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

async fn messages(
    Path(bot_id): Path<String>,
    Extension(state): Extension<Arc<GatewayState>>,
    Json(inbound): Json<InboundActivity>,
) -> Result<Json<ApiResponse>, GatewayError> {
    handle_messages(bot_id, state, inbound).await
}

/// Resolves the bot's adapter and runs the turn.
///
/// Turn-level failures are consumed by the adapter's error hook and still
/// answer 200: the in-channel fallback activity is the user-visible failure
/// signal. Only adapter resolution failures surface as HTTP errors.
pub async fn handle_messages(
    bot_id: String,
    state: Arc<GatewayState>,
    inbound: InboundActivity,
) -> Result<Json<ApiResponse>, GatewayError> {
    let adapter = state.registry.resolve(&bot_id).await?;
    let ctx = adapter.turn_context(&inbound);
    let span = tracing::info_span!("turn", bot_id = %bot_id, turn_id = %Uuid::new_v4());
    async {
        match process_turn(
            adapter.as_ref(),
            state.engine.as_ref(),
            &state.channel_tag,
            &ctx,
            &inbound,
        )
        .await
        {
            Ok(TurnOutcome::Processed) => {
                counter!(
                    "relay_turns_total",
                    "bot_id" => bot_id.clone(),
                    "outcome" => "processed"
                )
                .increment(1);
                Ok(Json(ApiResponse {
                    status: "processed",
                }))
            }
            Ok(TurnOutcome::Ignored) => {
                counter!(
                    "relay_turns_total",
                    "bot_id" => bot_id.clone(),
                    "outcome" => "ignored"
                )
                .increment(1);
                Ok(Json(ApiResponse { status: "ignored" }))
            }
            Err(err) => {
                counter!("relay_turn_errors_total", "bot_id" => bot_id.clone()).increment(1);
                adapter.handle_turn_error(&ctx, &err).await;
                Ok(Json(ApiResponse { status: "failed" }))
            }
        }
    }
    .instrument(span)
    .await
}
