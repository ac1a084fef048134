use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, truncate_remote_body};
use crate::types::ResponseBatch;

/// Message payload forwarded to the conversation engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversePayload {
    pub text: String,
}

/// Boundary to the internal conversation engine.
///
/// Implementations return the engine's raw interleaved response batch; see
/// [`ResponseBatch`](crate::ResponseBatch) for the pairing contract. Call
/// failures propagate as turn-processing failures and are never swallowed.
#[async_trait]
pub trait ConverseEngine: Send + Sync {
    async fn send_message(
        &self,
        bot_id: &str,
        account_id: &str,
        payload: ConversePayload,
        channel: &str,
    ) -> Result<ResponseBatch, EngineError>;
}

/// HTTP client for the conversation engine's converse endpoint.
#[derive(Debug)]
pub struct HttpConverseClient {
    client: Client,
    base_url: Url,
}

impl HttpConverseClient {
    pub fn new(client: Client, base_url: &str) -> Result<Self, EngineError> {
        // A trailing slash keeps the last base path segment when joining.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let url = Url::parse(&normalized).map_err(|err| EngineError::Config(err.into()))?;
        Ok(Self {
            client,
            base_url: url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, EngineError> {
        self.base_url
            .join(path)
            .map_err(|err| EngineError::Config(err.into()))
    }
}

#[async_trait]
impl ConverseEngine for HttpConverseClient {
    async fn send_message(
        &self,
        bot_id: &str,
        account_id: &str,
        payload: ConversePayload,
        channel: &str,
    ) -> Result<ResponseBatch, EngineError> {
        let url = self.endpoint(&format!("bots/{bot_id}/converse/{account_id}"))?;
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "text": payload.text, "channel": channel }))
            .send()
            .await
            .map_err(EngineError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".into());
            return Err(EngineError::Remote {
                status,
                message: truncate_remote_body(body),
            });
        }

        response
            .json::<ResponseBatch>()
            .await
            .map_err(EngineError::Decode)
    }
}
