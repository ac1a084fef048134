use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::sleep;

use crate::activity::{Activity, TurnContext};
use crate::error::{TransportError, truncate_remote_body};

/// Boundary to the external channel transport.
///
/// One call per response pair; the activities within a call are dispatched
/// in order, and the call completes before the next pair is translated. The
/// channel renders them as sequential turn events.
#[async_trait]
pub trait ActivityTransport: Send + Sync {
    async fn send_activities(
        &self,
        ctx: &TurnContext,
        activities: &[Activity],
    ) -> Result<(), TransportError>;
}

/// HTTP transport posting activities to the channel's connector endpoint.
///
/// `delay` activities are not part of the connector wire protocol; they are
/// honored locally by pausing between posts. Delivery is at-most-once: a
/// failed post is reported, never resent.
pub struct HttpActivityClient {
    client: Client,
    bearer: Option<String>,
}

impl HttpActivityClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            bearer: None,
        }
    }

    /// Attaches the pre-provisioned bearer credential for this bot.
    ///
    /// Exchanging channel credentials for a service token is the channel
    /// provider's concern and happens upstream of this client.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

#[async_trait]
impl ActivityTransport for HttpActivityClient {
    async fn send_activities(
        &self,
        ctx: &TurnContext,
        activities: &[Activity],
    ) -> Result<(), TransportError> {
        let service_url = ctx
            .service_url
            .as_deref()
            .ok_or(TransportError::InvalidContext("a service url"))?;
        let conversation_id = ctx
            .conversation_id
            .as_deref()
            .ok_or(TransportError::InvalidContext("a conversation id"))?;
        let url = format!(
            "{}/v3/conversations/{}/activities",
            service_url.trim_end_matches('/'),
            conversation_id
        );

        for activity in activities {
            if let Activity::Delay { value } = activity {
                sleep(Duration::from_millis(*value)).await;
                continue;
            }
            let mut request = self.client.post(&url).json(activity);
            if let Some(token) = &self.bearer {
                request = request.bearer_auth(token);
            }
            let response = request.send().await.map_err(TransportError::Transport)?;
            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<unreadable>".into());
                return Err(TransportError::Remote {
                    status,
                    message: truncate_remote_body(body),
                });
            }
        }

        Ok(())
    }
}
