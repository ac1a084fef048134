use relay_core::{ConverseEngine, ConversePayload, InboundActivity, TurnContext, TurnError};
use relay_translator::translate;
use tracing::debug;

use crate::registry::ScopedAdapter;

/// What a completed turn did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A message turn ran through the engine and its replies were sent.
    Processed,
    /// A non-message activity, accepted with no outbound effect.
    Ignored,
}

/// Runs one inbound activity through the conversation engine and relays the
/// translated replies, pair by pair.
///
/// Pairs are strictly sequential: pair k's activities are fully dispatched
/// before pair k+1 is translated, because the channel renders them as
/// ordered turn events. Any failure aborts the turn and propagates to the
/// caller's error hook; nothing partial is sent for the failing pair.
pub async fn process_turn(
    adapter: &ScopedAdapter,
    engine: &dyn ConverseEngine,
    channel_tag: &str,
    ctx: &TurnContext,
    inbound: &InboundActivity,
) -> Result<TurnOutcome, TurnError> {
    if !inbound.is_message() {
        debug!(
            bot_id = %adapter.bot_id(),
            activity_type = %inbound.activity_type,
            "ignoring non-message activity"
        );
        return Ok(TurnOutcome::Ignored);
    }

    let account_id = ctx.user_id.as_deref().ok_or(TurnError::MissingSender)?;
    let text = inbound.text.clone().unwrap_or_default();

    let batch = engine
        .send_message(
            adapter.bot_id(),
            account_id,
            ConversePayload { text },
            channel_tag,
        )
        .await?;
    let pairs = batch.into_pairs()?;

    for pair in &pairs {
        let activities = translate(&pair.content, pair.typing);
        adapter.transport().send_activities(ctx, &activities).await?;
    }

    Ok(TurnOutcome::Processed)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use relay_core::testkit::{
        MemoryConfigStore, RecordingTransport, ScriptedEngine, inbound_message, sample_config,
    };
    use relay_core::{
        Activity, ActivityTransport, ChannelConfig, EngineError, RawReply, ResponseBatch,
    };

    use super::*;
    use crate::registry::AdapterRegistry;

    async fn adapter_with_transport() -> (Arc<ScopedAdapter>, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new());
        let for_factory = transport.clone();
        let registry = AdapterRegistry::with_transport_factory(
            Arc::new(MemoryConfigStore::new().with_config("b1", sample_config())),
            Arc::new(
                move |_bot_id: &str, _config: &ChannelConfig| -> Arc<dyn ActivityTransport> {
                    for_factory.clone()
                },
            ),
        );
        (registry.resolve("b1").await.unwrap(), transport)
    }

    fn text_batch(entries: &[(bool, &str)]) -> ResponseBatch {
        let mut responses = Vec::new();
        for (typing, text) in entries {
            responses.push(RawReply {
                value: Some(*typing),
                ..Default::default()
            });
            responses.push(RawReply {
                text: Some((*text).into()),
                ..Default::default()
            });
        }
        ResponseBatch { responses }
    }

    #[tokio::test]
    async fn non_message_activities_are_ignored() {
        let (adapter, transport) = adapter_with_transport().await;
        let engine = ScriptedEngine::new();
        let inbound: InboundActivity =
            serde_json::from_value(serde_json::json!({ "type": "conversationUpdate" })).unwrap();
        let ctx = adapter.turn_context(&inbound);

        let outcome = process_turn(&adapter, &engine, "microsoft", &ctx, &inbound)
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::Ignored);
        assert!(engine.calls().await.is_empty());
        assert!(transport.sent().await.is_empty());
    }

    #[tokio::test]
    async fn missing_sender_fails_the_turn() {
        let (adapter, _transport) = adapter_with_transport().await;
        let engine = ScriptedEngine::new();
        let mut inbound = inbound_message("u1", "hi");
        inbound.from = None;
        let ctx = adapter.turn_context(&inbound);

        let err = process_turn(&adapter, &engine, "microsoft", &ctx, &inbound)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::MissingSender));
        assert!(engine.calls().await.is_empty());
    }

    #[tokio::test]
    async fn pairs_are_sent_in_order_one_call_each() {
        let (adapter, transport) = adapter_with_transport().await;
        let engine = ScriptedEngine::new();
        engine
            .push_batch(text_batch(&[(false, "one"), (true, "two")]))
            .await;
        let inbound = inbound_message("u1", "hi");
        let ctx = adapter.turn_context(&inbound);

        let outcome = process_turn(&adapter, &engine, "microsoft", &ctx, &inbound)
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::Processed);
        let sent = transport.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], vec![Activity::message_text("one")]);
        assert_eq!(
            sent[1],
            vec![
                Activity::Typing,
                Activity::Delay { value: 250 },
                Activity::message_text("two"),
            ]
        );
    }

    #[tokio::test]
    async fn engine_failures_propagate() {
        let (adapter, transport) = adapter_with_transport().await;
        let engine = ScriptedEngine::new();
        engine
            .push_error(EngineError::Remote {
                status: http_status_server_error(),
                message: "engine exploded".into(),
            })
            .await;
        let inbound = inbound_message("u1", "hi");
        let ctx = adapter.turn_context(&inbound);

        let err = process_turn(&adapter, &engine, "microsoft", &ctx, &inbound)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::Engine(_)));
        assert!(transport.sent().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_batch_aborts_before_any_send() {
        let (adapter, transport) = adapter_with_transport().await;
        let engine = ScriptedEngine::new();
        engine
            .push_batch(ResponseBatch {
                responses: vec![
                    RawReply {
                        value: Some(false),
                        ..Default::default()
                    },
                    RawReply {
                        text: Some("fine".into()),
                        ..Default::default()
                    },
                    RawReply {
                        value: Some(false),
                        ..Default::default()
                    },
                    RawReply::default(),
                ],
            })
            .await;
        let inbound = inbound_message("u1", "hi");
        let ctx = adapter.turn_context(&inbound);

        let err = process_turn(&adapter, &engine, "microsoft", &ctx, &inbound)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::Batch(_)));
        assert!(transport.sent().await.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_aborts_the_turn() {
        let (adapter, transport) = adapter_with_transport().await;
        transport.fail_sends();
        let engine = ScriptedEngine::new();
        engine.push_batch(text_batch(&[(false, "one")])).await;
        let inbound = inbound_message("u1", "hi");
        let ctx = adapter.turn_context(&inbound);

        let err = process_turn(&adapter, &engine, "microsoft", &ctx, &inbound)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::Transport(_)));
    }

    fn http_status_server_error() -> axum::http::StatusCode {
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    }
}
