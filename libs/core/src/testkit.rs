//! In-memory collaborator doubles shared by unit and integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use http::StatusCode;
use tokio::sync::Mutex;

use crate::activity::{Activity, ChannelAccount, ConversationAccount, InboundActivity, TurnContext};
use crate::config_store::ConfigStore;
use crate::engine::{ConverseEngine, ConversePayload};
use crate::error::{ConfigError, EngineError, TransportError};
use crate::transport::ActivityTransport;
use crate::types::{ChannelConfig, ResponseBatch};

/// Engine double replaying scripted results in order; an exhausted script
/// answers with empty batches.
#[derive(Default)]
pub struct ScriptedEngine {
    script: Mutex<VecDeque<Result<ResponseBatch, EngineError>>>,
    calls: Mutex<Vec<EngineCall>>,
}

/// Arguments recorded for one `send_message` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCall {
    pub bot_id: String,
    pub account_id: String,
    pub text: String,
    pub channel: String,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_batch(&self, batch: ResponseBatch) {
        self.script.lock().await.push_back(Ok(batch));
    }

    pub async fn push_error(&self, error: EngineError) {
        self.script.lock().await.push_back(Err(error));
    }

    pub async fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ConverseEngine for ScriptedEngine {
    async fn send_message(
        &self,
        bot_id: &str,
        account_id: &str,
        payload: ConversePayload,
        channel: &str,
    ) -> Result<ResponseBatch, EngineError> {
        self.calls.lock().await.push(EngineCall {
            bot_id: bot_id.to_string(),
            account_id: account_id.to_string(),
            text: payload.text,
            channel: channel.to_string(),
        });
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(ResponseBatch::default()))
    }
}

/// Config store double with a lookup counter.
#[derive(Default)]
pub struct MemoryConfigStore {
    configs: HashMap<String, ChannelConfig>,
    lookups: AtomicUsize,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, bot_id: impl Into<String>, config: ChannelConfig) -> Self {
        self.configs.insert(bot_id.into(), config);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn channel_config(&self, bot_id: &str) -> Result<ChannelConfig, ConfigError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.configs
            .get(bot_id)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound {
                bot_id: bot_id.to_string(),
            })
    }
}

/// Transport double recording every `send_activities` call.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Vec<Activity>>>,
    fail: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail with a remote error.
    pub fn fail_sends(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Lets sends succeed again.
    pub fn heal(&self) {
        self.fail.store(false, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<Vec<Activity>> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ActivityTransport for RecordingTransport {
    async fn send_activities(
        &self,
        _ctx: &TurnContext,
        activities: &[Activity],
    ) -> Result<(), TransportError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Remote {
                status: StatusCode::BAD_GATEWAY,
                message: "scripted failure".into(),
            });
        }
        self.sent.lock().await.push(activities.to_vec());
        Ok(())
    }
}

/// Sample channel credentials for tests.
pub fn sample_config() -> ChannelConfig {
    ChannelConfig {
        app_id: "app-1".into(),
        app_password: "secret-1".into(),
        service_url: None,
    }
}

/// Inbound `message` activity addressed like a real channel delivery.
pub fn inbound_message(user_id: &str, text: &str) -> InboundActivity {
    InboundActivity {
        activity_type: "message".into(),
        id: Some("act-1".into()),
        text: Some(text.into()),
        from: Some(ChannelAccount {
            id: user_id.into(),
            name: None,
        }),
        recipient: None,
        conversation: Some(ConversationAccount { id: "conv-1".into() }),
        service_url: Some("https://channel.example/api".into()),
        channel_id: Some("microsoft".into()),
    }
}
