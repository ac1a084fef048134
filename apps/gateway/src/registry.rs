use std::sync::Arc;

use dashmap::DashMap;
use relay_core::{
    Activity, ActivityTransport, ChannelConfig, ConfigError, ConfigStore, HttpActivityClient,
    InboundActivity, TurnContext, TurnError,
};
use tokio::sync::OnceCell;
use tracing::{error, warn};

/// Single user-visible failure signal for a broken turn.
pub const FALLBACK_TEXT: &str = "Oops. Something went wrong! Please try something else.";

/// Builds the per-bot transport once the bot's configuration is known.
pub type TransportFactory =
    dyn Fn(&str, &ChannelConfig) -> Arc<dyn ActivityTransport> + Send + Sync;

/// Per-bot adapter: owns one channel configuration, one transport instance,
/// and the turn-error policy. Exclusively owned by its registry entry and
/// never shared across bots; lives for the process lifetime.
pub struct ScopedAdapter {
    bot_id: String,
    config: ChannelConfig,
    transport: Arc<dyn ActivityTransport>,
}

impl std::fmt::Debug for ScopedAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedAdapter")
            .field("bot_id", &self.bot_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ScopedAdapter {
    fn new(bot_id: String, config: ChannelConfig, transport: Arc<dyn ActivityTransport>) -> Self {
        Self {
            bot_id,
            config,
            transport,
        }
    }

    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    pub(crate) fn transport(&self) -> &dyn ActivityTransport {
        self.transport.as_ref()
    }

    /// Extracts the reply addressing for one inbound request. A configured
    /// service URL overrides the one advertised by the activity.
    pub fn turn_context(&self, inbound: &InboundActivity) -> TurnContext {
        let mut ctx = TurnContext::from_inbound(self.bot_id.clone(), inbound);
        if let Some(url) = &self.config.service_url {
            ctx.service_url = Some(url.clone());
        }
        ctx
    }

    /// Turn-error hook: log the failure against the bot identity, then
    /// best-effort send one generic fallback activity on the same turn
    /// context. A failed fallback send is logged and dropped.
    pub async fn handle_turn_error(&self, ctx: &TurnContext, err: &TurnError) {
        error!(bot_id = %self.bot_id, error = %err, "turn processing failed");
        let fallback = [Activity::message_text(FALLBACK_TEXT)];
        if let Err(send_err) = self.transport.send_activities(ctx, &fallback).await {
            warn!(bot_id = %self.bot_id, error = %send_err, "failed to deliver fallback activity");
        }
    }
}

/// Lazily-populated cache of one [`ScopedAdapter`] per bot id.
///
/// Owned by the hosting service and injected where needed; there is no
/// process-wide instance. Entries are never evicted.
pub struct AdapterRegistry {
    store: Arc<dyn ConfigStore>,
    transports: Arc<TransportFactory>,
    adapters: DashMap<String, Arc<OnceCell<Arc<ScopedAdapter>>>>,
}

impl AdapterRegistry {
    /// Registry wired to the HTTP channel transport.
    pub fn new(store: Arc<dyn ConfigStore>, http: reqwest::Client) -> Self {
        Self::with_transport_factory(
            store,
            Arc::new(
                move |_bot_id: &str, config: &ChannelConfig| -> Arc<dyn ActivityTransport> {
                    Arc::new(
                        HttpActivityClient::new(http.clone())
                            .with_bearer(config.app_password.clone()),
                    )
                },
            ),
        )
    }

    /// Registry with an injected transport factory.
    pub fn with_transport_factory(
        store: Arc<dyn ConfigStore>,
        transports: Arc<TransportFactory>,
    ) -> Self {
        Self {
            store,
            transports,
            adapters: DashMap::new(),
        }
    }

    /// Returns the cached adapter for `bot_id`, creating it on first sight.
    ///
    /// Construction fetches the bot's channel configuration exactly once,
    /// even under concurrent first requests for the same id; a failed fetch
    /// or validation leaves nothing cached.
    pub async fn resolve(&self, bot_id: &str) -> Result<Arc<ScopedAdapter>, ConfigError> {
        let cell = self.adapters.entry(bot_id.to_string()).or_default().clone();
        let adapter = cell.get_or_try_init(|| self.init_adapter(bot_id)).await?;
        Ok(Arc::clone(adapter))
    }

    async fn init_adapter(&self, bot_id: &str) -> Result<Arc<ScopedAdapter>, ConfigError> {
        let config = self.store.channel_config(bot_id).await?;
        config.validate(bot_id)?;
        let transport = (self.transports)(bot_id, &config);
        Ok(Arc::new(ScopedAdapter::new(
            bot_id.to_string(),
            config,
            transport,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::testkit::{MemoryConfigStore, RecordingTransport, sample_config};

    fn registry_with(store: MemoryConfigStore) -> (AdapterRegistry, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new());
        let for_factory = transport.clone();
        let registry = AdapterRegistry::with_transport_factory(
            Arc::new(store),
            Arc::new(
                move |_bot_id: &str, _config: &ChannelConfig| -> Arc<dyn ActivityTransport> {
                    for_factory.clone()
                },
            ),
        );
        (registry, transport)
    }

    #[tokio::test]
    async fn resolving_twice_returns_the_same_adapter_and_fetches_once() {
        let store = Arc::new(MemoryConfigStore::new().with_config("b1", sample_config()));
        let transport = Arc::new(RecordingTransport::new());
        let for_factory = transport.clone();
        let registry = AdapterRegistry::with_transport_factory(
            store.clone(),
            Arc::new(
                move |_bot_id: &str, _config: &ChannelConfig| -> Arc<dyn ActivityTransport> {
                    for_factory.clone()
                },
            ),
        );

        let first = registry.resolve("b1").await.unwrap();
        let second = registry.resolve("b1").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn unknown_bot_is_not_cached() {
        let store = Arc::new(MemoryConfigStore::new());
        let transport = Arc::new(RecordingTransport::new());
        let for_factory = transport.clone();
        let registry = AdapterRegistry::with_transport_factory(
            store.clone(),
            Arc::new(
                move |_bot_id: &str, _config: &ChannelConfig| -> Arc<dyn ActivityTransport> {
                    for_factory.clone()
                },
            ),
        );

        assert!(matches!(
            registry.resolve("ghost").await.unwrap_err(),
            ConfigError::NotFound { .. }
        ));
        assert!(matches!(
            registry.resolve("ghost").await.unwrap_err(),
            ConfigError::NotFound { .. }
        ));
        // Both attempts hit the store: nothing was cached in between.
        assert_eq!(store.lookups(), 2);
    }

    #[tokio::test]
    async fn incomplete_config_is_rejected_and_not_cached() {
        let bad = ChannelConfig {
            app_id: "app".into(),
            app_password: "".into(),
            service_url: None,
        };
        let store = Arc::new(MemoryConfigStore::new().with_config("b1", bad));
        let transport = Arc::new(RecordingTransport::new());
        let for_factory = transport.clone();
        let registry = AdapterRegistry::with_transport_factory(
            store.clone(),
            Arc::new(
                move |_bot_id: &str, _config: &ChannelConfig| -> Arc<dyn ActivityTransport> {
                    for_factory.clone()
                },
            ),
        );

        assert!(matches!(
            registry.resolve("b1").await.unwrap_err(),
            ConfigError::Incomplete { .. }
        ));
        assert!(matches!(
            registry.resolve("b1").await.unwrap_err(),
            ConfigError::Incomplete { .. }
        ));
        assert_eq!(store.lookups(), 2);
    }

    #[tokio::test]
    async fn configured_service_url_overrides_inbound() {
        let config = ChannelConfig {
            service_url: Some("https://override.example".into()),
            ..sample_config()
        };
        let store = MemoryConfigStore::new().with_config("b1", config);
        let (registry, _transport) = registry_with(store);

        let adapter = registry.resolve("b1").await.unwrap();
        let ctx = adapter.turn_context(&relay_core::testkit::inbound_message("u1", "hi"));
        assert_eq!(ctx.service_url.as_deref(), Some("https://override.example"));
    }
}
