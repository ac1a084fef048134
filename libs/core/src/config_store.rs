use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::ConfigError;
use crate::types::ChannelConfig;

/// Boundary to the configuration collaborator.
///
/// The adapter registry invokes this at most once per bot id ever seen.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn channel_config(&self, bot_id: &str) -> Result<ChannelConfig, ConfigError>;
}

/// Loads per-bot channel configuration from `{root}/{bot_id}.json`.
pub struct FsConfigStore {
    root: PathBuf,
}

impl FsConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn config_path(&self, bot_id: &str) -> Option<PathBuf> {
        // Bot ids come straight off the request path; never let them walk
        // out of the config root.
        if bot_id.is_empty() || bot_id.contains(['/', '\\']) || bot_id.contains("..") {
            return None;
        }
        Some(self.root.join(format!("{bot_id}.json")))
    }
}

#[async_trait]
impl ConfigStore for FsConfigStore {
    async fn channel_config(&self, bot_id: &str) -> Result<ChannelConfig, ConfigError> {
        let path = self.config_path(bot_id).ok_or_else(|| ConfigError::NotFound {
            bot_id: bot_id.to_string(),
        })?;
        let raw = std::fs::read_to_string(&path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                ConfigError::NotFound {
                    bot_id: bot_id.to_string(),
                }
            } else {
                ConfigError::Io {
                    bot_id: bot_id.to_string(),
                    source: err,
                }
            }
        })?;
        serde_json::from_str(&raw).map_err(|err| ConfigError::Parse {
            bot_id: bot_id.to_string(),
            source: err,
        })
    }
}
