use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Runtime configuration for the relay gateway, resolved from environment
/// variables with development defaults.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub addr: SocketAddr,
    pub converse_base: String,
    pub config_root: PathBuf,
    pub channel_tag: String,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let addr = std::env::var("RELAY_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".into())
            .parse()
            .context("invalid RELAY_BIND address")?;
        let converse_base = std::env::var("RELAY_CONVERSE_BASE")
            .unwrap_or_else(|_| "http://127.0.0.1:3000/api/v1/".into());
        let config_root =
            PathBuf::from(std::env::var("RELAY_CONFIG_ROOT").unwrap_or_else(|_| "bots".into()));
        let channel_tag =
            std::env::var("RELAY_CHANNEL_TAG").unwrap_or_else(|_| "microsoft".into());
        Ok(Self {
            addr,
            converse_base,
            config_root,
            channel_tag,
        })
    }
}
