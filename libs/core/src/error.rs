use http::StatusCode;
use thiserror::Error;

/// Cap on remote error bodies carried inside error values.
const REMOTE_BODY_LIMIT: usize = 512;

pub(crate) fn truncate_remote_body(mut body: String) -> String {
    if body.len() > REMOTE_BODY_LIMIT {
        let mut cut = REMOTE_BODY_LIMIT;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

/// Failures while loading or validating a bot's channel configuration.
///
/// Fatal to the offending request only; the adapter registry never caches an
/// adapter built from a configuration that failed here.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no channel configuration found for bot `{bot_id}`")]
    NotFound { bot_id: String },
    #[error("channel configuration for bot `{bot_id}` is missing `{field}`")]
    Incomplete {
        bot_id: String,
        field: &'static str,
    },
    #[error("failed to read channel configuration for bot `{bot_id}`")]
    Io {
        bot_id: String,
        #[source]
        source: std::io::Error,
    },
    #[error("channel configuration for bot `{bot_id}` is not valid JSON")]
    Parse {
        bot_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures from the conversation engine collaborator.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("conversation engine configuration error")]
    Config(#[source] anyhow::Error),
    #[error("conversation engine transport error")]
    Transport(#[source] reqwest::Error),
    #[error("conversation engine returned status {status}: {message}")]
    Remote { status: StatusCode, message: String },
    #[error("conversation engine response decode error")]
    Decode(#[source] reqwest::Error),
}

/// Contract violations in the engine's interleaved response batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("response batch has odd length {len}; expected interleaved flag/reply pairs")]
    OddLength { len: usize },
    #[error("response entry at index {index} carries no recognized content")]
    UnrecognizedContent { index: usize },
}

/// Failures while delivering activities to the external channel.
///
/// Delivery is at-most-once per pair: these are logged, never retried, since
/// a resend could duplicate partially delivered multi-activity pairs.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("turn context is missing {0}")]
    InvalidContext(&'static str),
    #[error("activity transport error")]
    Transport(#[source] reqwest::Error),
    #[error("activity endpoint returned status {status}: {message}")]
    Remote { status: StatusCode, message: String },
}

/// Umbrella for everything caught at the turn boundary.
///
/// Converted into one log line tagged with the bot identity plus a single
/// best-effort fallback activity; never crashes the owning process.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("conversation engine call failed")]
    Engine(#[from] EngineError),
    #[error("malformed response batch")]
    Batch(#[from] BatchError),
    #[error("activity delivery failed")]
    Transport(#[from] TransportError),
    #[error("inbound message activity has no sender account id")]
    MissingSender,
}
