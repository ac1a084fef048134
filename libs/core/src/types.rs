use serde::{Deserialize, Serialize};

use crate::error::{BatchError, ConfigError};

/// Per-bot channel credentials plus channel-specific settings.
///
/// Loaded once per bot by the configuration collaborator and immutable
/// afterwards.
///
/// ```
/// use relay_core::ChannelConfig;
///
/// let config: ChannelConfig = serde_json::from_str(
///     r#"{ "appId": "app-1", "appPassword": "secret-1" }"#,
/// ).unwrap();
/// assert!(config.validate("b1").is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    pub app_id: String,
    pub app_password: String,
    /// Overrides the reply endpoint advertised by inbound activities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
}

impl ChannelConfig {
    /// Rejects incomplete credential sets before an adapter is built.
    pub fn validate(&self, bot_id: &str) -> Result<(), ConfigError> {
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::Incomplete {
                bot_id: bot_id.to_string(),
                field: "appId",
            });
        }
        if self.app_password.trim().is_empty() {
            return Err(ConfigError::Incomplete {
                bot_id: bot_id.to_string(),
                field: "appPassword",
            });
        }
        Ok(())
    }
}

/// Quick-action button offered alongside a message: label shown to the user,
/// payload posted back when clicked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuickAction {
    pub title: String,
    pub value: String,
}

/// Card data for one carousel entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HeroCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub buttons: Vec<QuickAction>,
}

/// Image reference carried by an image reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One unit of bot output after boundary classification.
///
/// The engine's raw entries are shape-sniffed exactly once, at the batch
/// boundary; everything downstream matches on this enum exhaustively, so an
/// unhandled content shape cannot slip past the compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyContent {
    Text {
        text: String,
    },
    Actions {
        text: Option<String>,
        actions: Vec<QuickAction>,
    },
    Carousel {
        cards: Vec<HeroCard>,
    },
    Image {
        image: ImageRef,
    },
}

/// Raw response entry as produced by the conversation engine.
///
/// The engine interleaves entries in pairs: index i carries the typing flag
/// in `value`, index i+1 carries the content fields of the reply it
/// precedes, for i stepping by 2. This pairing is a boundary contract with
/// the engine and is preserved exactly; [`ResponseBatch::into_pairs`] is the
/// only place that walks it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<QuickAction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<HeroCard>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

/// Ordered batch of raw engine responses for one turn.
///
/// ```
/// use relay_core::{RawReply, ReplyContent, ResponseBatch};
///
/// let batch = ResponseBatch {
///     responses: vec![
///         RawReply { value: Some(true), ..Default::default() },
///         RawReply { text: Some("hello".into()), ..Default::default() },
///     ],
/// };
/// let pairs = batch.into_pairs().unwrap();
/// assert!(pairs[0].typing);
/// assert_eq!(pairs[0].content, ReplyContent::Text { text: "hello".into() });
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResponseBatch {
    pub responses: Vec<RawReply>,
}

/// One (typing flag, reply content) pair extracted from a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyPair {
    pub typing: bool,
    pub content: ReplyContent,
}

impl ResponseBatch {
    /// Converts the interleaved flat batch into explicit pairs.
    ///
    /// An odd-length batch is a contract violation by the engine and is
    /// rejected without reading past the end.
    pub fn into_pairs(self) -> Result<Vec<ReplyPair>, BatchError> {
        let len = self.responses.len();
        if len % 2 != 0 {
            return Err(BatchError::OddLength { len });
        }
        let mut pairs = Vec::with_capacity(len / 2);
        for (chunk_index, chunk) in self.responses.chunks_exact(2).enumerate() {
            let typing = chunk[0].value.unwrap_or(false);
            let content = classify(&chunk[1], chunk_index * 2 + 1)?;
            pairs.push(ReplyPair { typing, content });
        }
        Ok(pairs)
    }
}

/// Classifies one raw entry with the engine's precedence: actions, then
/// attachments, then image, then plain text.
fn classify(raw: &RawReply, index: usize) -> Result<ReplyContent, BatchError> {
    if let Some(actions) = &raw.actions {
        return Ok(ReplyContent::Actions {
            text: raw.text.clone(),
            actions: actions.clone(),
        });
    }
    if let Some(cards) = &raw.attachments {
        return Ok(ReplyContent::Carousel {
            cards: cards.clone(),
        });
    }
    if let Some(image) = &raw.image {
        return Ok(ReplyContent::Image {
            image: image.clone(),
        });
    }
    if let Some(text) = &raw.text {
        return Ok(ReplyContent::Text { text: text.clone() });
    }
    Err(BatchError::UnrecognizedContent { index })
}
