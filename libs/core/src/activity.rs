use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire content type of a hero card attachment.
pub const HERO_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.hero";

/// Attachment layout that renders cards as a horizontally scrollable strip.
pub const CAROUSEL_LAYOUT: &str = "carousel";

/// One unit in the external channel's activity protocol.
///
/// An external turn is satisfied by sending an ordered sequence of these.
/// The wire shape is the channel's activity JSON:
///
/// ```
/// use relay_core::Activity;
/// use serde_json::json;
///
/// let wire = serde_json::to_value(&Activity::Delay { value: 250 }).unwrap();
/// assert_eq!(wire, json!({ "type": "delay", "value": 250 }));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Activity {
    Typing,
    Delay { value: u64 },
    Message(MessageActivity),
}

impl Activity {
    /// Message activity carrying only plain text.
    pub fn message_text(text: impl Into<String>) -> Self {
        Activity::Message(MessageActivity {
            text: Some(text.into()),
            ..Default::default()
        })
    }
}

/// Body of a `message` activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageActivity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_actions: Option<SuggestedActions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_layout: Option<String>,
}

/// Quick-action buttons rendered next to a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SuggestedActions {
    pub actions: Vec<CardAction>,
}

/// Button rendered by the channel client; `imBack` posts `value` back as the
/// user's next message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub title: String,
    pub value: String,
}

impl CardAction {
    pub fn im_back(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            action_type: "imBack".into(),
            title: title.into(),
            value: value.into(),
        }
    }
}

/// Attachment on a message activity: inline card `content` or a `contentUrl`
/// reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Inbound activity as delivered by the external channel, already
/// deserialized by the routing layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InboundActivity {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

impl InboundActivity {
    /// Only `message` activities produce outbound effects; everything else
    /// is accepted and ignored.
    pub fn is_message(&self) -> bool {
        self.activity_type == "message"
    }
}

/// Account participating in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Conversation reference attached to inbound activities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationAccount {
    pub id: String,
}

/// Reply addressing for one turn, extracted once from the inbound activity
/// so downstream code never touches the raw request again.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnContext {
    pub bot_id: String,
    pub user_id: Option<String>,
    pub conversation_id: Option<String>,
    pub service_url: Option<String>,
}

impl TurnContext {
    pub fn from_inbound(bot_id: impl Into<String>, activity: &InboundActivity) -> Self {
        Self {
            bot_id: bot_id.into(),
            user_id: activity.from.as_ref().map(|account| account.id.clone()),
            conversation_id: activity.conversation.as_ref().map(|c| c.id.clone()),
            service_url: activity.service_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typing_activity_wire_shape() {
        let wire = serde_json::to_value(&Activity::Typing).unwrap();
        assert_eq!(wire, json!({ "type": "typing" }));
    }

    #[test]
    fn message_activity_wire_shape() {
        let activity = Activity::Message(MessageActivity {
            text: Some("hello".into()),
            suggested_actions: Some(SuggestedActions {
                actions: vec![CardAction::im_back("Yes", "yes")],
            }),
            ..Default::default()
        });
        let wire = serde_json::to_value(&activity).unwrap();
        assert_eq!(
            wire,
            json!({
                "type": "message",
                "text": "hello",
                "suggestedActions": {
                    "actions": [{ "type": "imBack", "title": "Yes", "value": "yes" }]
                }
            })
        );
    }

    #[test]
    fn inbound_activity_parses_channel_payload() {
        let inbound: InboundActivity = serde_json::from_value(json!({
            "type": "message",
            "id": "act-9",
            "text": "hi",
            "from": { "id": "u1", "name": "User One" },
            "conversation": { "id": "conv-7" },
            "serviceUrl": "https://channel.example/api",
            "channelId": "microsoft"
        }))
        .unwrap();

        assert!(inbound.is_message());
        let ctx = TurnContext::from_inbound("b1", &inbound);
        assert_eq!(ctx.user_id.as_deref(), Some("u1"));
        assert_eq!(ctx.conversation_id.as_deref(), Some("conv-7"));
        assert_eq!(ctx.service_url.as_deref(), Some("https://channel.example/api"));
    }

    #[test]
    fn non_message_types_are_not_messages() {
        let inbound: InboundActivity =
            serde_json::from_value(json!({ "type": "conversationUpdate" })).unwrap();
        assert!(!inbound.is_message());
    }
}
