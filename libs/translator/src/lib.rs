//! Translates classified reply content into ordered channel activities.
//!
//! The main entry point is [`translate`], a pure function mapping one reply
//! (plus its typing flag) into the activity sequence the external channel
//! renders for that pair. Translation never suspends and never touches
//! shared state.

use relay_core::{
    Activity, Attachment, CAROUSEL_LAYOUT, CardAction, HERO_CARD_CONTENT_TYPE, HeroCard, ImageRef,
    MessageActivity, QuickAction, ReplyContent, SuggestedActions,
};
use serde_json::{Value, json};

/// Pause inserted after a typing indicator so the channel client renders a
/// believable typing pause before the content appears. Fixed; upstream
/// batches carry no timing hints beyond the boolean flag.
pub const TYPING_DELAY_MS: u64 = 250;

/// Fallback content type when an image URL's extension is unrecognized.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Maps one reply into the ordered activity sequence for its pair.
///
/// A set typing flag prefixes `typing` + `delay`; it never replaces the
/// content activity. Exactly one content activity follows, picked by an
/// exhaustive match over the reply variant.
///
/// ```
/// use relay_core::{Activity, ReplyContent};
/// use relay_translator::{TYPING_DELAY_MS, translate};
///
/// let activities = translate(&ReplyContent::Text { text: "hello".into() }, true);
/// assert_eq!(activities.len(), 3);
/// assert_eq!(activities[0], Activity::Typing);
/// assert_eq!(activities[1], Activity::Delay { value: TYPING_DELAY_MS });
/// ```
pub fn translate(content: &ReplyContent, typing: bool) -> Vec<Activity> {
    let mut activities = Vec::with_capacity(3);
    if typing {
        activities.push(Activity::Typing);
        activities.push(Activity::Delay {
            value: TYPING_DELAY_MS,
        });
    }
    activities.push(content_activity(content));
    activities
}

fn content_activity(content: &ReplyContent) -> Activity {
    match content {
        ReplyContent::Text { text } => Activity::message_text(text.clone()),
        ReplyContent::Actions { text, actions } => suggested_actions(text.as_deref(), actions),
        ReplyContent::Carousel { cards } => carousel(cards),
        ReplyContent::Image { image } => content_url(image),
    }
}

fn suggested_actions(text: Option<&str>, actions: &[QuickAction]) -> Activity {
    Activity::Message(MessageActivity {
        text: text.map(str::to_string),
        suggested_actions: Some(SuggestedActions {
            actions: actions
                .iter()
                .map(|action| CardAction::im_back(action.title.clone(), action.value.clone()))
                .collect(),
        }),
        ..Default::default()
    })
}

fn carousel(cards: &[HeroCard]) -> Activity {
    Activity::Message(MessageActivity {
        attachments: cards.iter().map(hero_attachment).collect(),
        attachment_layout: Some(CAROUSEL_LAYOUT.into()),
        ..Default::default()
    })
}

fn hero_attachment(card: &HeroCard) -> Attachment {
    let mut content = serde_json::Map::new();
    if let Some(title) = &card.title {
        content.insert("title".into(), json!(title));
    }
    if let Some(subtitle) = &card.subtitle {
        content.insert("subtitle".into(), json!(subtitle));
    }
    if !card.images.is_empty() {
        let images: Vec<Value> = card.images.iter().map(|url| json!({ "url": url })).collect();
        content.insert("images".into(), Value::Array(images));
    }
    if !card.buttons.is_empty() {
        let buttons: Vec<Value> = card
            .buttons
            .iter()
            .map(|button| json!(CardAction::im_back(button.title.clone(), button.value.clone())))
            .collect();
        content.insert("buttons".into(), Value::Array(buttons));
    }
    Attachment {
        content_type: HERO_CARD_CONTENT_TYPE.into(),
        content: Some(Value::Object(content)),
        ..Default::default()
    }
}

fn content_url(image: &ImageRef) -> Activity {
    Activity::Message(MessageActivity {
        attachments: vec![Attachment {
            content_type: content_type_for(&image.url).into(),
            content_url: Some(image.url.clone()),
            name: image.title.clone(),
            ..Default::default()
        }],
        ..Default::default()
    })
}

/// Derives a content type from the URL's file extension, ignoring query and
/// fragment parts.
///
/// ```
/// use relay_translator::content_type_for;
///
/// assert_eq!(content_type_for("https://cdn.example/a.png"), "image/png");
/// assert_eq!(content_type_for("https://cdn.example/a.dat"), "application/octet-stream");
/// ```
pub fn content_type_for(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = match path.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return DEFAULT_CONTENT_TYPE,
    };
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
