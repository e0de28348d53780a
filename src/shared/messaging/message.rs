//! Chat Message Data Structure
//!
//! Represents a message in a conversation. The content is a closed tagged
//! union over the wire `type` field, so rendering and reply resolution are
//! single exhaustive matches instead of string dispatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::conversation::Conversation;
use super::{effective_cursor, Cursor};

/// Typed message content, tagged by the wire `type` field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    /// Plain text; `content` is the text itself
    Text { content: String },
    /// Image; `content` is the direct image URL
    Image { content: String },
    /// GIF; `content` is the provider's GIF id, resolved asynchronously
    Gif { content: String },
    /// Shared post; the thumbnail may be missing
    Post { post: Option<PostRef> },
    /// Shared reel; the thumbnail may be missing
    Reel { post: Option<PostRef> },
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text {
            content: String::new(),
        }
    }
}

impl MessageContent {
    /// The wire name of this content variant
    pub fn kind(&self) -> &'static str {
        match self {
            MessageContent::Text { .. } => "text",
            MessageContent::Image { .. } => "image",
            MessageContent::Gif { .. } => "gif",
            MessageContent::Post { .. } => "post",
            MessageContent::Reel { .. } => "reel",
        }
    }
}

/// Summary of a shared post or reel embedded in a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostRef {
    /// Post identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Thumbnail URL; absent when the referenced post lost its media
    #[serde(default)]
    pub image_url: Option<String>,
    /// Post caption
    #[serde(default)]
    pub caption: Option<String>,
}

/// Represents a chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Unique message ID; at most one entry per uuid in a thread's
    /// collection, whichever path (fetch or push) introduced it
    pub uuid: Uuid,
    /// User who sent the message
    pub sender_id: Uuid,
    /// User the message was sent to
    pub receiver_id: Uuid,
    /// Typed content (wire fields `type` + payload)
    #[serde(flatten)]
    pub content: MessageContent,
    /// When the message was created
    pub created_at: DateTime<Utc>,
    /// The sender's last-known read state, not an ack from this client
    #[serde(default)]
    pub is_read: bool,
    /// Embedded snapshot of the replied-to message, not a live reference
    #[serde(default)]
    pub reply_to: Option<Box<ChatMessage>>,
}

impl ChatMessage {
    /// Create a new text message
    pub fn new_text(sender_id: Uuid, receiver_id: Uuid, content: String) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content: MessageContent::Text { content },
            created_at: Utc::now(),
            is_read: false,
            reply_to: None,
        }
    }

    /// Whether this message travels between the two given users, in either
    /// direction. Used to filter cross-talk from other open sockets.
    pub fn is_between(&self, a: Uuid, b: Uuid) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }

    /// Get a short preview of the message (first N characters for text,
    /// a tag for media)
    pub fn preview(&self, max_len: usize) -> String {
        match &self.content {
            MessageContent::Text { content } => {
                if content.chars().count() <= max_len {
                    content.clone()
                } else {
                    let mut preview: String =
                        content.chars().take(max_len.saturating_sub(3)).collect();
                    preview.push_str("...");
                    preview
                }
            }
            MessageContent::Image { .. } => "[photo]".to_string(),
            MessageContent::Gif { .. } => "[gif]".to_string(),
            MessageContent::Post { .. } => "[post]".to_string(),
            MessageContent::Reel { .. } => "[reel]".to_string(),
        }
    }
}

/// One page of a conversation's message history, newest page first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub next_cursor: Option<Cursor>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub unread_count: u32,
    /// Refreshed conversation entity riding along with page 1
    #[serde(default)]
    pub conversation: Option<Conversation>,
    #[serde(default)]
    pub is_blocked: bool,
}

impl MessagePage {
    /// The cursor for the next (older) page, if any
    pub fn next_cursor(&self) -> Option<&Cursor> {
        effective_cursor(&self.next_cursor)
    }
}
