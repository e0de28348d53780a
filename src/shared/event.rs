//! Real-time Event System
//!
//! This module defines the typed event unions exchanged over the realtime
//! transport. Frames are adjacently tagged JSON objects of the shape
//! `{"event": <name>, "data": <payload>}`; the enums below are the closed
//! set of event names, so consumers dispatch with an exhaustive match
//! instead of guessing payload shapes from strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::messaging::message::{ChatMessage, MessageContent, PostRef};

/// Events pushed by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// A message was delivered to this user or echoed back to its sender
    NewMessage(ChatMessage),
    /// Full replacement of the online-user set
    OnlineUsers(Vec<Uuid>),
    /// Server-side nudge to re-fetch the conversation list
    RefetchConversation,
    /// The other participant is typing
    Typing(TypingNotice),
    /// A bulk post share finished delivering
    BulkPostComplete,
    /// A bulk post share failed
    BulkPostError,
}

/// Typing indicator payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    pub sender_id: Uuid,
}

/// Events emitted by this client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Send a direct message
    SendMessage(OutgoingMessage),
    /// Request the current online-user set
    GetOnlineUsers,
    /// Share a post or reel with several friends at once
    SendPost(OutgoingPost),
}

/// Outbound direct message.
///
/// `reply_to_message_object` carries a snapshot of the replied-to message so
/// the receiver can render the preview before the referenced message
/// round-trips.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub receiver_id: Uuid,
    #[serde(flatten)]
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message_object: Option<Box<ChatMessage>>,
}

impl OutgoingMessage {
    /// Create an outbound text message
    pub fn text(receiver_id: Uuid, content: String) -> Self {
        Self {
            receiver_id,
            content: MessageContent::Text { content },
            reply_to: None,
            reply_to_message_object: None,
        }
    }

    /// Create an outbound image message
    pub fn image(receiver_id: Uuid, image_url: String) -> Self {
        Self {
            receiver_id,
            content: MessageContent::Image { content: image_url },
            reply_to: None,
            reply_to_message_object: None,
        }
    }

    /// Create an outbound GIF message
    pub fn gif(receiver_id: Uuid, gif_id: String) -> Self {
        Self {
            receiver_id,
            content: MessageContent::Gif { content: gif_id },
            reply_to: None,
            reply_to_message_object: None,
        }
    }

    /// Attach a reply target, snapshotting the referenced message
    pub fn with_reply(mut self, target: &ChatMessage) -> Self {
        self.reply_to = Some(target.uuid);
        self.reply_to_message_object = Some(Box::new(target.clone()));
        self
    }
}

/// Kind of shared content in a bulk post share
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Post,
    Reel,
}

/// Outbound bulk post share
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingPost {
    #[serde(rename = "type")]
    pub post_type: PostKind,
    pub receiver_ids: Vec<Uuid>,
    pub post_id: String,
    pub post: PostRef,
}
