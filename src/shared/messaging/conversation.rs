//! Conversation Data Structure
//!
//! Represents a direct conversation with another user, as served by the
//! conversation-list endpoint and refreshed by push events or local
//! mutations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::ChatMessage;
use super::streak::StreakData;
use super::{effective_cursor, Cursor};

/// Summary of the other participant in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Participant user ID
    pub id: Uuid,
    /// Display username
    pub username: String,
    /// Avatar URL, if set
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Represents a conversation with another user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique conversation ID
    pub conversation_id: Uuid,
    /// The other participant
    pub participant: Participant,
    /// Last message in the conversation (for preview)
    #[serde(default)]
    pub last_message: Option<ChatMessage>,
    /// Number of unread messages
    #[serde(default)]
    pub unread_count: u32,
    /// Whether messages in this conversation disappear after being read
    #[serde(default)]
    pub messages_disappear: bool,
    /// Streak counter state for this conversation
    pub streak: StreakData,
}

impl Conversation {
    /// Preview text of the last message, or empty when there is none
    pub fn last_message_preview(&self, max_len: usize) -> String {
        self.last_message
            .as_ref()
            .map(|m| m.preview(max_len))
            .unwrap_or_default()
    }
}

/// One page of the conversation list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPage {
    pub data: Vec<Conversation>,
    #[serde(default)]
    pub next_cursor: Option<Cursor>,
}

impl ConversationPage {
    /// The cursor for the next page, if any
    pub fn next_cursor(&self) -> Option<&Cursor> {
        effective_cursor(&self.next_cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn conversation(id: u128) -> Conversation {
        Conversation {
            conversation_id: Uuid::from_u128(id),
            participant: Participant {
                id: Uuid::from_u128(id + 100),
                username: format!("user-{}", id),
                avatar_url: None,
            },
            last_message: None,
            unread_count: 0,
            messages_disappear: false,
            streak: StreakData {
                current_count: 0,
                last_streak_count: 0,
                last_interaction_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_conversation_wire_shape() {
        let conv = conversation(1);
        let json = serde_json::to_value(&conv).unwrap();
        assert_eq!(json["conversationId"], conv.conversation_id.to_string());
        assert_eq!(json["participant"]["username"], "user-1");
        assert_eq!(json["unreadCount"], 0);
        assert_eq!(json["messagesDisappear"], false);
    }

    #[test]
    fn test_last_message_preview_empty_without_message() {
        let conv = conversation(1);
        assert_eq!(conv.last_message_preview(40), "");
    }

    #[test]
    fn test_last_message_preview() {
        let mut conv = conversation(1);
        conv.last_message = Some(ChatMessage::new_text(
            conv.participant.id,
            Uuid::from_u128(7),
            "see you tomorrow".to_string(),
        ));
        assert_eq!(conv.last_message_preview(40), "see you tomorrow");
    }

    #[test]
    fn test_conversation_page_cursor() {
        let page: ConversationPage =
            serde_json::from_str(r#"{"data": [], "nextCursor": null}"#).unwrap();
        assert_eq!(page.next_cursor(), None);

        let page: ConversationPage =
            serde_json::from_str(r#"{"data": [], "nextCursor": "p2"}"#).unwrap();
        assert_eq!(page.next_cursor(), Some(&Cursor::from("p2")));
    }
}
