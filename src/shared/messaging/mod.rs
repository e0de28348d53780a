//! Messaging Module
//!
//! This module contains all the data structures for the chat system:
//!
//! - `ChatMessage` - a message in a conversation, with its typed content
//! - `Conversation` - a direct conversation with another user
//! - `StreakData` / `StreakState` - the streak counter and its derived display state
//! - `Cursor` - the opaque forward-pagination token
//!
//! # Usage
//!
//! ```rust
//! use ripple_chat::shared::messaging::{ChatMessage, Conversation, Cursor};
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod conversation;
pub mod message;
pub mod streak;

// Re-export all types
pub use conversation::{Conversation, ConversationPage, Participant};
pub use message::{ChatMessage, MessageContent, MessagePage, PostRef};
pub use streak::{derive_streak, StreakCache, StreakData, StreakPhase, StreakState};

/// Opaque forward-pagination token.
///
/// The empty cursor denotes the start of the collection (page 1). Once a
/// cursor has been consumed for a successful fetch it is replaced only by
/// that page's own `next_cursor`, never reused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// The start-of-collection cursor (page 1)
    pub fn start() -> Self {
        Self(String::new())
    }

    /// Whether this cursor denotes the start of the collection
    pub fn is_start(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw token value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Cursor {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a page's `next_cursor` field: servers signal "no more pages"
/// either by omitting the field or by sending an empty token.
pub(crate) fn effective_cursor(next_cursor: &Option<Cursor>) -> Option<&Cursor> {
    next_cursor.as_ref().filter(|c| !c.is_start())
}
