//! Shared Module
//!
//! This module contains the data structures shared across the chat core:
//! the messaging entities, the typed transport events, configuration, and
//! the error taxonomy. All types are designed for serialization and
//! transmission over the realtime socket or the REST API.

/// Real-time event system
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Messaging types (conversations, messages, streaks, cursors)
pub mod messaging;

/// Re-export commonly used types for convenience
pub use config::{ChatConfig, ChatConfigBuilder, ConfigError};
pub use error::ChatError;
pub use event::{
    ClientEvent, OutgoingMessage, OutgoingPost, PostKind, ServerEvent, TypingNotice,
};
pub use messaging::{
    ChatMessage, Conversation, ConversationPage, Cursor, MessageContent, MessagePage,
    Participant, PostRef, StreakCache, StreakData, StreakPhase, StreakState,
};
