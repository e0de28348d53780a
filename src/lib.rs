//! Ripple Chat - Real-Time Chat Synchronization Core
//!
//! This library keeps a consumer social app's chat state consistent across
//! three inputs: a persistent bidirectional socket, paginated REST fetches,
//! and locally-originated optimistic actions.
//!
//! # Overview
//!
//! - Real-time transport with typed events and bounded-backoff reconnection
//! - Conversation-list synchronization (cursor pagination, presence, streaks)
//! - Message-thread synchronization (bidirectional history, de-duplication,
//!   reply resolution, read receipts)
//! - A pure, time-windowed streak state machine
//!
//! # Module Structure
//!
//! - **`shared`** - Data model, typed events, configuration, errors
//! - **`transport`** - The owned WebSocket connection manager
//! - **`api`** - REST collaborator clients (chat backend, GIF provider)
//! - **`sync`** - The state-owning synchronizers
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use uuid::Uuid;
//! use ripple_chat::api::{ChatApiClient, GifClient};
//! use ripple_chat::shared::{ChatConfig, ServerEvent};
//! use ripple_chat::sync::{ConversationListSync, MessageThreadSync};
//! use ripple_chat::transport::ChatTransport;
//!
//! # async fn example(current_user: Uuid) -> Result<(), ripple_chat::shared::ChatError> {
//! let mut config = ChatConfig::new();
//! config.set_token(Some("session-token".to_string()));
//!
//! let transport = ChatTransport::new(config.clone());
//! let api = Arc::new(ChatApiClient::new(config.clone()));
//! let gif = Arc::new(GifClient::new(config.clone()));
//!
//! let mut list = ConversationListSync::new(Arc::clone(&api));
//! let mut thread = MessageThreadSync::new(api, gif, transport.clone(), current_user);
//!
//! transport.connect().await;
//! list.refresh().await?;
//!
//! let mut events = transport.subscribe();
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         ServerEvent::NewMessage(message) => {
//!             thread.apply_push(message);
//!         }
//!         other => list.apply_event(&other).await?,
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Synchronizers are plain structs mutated by their owner task; the
//! transport is the only internally-concurrent component. All failures
//! degrade to a stale-but-consistent local view; nothing here is fatal to
//! the process.

/// Shared types and data structures
pub mod shared;

/// Realtime transport layer
pub mod transport;

/// REST collaborator clients
pub mod api;

/// State-owning synchronizers
pub mod sync;
