//! Conversation-List Synchronizer
//!
//! Maintains the ordered conversation list via forward cursor pagination
//! and the online-user set pushed over the transport. The list is owned
//! exclusively by this struct; the transport only notifies via events.
//!
//! Merge rules: a fetch from the start cursor replaces the list (fresh
//! fetch or new search); any other page is appended after filtering out
//! conversation ids already present. Appends never re-sort the list.
//! Presence pushes replace the whole online set, never merge into it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::api::ChatApiClient;
use crate::shared::error::ChatError;
use crate::shared::event::ServerEvent;
use crate::shared::messaging::{Conversation, Cursor};

/// Quiet period after the last keystroke before a search fetch fires
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default conversation-list page size
pub const DEFAULT_PAGE_LIMIT: u32 = 8;

/// Synchronizes the conversation list and presence set
pub struct ConversationListSync {
    api: Arc<ChatApiClient>,
    conversations: Vec<Conversation>,
    next_cursor: Option<Cursor>,
    online: HashSet<Uuid>,
    search_text: String,
    search_generation: u64,
    page_limit: u32,
    is_loading: bool,
    has_loaded: bool,
}

impl ConversationListSync {
    pub fn new(api: Arc<ChatApiClient>) -> Self {
        Self::with_page_limit(api, DEFAULT_PAGE_LIMIT)
    }

    pub fn with_page_limit(api: Arc<ChatApiClient>, page_limit: u32) -> Self {
        Self {
            api,
            conversations: Vec::new(),
            next_cursor: None,
            online: HashSet::new(),
            search_text: String::new(),
            search_generation: 0,
            page_limit,
            is_loading: false,
            has_loaded: false,
        }
    }

    /// The current list, in server order
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Whether the first page has been fetched at least once
    pub fn has_loaded(&self) -> bool {
        self.has_loaded
    }

    /// The currently online user ids
    pub fn online_users(&self) -> &HashSet<Uuid> {
        &self.online
    }

    /// Whether a conversation's participant is currently online
    pub fn is_participant_online(&self, conversation: &Conversation) -> bool {
        self.online.contains(&conversation.participant.id)
    }

    /// Whether more pages are available
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// The active search text
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Fetch one page at the given cursor and merge it in. On failure the
    /// list is left unchanged.
    pub async fn query(&mut self, cursor: Cursor) -> Result<(), ChatError> {
        if self.is_loading {
            return Ok(());
        }
        self.is_loading = true;
        let result = self
            .api
            .get_conversations(&self.search_text, &cursor, self.page_limit)
            .await;
        self.is_loading = false;

        let page = result?;
        let next = page.next_cursor().cloned();
        if cursor.is_start() {
            self.conversations = page.data;
        } else {
            let known: HashSet<Uuid> = self
                .conversations
                .iter()
                .map(|c| c.conversation_id)
                .collect();
            self.conversations
                .extend(page.data.into_iter().filter(|c| !known.contains(&c.conversation_id)));
        }
        self.next_cursor = next;
        self.has_loaded = true;
        tracing::debug!(
            "[conversations] merged page, {} total, more={}",
            self.conversations.len(),
            self.next_cursor.is_some()
        );
        Ok(())
    }

    /// Reset to the start cursor and replace the list with page 1, even if
    /// identical to the current state.
    pub async fn refresh(&mut self) -> Result<(), ChatError> {
        self.next_cursor = None;
        self.query(Cursor::start()).await
    }

    /// Fetch the next page, if one exists. The consumed cursor is only
    /// replaced by the fetched page's own `next_cursor`; on failure it is
    /// restored so the fetch can be retried.
    pub async fn load_more(&mut self) -> Result<(), ChatError> {
        if self.is_loading {
            return Ok(());
        }
        let Some(cursor) = self.next_cursor.take() else {
            return Ok(());
        };
        match self.query(cursor.clone()).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.next_cursor = Some(cursor);
                Err(e)
            }
        }
    }

    /// Record a search-text change and return the generation token for the
    /// debounced fetch. Unchanged text keeps the current generation.
    pub fn set_search_text(&mut self, text: impl Into<String>) -> u64 {
        let text = text.into();
        if text != self.search_text {
            self.search_text = text;
            self.search_generation += 1;
        }
        self.search_generation
    }

    /// Whether the given generation token still reflects the latest
    /// search text
    pub fn search_is_current(&self, generation: u64) -> bool {
        self.search_generation == generation
    }

    /// Wait out the debounce window, then refresh if no newer keystroke
    /// arrived. Returns whether a fetch was issued.
    pub async fn debounced_refresh(&mut self, generation: u64) -> Result<bool, ChatError> {
        tokio::time::sleep(SEARCH_DEBOUNCE).await;
        if !self.search_is_current(generation) {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    /// Apply a transport push event.
    pub async fn apply_event(&mut self, event: &ServerEvent) -> Result<(), ChatError> {
        match event {
            ServerEvent::OnlineUsers(ids) => {
                self.online = ids.iter().copied().collect();
                Ok(())
            }
            ServerEvent::RefetchConversation => self.refresh().await,
            _ => Ok(()),
        }
    }

    /// Recover an expired streak. Server-authoritative: the conversation is
    /// replaced with the response entity, never locally guessed.
    pub async fn recover_streak(&mut self, conversation_id: Uuid) -> Result<(), ChatError> {
        let refreshed = self.api.recover_streak(conversation_id).await?;
        self.replace_conversation(refreshed);
        Ok(())
    }

    /// Drop a conversation from the in-memory list (after delete-chat).
    pub fn remove_conversation(&mut self, conversation_id: Uuid) {
        self.conversations
            .retain(|c| c.conversation_id != conversation_id);
    }

    /// Replace a conversation with a refreshed entity (after block,
    /// disappear-toggle, or streak recovery). Unknown ids are ignored; the
    /// next refresh will pick them up.
    pub fn replace_conversation(&mut self, conversation: Conversation) {
        if let Some(slot) = self
            .conversations
            .iter_mut()
            .find(|c| c.conversation_id == conversation.conversation_id)
        {
            *slot = conversation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::ChatConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> Arc<ChatApiClient> {
        let config = ChatConfig::builder()
            .api_url(server.uri())
            .token("test-token")
            .build()
            .unwrap();
        Arc::new(ChatApiClient::new(config))
    }

    fn conversation_json(id: u128) -> serde_json::Value {
        serde_json::json!({
            "conversationId": Uuid::from_u128(id),
            "participant": {"id": Uuid::from_u128(id + 100), "username": format!("user-{}", id)},
            "unreadCount": 0,
            "messagesDisappear": false,
            "streak": {
                "currentCount": 1,
                "lastStreakCount": 0,
                "lastInteractionAt": "2025-06-01T12:00:00Z"
            }
        })
    }

    fn page_json(ids: &[u128], next_cursor: Option<&str>) -> serde_json::Value {
        serde_json::json!({
            "data": ids.iter().map(|&id| conversation_json(id)).collect::<Vec<_>>(),
            "nextCursor": next_cursor,
        })
    }

    #[tokio::test]
    async fn test_start_cursor_replaces_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations"))
            .and(query_param("cursor", ""))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_json(&[1, 2], Some("p2"))),
            )
            .mount(&server)
            .await;

        let mut list = ConversationListSync::new(api_for(&server));
        list.query(Cursor::start()).await.unwrap();
        assert_eq!(list.conversations().len(), 2);
        assert!(list.has_more());
        assert!(list.has_loaded());
    }

    #[tokio::test]
    async fn test_load_more_appends_and_dedupes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations"))
            .and(query_param("cursor", ""))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_json(&[1, 2], Some("p2"))),
            )
            .mount(&server)
            .await;
        // Page 2 re-serves conversation 2 alongside a new one.
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations"))
            .and(query_param("cursor", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[2, 3], None)))
            .expect(1)
            .mount(&server)
            .await;

        let mut list = ConversationListSync::new(api_for(&server));
        list.query(Cursor::start()).await.unwrap();
        list.load_more().await.unwrap();

        let ids: Vec<Uuid> = list
            .conversations()
            .iter()
            .map(|c| c.conversation_id)
            .collect();
        assert_eq!(
            ids,
            vec![
                Uuid::from_u128(1),
                Uuid::from_u128(2),
                Uuid::from_u128(3),
            ]
        );

        // The p2 cursor was consumed and nothing replaced it.
        assert!(!list.has_more());
        list.load_more().await.unwrap();
        assert_eq!(list.conversations().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_load_more_restores_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations"))
            .and(query_param("cursor", ""))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_json(&[1], Some("p2"))),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations"))
            .and(query_param("cursor", "p2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut list = ConversationListSync::new(api_for(&server));
        list.query(Cursor::start()).await.unwrap();
        assert!(list.load_more().await.is_err());
        // List unchanged, cursor retryable.
        assert_eq!(list.conversations().len(), 1);
        assert!(list.has_more());
    }

    #[tokio::test]
    async fn test_refresh_replaces_even_when_identical() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations"))
            .and(query_param("cursor", ""))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[1], None)))
            .expect(2)
            .mount(&server)
            .await;

        let mut list = ConversationListSync::new(api_for(&server));
        list.refresh().await.unwrap();
        list.refresh().await.unwrap();
        assert_eq!(list.conversations().len(), 1);
    }

    #[tokio::test]
    async fn test_presence_push_replaces_set() {
        let server = MockServer::start().await;
        let mut list = ConversationListSync::new(api_for(&server));

        list.apply_event(&ServerEvent::OnlineUsers(vec![
            Uuid::from_u128(101),
            Uuid::from_u128(102),
        ]))
        .await
        .unwrap();
        assert_eq!(list.online_users().len(), 2);

        // The next push fully replaces the set, it never merges.
        list.apply_event(&ServerEvent::OnlineUsers(vec![Uuid::from_u128(103)]))
            .await
            .unwrap();
        assert_eq!(list.online_users().len(), 1);
        assert!(list.online_users().contains(&Uuid::from_u128(103)));
    }

    #[tokio::test]
    async fn test_refetch_event_triggers_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations"))
            .and(query_param("cursor", ""))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[4], None)))
            .expect(1)
            .mount(&server)
            .await;

        let mut list = ConversationListSync::new(api_for(&server));
        list.apply_event(&ServerEvent::RefetchConversation)
            .await
            .unwrap();
        assert_eq!(list.conversations().len(), 1);
    }

    #[tokio::test]
    async fn test_participant_presence_flag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[1], None)))
            .mount(&server)
            .await;

        let mut list = ConversationListSync::new(api_for(&server));
        list.refresh().await.unwrap();
        let conversation = list.conversations()[0].clone();
        assert!(!list.is_participant_online(&conversation));

        list.apply_event(&ServerEvent::OnlineUsers(vec![conversation.participant.id]))
            .await
            .unwrap();
        assert!(list.is_participant_online(&conversation));
    }

    #[tokio::test]
    async fn test_search_debounce_only_latest_generation_fires() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations"))
            .and(query_param("search", "sam"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[9], None)))
            .expect(1)
            .mount(&server)
            .await;

        let mut list = ConversationListSync::new(api_for(&server));
        let stale = list.set_search_text("sa");
        let current = list.set_search_text("sam");
        assert_ne!(stale, current);

        // The stale keystroke's debounce resolves to a no-op.
        assert!(!list.debounced_refresh(stale).await.unwrap());
        // The latest one fetches.
        assert!(list.debounced_refresh(current).await.unwrap());
        assert_eq!(list.conversations().len(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_search_text_keeps_generation() {
        let server = MockServer::start().await;
        let mut list = ConversationListSync::new(api_for(&server));
        let first = list.set_search_text("sam");
        let second = list.set_search_text("sam");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_recover_streak_replaces_from_server_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[1], None)))
            .mount(&server)
            .await;

        let conversation_id = Uuid::from_u128(1);
        let mut refreshed = conversation_json(1);
        refreshed["streak"]["currentCount"] = serde_json::json!(8);
        Mock::given(method("POST"))
            .and(path(format!(
                "/api/chat/conversations/{}/streak/recover",
                conversation_id
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(refreshed))
            .expect(1)
            .mount(&server)
            .await;

        let mut list = ConversationListSync::new(api_for(&server));
        list.refresh().await.unwrap();
        assert_eq!(list.conversations()[0].streak.current_count, 1);

        list.recover_streak(conversation_id).await.unwrap();
        assert_eq!(list.conversations()[0].streak.current_count, 8);
    }

    #[tokio::test]
    async fn test_remove_and_replace_conversation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[1, 2], None)))
            .mount(&server)
            .await;

        let mut list = ConversationListSync::new(api_for(&server));
        list.refresh().await.unwrap();

        let mut updated = list.conversations()[0].clone();
        updated.unread_count = 5;
        list.replace_conversation(updated.clone());
        assert_eq!(list.conversations()[0].unread_count, 5);

        list.remove_conversation(updated.conversation_id);
        assert_eq!(list.conversations().len(), 1);
        assert_ne!(
            list.conversations()[0].conversation_id,
            updated.conversation_id
        );
    }
}
