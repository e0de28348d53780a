//! Message-Thread Synchronizer
//!
//! Maintains one open conversation's messages: older-history pages arrive
//! via forward cursor pagination, realtime pushes are prepended, and both
//! paths converge on the same rule — a uuid already present is skipped.
//! That de-duplication contract is what keeps an interleaved push and
//! pending page fetch safe.
//!
//! The collection is re-sorted descending by `created_at` after every
//! mutation to feed an inverted (newest-first) view. O(n log n) per event;
//! fine at observed thread sizes.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::api::gif::GifClient;
use crate::api::ChatApiClient;
use crate::shared::error::ChatError;
use crate::shared::event::{ClientEvent, OutgoingMessage, OutgoingPost, PostKind};
use crate::shared::messaging::{
    ChatMessage, Conversation, Cursor, MessageContent, MessagePage, PostRef,
};
use crate::sync::read_receipts::ReadReceiptCoordinator;
use crate::transport::ChatTransport;

/// Default message-history page size
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Resolved preview for a replied-to message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPreview {
    /// Inline text
    Text(String),
    /// Direct image URL
    Image(String),
    /// Resolved GIF render URL
    Gif(String),
    /// Shared post/reel thumbnail
    PostThumbnail { image_url: String, kind: PostKind },
    /// The referenced content is no longer available
    Unavailable,
}

/// Synchronizes one conversation's message thread
pub struct MessageThreadSync {
    api: Arc<ChatApiClient>,
    gif: Arc<GifClient>,
    transport: ChatTransport,
    current_user: Uuid,
    conversation_id: Option<Uuid>,
    friend_id: Option<Uuid>,
    messages: Vec<ChatMessage>,
    known: HashSet<Uuid>,
    next_cursor: Option<Cursor>,
    has_next_page: bool,
    has_loaded: bool,
    is_loading_older: bool,
    unread_count: u32,
    is_blocked: bool,
    conversation: Option<Conversation>,
    receipts: ReadReceiptCoordinator,
    page_limit: u32,
}

impl MessageThreadSync {
    pub fn new(
        api: Arc<ChatApiClient>,
        gif: Arc<GifClient>,
        transport: ChatTransport,
        current_user: Uuid,
    ) -> Self {
        Self {
            api,
            gif,
            transport,
            current_user,
            conversation_id: None,
            friend_id: None,
            messages: Vec::new(),
            known: HashSet::new(),
            next_cursor: None,
            has_next_page: false,
            has_loaded: false,
            is_loading_older: false,
            unread_count: 0,
            is_blocked: false,
            conversation: None,
            receipts: ReadReceiptCoordinator::new(),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    /// Messages, newest first
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn has_loaded(&self) -> bool {
        self.has_loaded
    }

    pub fn has_more(&self) -> bool {
        self.has_next_page && self.next_cursor.is_some()
    }

    pub fn unread_count(&self) -> u32 {
        self.unread_count
    }

    pub fn is_blocked(&self) -> bool {
        self.is_blocked
    }

    /// The refreshed conversation entity from the latest page envelope
    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn conversation_id(&self) -> Option<Uuid> {
        self.conversation_id
    }

    /// Open a conversation thread: reset local state, fetch page 1, and
    /// trigger the one-shot read receipt when the thread has unread
    /// messages.
    pub async fn open(&mut self, conversation_id: Uuid, friend_id: Uuid) -> Result<(), ChatError> {
        self.conversation_id = Some(conversation_id);
        self.friend_id = Some(friend_id);
        self.messages.clear();
        self.known.clear();
        self.next_cursor = None;
        self.has_next_page = false;
        self.has_loaded = false;
        self.is_loading_older = false;
        self.unread_count = 0;
        self.is_blocked = false;
        self.conversation = None;
        self.receipts.begin_focus(conversation_id);

        let page = self
            .api
            .get_messages(conversation_id, &Cursor::start(), self.page_limit)
            .await?;
        self.unread_count = page.unread_count;
        self.absorb_page(page);
        self.has_loaded = true;

        // At most once per open, and only when something is unread.
        let api = Arc::clone(&self.api);
        if let Err(e) = self
            .receipts
            .mark_if_unread(&api, conversation_id, self.unread_count)
            .await
        {
            tracing::warn!("[thread] read receipt failed: {}", e);
        }
        Ok(())
    }

    /// Fetch the next page of older history. A no-op until the first page
    /// has loaded, while a previous load is in flight, or when no further
    /// page exists.
    pub async fn load_older(&mut self) -> Result<(), ChatError> {
        if !self.has_loaded || self.is_loading_older || !self.has_next_page {
            return Ok(());
        }
        let Some(conversation_id) = self.conversation_id else {
            return Ok(());
        };
        let Some(cursor) = self.next_cursor.take() else {
            return Ok(());
        };

        self.is_loading_older = true;
        let result = self
            .api
            .get_messages(conversation_id, &cursor, self.page_limit)
            .await;
        self.is_loading_older = false;

        match result {
            Ok(page) => {
                self.absorb_page(page);
                Ok(())
            }
            Err(e) => {
                self.next_cursor = Some(cursor);
                Err(e)
            }
        }
    }

    /// Merge a fetched page: unseen messages are appended, the cursor is
    /// replaced by the page's own, and the envelope's conversation rides
    /// along.
    fn absorb_page(&mut self, page: MessagePage) {
        let mut added = 0usize;
        self.next_cursor = page.next_cursor().cloned();
        self.has_next_page = page.has_next_page && self.next_cursor.is_some();
        self.is_blocked = page.is_blocked;
        if let Some(conversation) = page.conversation {
            self.conversation = Some(conversation);
        }
        for message in page.messages {
            if self.known.insert(message.uuid) {
                self.messages.push(message);
                added += 1;
            }
        }
        self.resort();
        tracing::debug!(
            "[thread] merged page: {} new, {} total, more={}",
            added,
            self.messages.len(),
            self.has_next_page
        );
    }

    /// Apply a realtime `newMessage` push. Returns whether the message was
    /// accepted into the thread.
    ///
    /// Cross-talk filter: only messages travelling between the current
    /// user and the open thread's friend are accepted; anything else came
    /// from another conversation's socket traffic and is discarded.
    pub fn apply_push(&mut self, message: ChatMessage) -> bool {
        let Some(friend_id) = self.friend_id else {
            return false;
        };
        if !message.is_between(self.current_user, friend_id) {
            tracing::debug!(
                "[thread] discarding cross-talk message {} ({} -> {})",
                message.uuid,
                message.sender_id,
                message.receiver_id
            );
            return false;
        }
        if !self.known.insert(message.uuid) {
            // Already here via a page fetch; not an error.
            return false;
        }
        // Logically newest-first, so pushes go to the front.
        self.messages.insert(0, message);
        self.resort();
        true
    }

    fn resort(&mut self) {
        self.messages
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    /// Resolve the preview for a replied-to message snapshot. Never fails:
    /// missing media and failed lookups degrade to
    /// [`ReplyPreview::Unavailable`].
    pub async fn resolve_reply(&self, target: &ChatMessage) -> ReplyPreview {
        match &target.content {
            MessageContent::Text { content } => ReplyPreview::Text(content.clone()),
            MessageContent::Image { content } => ReplyPreview::Image(content.clone()),
            MessageContent::Gif { content } => match self.gif.lookup(content).await {
                Some(info) => ReplyPreview::Gif(info.url),
                None => ReplyPreview::Unavailable,
            },
            MessageContent::Post { post } => Self::post_preview(post, PostKind::Post),
            MessageContent::Reel { post } => Self::post_preview(post, PostKind::Reel),
        }
    }

    fn post_preview(post: &Option<PostRef>, kind: PostKind) -> ReplyPreview {
        match post.as_ref().and_then(|p| p.image_url.clone()) {
            Some(image_url) => ReplyPreview::PostThumbnail { image_url, kind },
            None => ReplyPreview::Unavailable,
        }
    }

    /// Optimistically send a text message. The event is emitted
    /// fire-and-forget with a snapshot of the reply target; the message
    /// appears in the thread when it round-trips as a `newMessage` push.
    /// There is no rollback path for a failed emit.
    pub async fn send_text(
        &self,
        text: String,
        reply_to: Option<&ChatMessage>,
    ) -> Result<(), ChatError> {
        let outgoing = OutgoingMessage::text(self.friend()?, text);
        self.emit_message(outgoing, reply_to).await
    }

    /// Optimistically send a GIF by provider id.
    pub async fn send_gif(
        &self,
        gif_id: String,
        reply_to: Option<&ChatMessage>,
    ) -> Result<(), ChatError> {
        let outgoing = OutgoingMessage::gif(self.friend()?, gif_id);
        self.emit_message(outgoing, reply_to).await
    }

    /// Optimistically send an image by URL.
    pub async fn send_image(
        &self,
        image_url: String,
        reply_to: Option<&ChatMessage>,
    ) -> Result<(), ChatError> {
        let outgoing = OutgoingMessage::image(self.friend()?, image_url);
        self.emit_message(outgoing, reply_to).await
    }

    async fn emit_message(
        &self,
        mut outgoing: OutgoingMessage,
        reply_to: Option<&ChatMessage>,
    ) -> Result<(), ChatError> {
        if let Some(target) = reply_to {
            outgoing = outgoing.with_reply(target);
        }
        self.transport
            .emit(ClientEvent::SendMessage(outgoing))
            .await;
        Ok(())
    }

    /// Share a post or reel with several friends at once. Completion is
    /// signalled asynchronously by `bulkPostComplete` / `bulkPostError`
    /// transport events.
    pub async fn send_post_to_friends(
        &self,
        post_type: PostKind,
        receiver_ids: Vec<Uuid>,
        post: PostRef,
    ) {
        let event = ClientEvent::SendPost(OutgoingPost {
            post_type,
            receiver_ids,
            post_id: post.id.clone(),
            post,
        });
        self.transport.emit(event).await;
    }

    /// Toggle disappearing messages, refreshing the local conversation
    /// flag only after the server accepted the change.
    pub async fn set_disappearing(&mut self, enabled: bool) -> Result<(), ChatError> {
        let conversation_id = self
            .conversation_id
            .ok_or_else(|| ChatError::message("no open thread"))?;
        self.api
            .change_disappear_setting(conversation_id, enabled)
            .await?;
        if let Some(conversation) = self.conversation.as_mut() {
            conversation.messages_disappear = enabled;
        }
        Ok(())
    }

    /// Delete the open conversation and clear local state. Returns the
    /// deleted conversation id so the list synchronizer can drop it.
    pub async fn delete_chat(&mut self) -> Result<Uuid, ChatError> {
        let conversation_id = self
            .conversation_id
            .ok_or_else(|| ChatError::message("no open thread"))?;
        self.api.delete_chat(conversation_id).await?;
        self.conversation_id = None;
        self.friend_id = None;
        self.messages.clear();
        self.known.clear();
        self.next_cursor = None;
        self.has_next_page = false;
        self.has_loaded = false;
        self.conversation = None;
        Ok(conversation_id)
    }

    fn friend(&self) -> Result<Uuid, ChatError> {
        self.friend_id
            .ok_or_else(|| ChatError::message("no open thread"))
    }
}
