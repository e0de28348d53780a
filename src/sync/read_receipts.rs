//! Read-Receipt Coordinator
//!
//! Read state is conversation-granular: opening a thread with unread
//! messages issues exactly one mark-as-read call for that conversation.
//! Re-renders of the same open thread issue nothing; a later focus-in
//! re-arms the guard. The per-message `is_read` flag only mirrors the
//! sender's last-known read state and is never acknowledged individually.

use std::collections::HashSet;
use uuid::Uuid;

use crate::api::ChatApiClient;
use crate::shared::error::ChatError;

/// Tracks which conversations have already been marked read during the
/// current focus
#[derive(Debug, Default)]
pub struct ReadReceiptCoordinator {
    marked: HashSet<Uuid>,
}

impl ReadReceiptCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-arm the guard for a conversation: the next
    /// [`mark_if_unread`](Self::mark_if_unread) may fire again. Called on
    /// thread focus-in, before the first page loads.
    pub fn begin_focus(&mut self, conversation_id: Uuid) {
        self.marked.remove(&conversation_id);
    }

    /// Issue the mark-read call if the conversation has unread messages
    /// and has not been marked during this focus. Returns whether a call
    /// was made. On failure the guard is released so a later render can
    /// retry.
    pub async fn mark_if_unread(
        &mut self,
        api: &ChatApiClient,
        conversation_id: Uuid,
        unread_count: u32,
    ) -> Result<bool, ChatError> {
        if unread_count == 0 {
            return Ok(false);
        }
        if !self.marked.insert(conversation_id) {
            return Ok(false);
        }
        match api.mark_messages_read(conversation_id).await {
            Ok(()) => {
                tracing::debug!(
                    "[receipts] marked conversation {} read ({} unread)",
                    conversation_id,
                    unread_count
                );
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(
                    "[receipts] mark-read failed for {}: {}",
                    conversation_id,
                    e
                );
                self.marked.remove(&conversation_id);
                Err(e)
            }
        }
    }
}
