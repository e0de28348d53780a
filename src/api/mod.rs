//! Chat API Client
//!
//! This module provides async functions for the REST collaborator calls the
//! sync core depends on: conversation pages, message pages, read receipts,
//! streak recovery, disappearing-message settings, and chat deletion.
//!
//! Every call carries the session bearer token, maps non-2xx statuses to a
//! friendly [`ChatError::FetchError`], and leaves local state to the caller:
//! a failed fetch never partially applies.

pub mod gif;

pub use gif::{GifClient, GifInfo};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::shared::config::ChatConfig;
use crate::shared::error::ChatError;
use crate::shared::messaging::{Conversation, ConversationPage, Cursor, MessagePage};

/// REST client for the chat backend
#[derive(Debug, Clone)]
pub struct ChatApiClient {
    config: ChatConfig,
    client: Client,
}

impl ChatApiClient {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Fetch one page of the conversation list.
    ///
    /// The empty cursor fetches page 1; `search_text` filters by
    /// participant name server-side.
    pub async fn get_conversations(
        &self,
        search_text: &str,
        cursor: &Cursor,
        limit: u32,
    ) -> Result<ConversationPage, ChatError> {
        let endpoint = "/api/chat/conversations";
        let limit = limit.to_string();
        let request = self
            .authorized(self.client.get(self.config.api_url(endpoint)))?
            .query(&[
                ("search", search_text),
                ("cursor", cursor.as_str()),
                ("limit", limit.as_str()),
            ]);
        let response = self.send(endpoint, request).await?;
        Self::parse_json(endpoint, response).await
    }

    /// Fetch one page of a conversation's message history (newest first;
    /// the cursor walks toward older messages).
    pub async fn get_messages(
        &self,
        conversation_id: Uuid,
        cursor: &Cursor,
        limit: u32,
    ) -> Result<MessagePage, ChatError> {
        let endpoint = format!("/api/chat/conversations/{}/messages", conversation_id);
        let limit = limit.to_string();
        let request = self
            .authorized(self.client.get(self.config.api_url(&endpoint)))?
            .query(&[("cursor", cursor.as_str()), ("limit", limit.as_str())]);
        let response = self.send(&endpoint, request).await?;
        Self::parse_json(&endpoint, response).await
    }

    /// Mark every message in the conversation as read.
    pub async fn mark_messages_read(&self, conversation_id: Uuid) -> Result<(), ChatError> {
        let endpoint = format!("/api/chat/conversations/{}/read", conversation_id);
        let request = self.authorized(self.client.post(self.config.api_url(&endpoint)))?;
        self.send(&endpoint, request).await?;
        Ok(())
    }

    /// Recover an expired streak. Server-authoritative: the refreshed
    /// conversation in the response replaces local state.
    pub async fn recover_streak(&self, conversation_id: Uuid) -> Result<Conversation, ChatError> {
        let endpoint = format!("/api/chat/conversations/{}/streak/recover", conversation_id);
        let request = self.authorized(self.client.post(self.config.api_url(&endpoint)))?;
        let response = self.send(&endpoint, request).await?;
        Self::parse_json(&endpoint, response).await
    }

    /// Toggle disappearing messages for the conversation.
    pub async fn change_disappear_setting(
        &self,
        conversation_id: Uuid,
        enabled: bool,
    ) -> Result<(), ChatError> {
        let endpoint = format!("/api/chat/conversations/{}/disappearing", conversation_id);
        let request = self
            .authorized(self.client.post(self.config.api_url(&endpoint)))?
            .json(&json!({ "enabled": enabled }));
        self.send(&endpoint, request).await?;
        Ok(())
    }

    /// Delete the conversation and its history.
    pub async fn delete_chat(&self, conversation_id: Uuid) -> Result<(), ChatError> {
        let endpoint = format!("/api/chat/conversations/{}", conversation_id);
        let request = self.authorized(self.client.delete(self.config.api_url(&endpoint)))?;
        self.send(&endpoint, request).await?;
        Ok(())
    }

    /// Attach the session bearer token
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ChatError> {
        let token = self.config.token().ok_or(ChatError::NotAuthenticated)?;
        Ok(request.header("Authorization", format!("Bearer {}", token)))
    }

    /// Send the request and map transport/status failures
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, ChatError> {
        let response = request
            .send()
            .await
            .map_err(|e| ChatError::fetch(endpoint, format!("network error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| status.to_string());
            let friendly = match status {
                StatusCode::UNAUTHORIZED => "session expired".to_string(),
                StatusCode::NOT_FOUND => "conversation not found".to_string(),
                _ => format!("request failed: {} - {}", status, error_text),
            };
            return Err(ChatError::fetch(endpoint, friendly));
        }
        Ok(response)
    }

    async fn parse_json<T: DeserializeOwned>(
        endpoint: &str,
        response: Response,
    ) -> Result<T, ChatError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ChatError::fetch(endpoint, format!("failed to parse response: {}", e)))
    }
}
