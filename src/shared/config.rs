//! Application configuration module
//!
//! Provides the configuration consumed by the chat core: the REST API base
//! URL, the realtime socket URL, the GIF provider endpoint and key, and the
//! session token issued by the external session collaborator.

use thiserror::Error;

/// Default REST API base URL
const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

/// Default realtime socket URL
const DEFAULT_SOCKET_URL: &str = "ws://127.0.0.1:3000/socket";

/// Default GIF provider base URL
const DEFAULT_GIF_API_URL: &str = "https://gif.example.com/v1/gifs";

/// Chat core configuration.
///
/// The auth token is owned by an external session collaborator; this struct
/// only carries the issued value for the lifetime of the session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    api_url: String,
    socket_url: String,
    gif_api_url: String,
    gif_api_key: Option<String>,
    token: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        let api_url =
            std::env::var("RIPPLE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let socket_url =
            std::env::var("RIPPLE_SOCKET_URL").unwrap_or_else(|_| DEFAULT_SOCKET_URL.to_string());
        let gif_api_url =
            std::env::var("RIPPLE_GIF_API_URL").unwrap_or_else(|_| DEFAULT_GIF_API_URL.to_string());
        let gif_api_key = std::env::var("RIPPLE_GIF_API_KEY").ok();
        Self {
            api_url,
            socket_url,
            gif_api_url,
            gif_api_key,
            token: None,
        }
    }
}

impl ChatConfig {
    /// Create a new configuration with env-driven defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new ChatConfigBuilder
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }

    /// Set the session token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Get the session token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Clear the token (logout)
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Get the realtime socket URL
    pub fn socket_url(&self) -> &str {
        &self.socket_url
    }

    /// Get the full URL for a GIF provider endpoint
    pub fn gif_url(&self, path: &str) -> String {
        format!("{}{}", self.gif_api_url, path)
    }

    /// Get the GIF provider API key
    pub fn gif_api_key(&self) -> Option<&str> {
        self.gif_api_key.as_deref()
    }
}

/// Builder for ChatConfig
#[derive(Debug, Default)]
pub struct ChatConfigBuilder {
    api_url: Option<String>,
    socket_url: Option<String>,
    gif_api_url: Option<String>,
    gif_api_key: Option<String>,
    token: Option<String>,
}

impl ChatConfigBuilder {
    /// Set the REST API base URL
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set the realtime socket URL
    pub fn socket_url(mut self, url: impl Into<String>) -> Self {
        self.socket_url = Some(url.into());
        self
    }

    /// Set the GIF provider base URL
    pub fn gif_api_url(mut self, url: impl Into<String>) -> Self {
        self.gif_api_url = Some(url.into());
        self
    }

    /// Set the GIF provider API key
    pub fn gif_api_key(mut self, key: impl Into<String>) -> Self {
        self.gif_api_key = Some(key.into());
        self
    }

    /// Set the session token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ChatConfig, ConfigError> {
        let defaults = ChatConfig::default();
        let socket_url = self.socket_url.unwrap_or(defaults.socket_url);
        if !socket_url.starts_with("ws://") && !socket_url.starts_with("wss://") {
            return Err(ConfigError::InvalidUrl(socket_url));
        }
        let api_url = self.api_url.unwrap_or(defaults.api_url);
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(api_url));
        }
        Ok(ChatConfig {
            api_url,
            socket_url,
            gif_api_url: self.gif_api_url.unwrap_or(defaults.gif_api_url),
            gif_api_key: self.gif_api_key.or(defaults.gif_api_key),
            token: self.token,
        })
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}
