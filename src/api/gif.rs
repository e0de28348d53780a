//! GIF Metadata Client
//!
//! Looks up GIF metadata by provider id, for resolving GIF messages and
//! reply previews. Lookups are best-effort: any failure (network, non-2xx,
//! malformed body) yields `None`, which renders as a "no longer available"
//! placeholder downstream. Nothing here ever propagates an error.

use reqwest::Client;
use serde::Deserialize;

use crate::shared::config::ChatConfig;

/// Resolved GIF metadata
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GifInfo {
    pub id: String,
    /// Direct render URL
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Provider response envelope
#[derive(Debug, Deserialize)]
struct GifEnvelope {
    data: GifInfo,
}

/// Client for the external GIF metadata provider
#[derive(Debug, Clone)]
pub struct GifClient {
    config: ChatConfig,
    client: Client,
}

impl GifClient {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Look up a GIF by provider id. Returns `None` on any failure.
    pub async fn lookup(&self, gif_id: &str) -> Option<GifInfo> {
        let url = self.config.gif_url(&format!("/{}", gif_id));
        let mut request = self.client.get(&url);
        if let Some(key) = self.config.gif_api_key() {
            request = request.query(&[("api_key", key)]);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("[gif] lookup failed for {}: {}", gif_id, e);
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!("[gif] lookup for {} returned {}", gif_id, response.status());
            return None;
        }
        match response.json::<GifEnvelope>().await {
            Ok(envelope) => Some(envelope.data),
            Err(e) => {
                tracing::debug!("[gif] malformed response for {}: {}", gif_id, e);
                None
            }
        }
    }
}
