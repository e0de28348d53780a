//! Shared Error Types
//!
//! This module defines the error taxonomy for the chat synchronization core.
//! Nothing in this subsystem is fatal to the process: transport failures are
//! recovered by the reconnect policy, fetch failures leave local state
//! untouched, and lookup failures degrade to placeholders.
//!
//! # Error Categories
//!
//! - `TransportError` - socket connect/send failures
//! - `NotConnected` - an emit was attempted without an open connection
//! - `NotAuthenticated` - no session token is available for an API call
//! - `FetchError` - a REST collaborator call failed
//! - `SerializationError` - JSON encode/decode failures
//! - `MessageError` - message-level misuse (e.g. sending without an open thread)
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and can be safely shared across task
//! boundaries.
use thiserror::Error;

/// Errors produced by the chat synchronization core
#[derive(Debug, Error, Clone)]
pub enum ChatError {
    /// Socket-level failure (connect, handshake, send)
    #[error("transport error: {message}")]
    TransportError {
        /// Human-readable error message
        message: String,
    },

    /// An emit was attempted while the connection was down.
    ///
    /// Delivery is not queued beyond one in-flight connect attempt; the
    /// caller sees this through the optional ack channel.
    #[error("not connected")]
    NotConnected,

    /// No session token available for an authorized call
    #[error("not authenticated")]
    NotAuthenticated,

    /// A REST collaborator call failed
    #[error("fetch error ({endpoint}): {message}")]
    FetchError {
        /// The endpoint path that failed
        endpoint: String,
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Message-related misuse
    #[error("message error: {message}")]
    MessageError {
        /// Human-readable error message
        message: String,
    },
}

impl ChatError {
    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportError {
            message: message.into(),
        }
    }

    /// Create a new fetch error for the given endpoint
    pub fn fetch(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FetchError {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new message error
    pub fn message(message: impl Into<String>) -> Self {
        Self::MessageError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
