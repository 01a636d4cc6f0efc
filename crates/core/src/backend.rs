//! ModelBackend trait — the abstraction over model backends.
//!
//! A backend knows how to send a composed conversation plus the visible
//! capability definitions to a model and get exactly one assistant message
//! back, optionally carrying a call request.
//!
//! Failures propagate uncaught to the engine's caller; retries, timeouts,
//! and logging belong to the implementation or the collaborator above it.

use crate::capability::CapabilityDef;
use crate::error::BackendError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One think-step request: the composed messages and what the backend may
/// request by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinkRequest {
    /// The composed conversation, oldest first
    pub messages: Vec<Message>,

    /// Capabilities the backend is allowed to request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<CapabilityDef>,
}

/// The core ModelBackend trait.
///
/// Every backend (OpenAI-compatible endpoints, local runtimes, scripted
/// test doubles) implements this trait. The engine calls `think` without
/// knowing which backend is behind it.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// A human-readable name for this backend (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Perform one request/response exchange, producing exactly one
    /// assistant message.
    async fn think(&self, request: ThinkRequest) -> Result<Message, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn think_request_serialization() {
        let req = ThinkRequest {
            messages: vec![Message::system("be brief"), Message::user("hi")],
            capabilities: vec![],
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("be brief"));
        // Empty capability list is omitted from the wire form
        assert!(!json.contains("capabilities"));
    }
}
