//! The typed message every agent exchange is built from (spec §4.6),
//! grounded on `llmspell-events::universal_event::UniversalEvent`.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// A single inter-agent message.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AgentMessage {
    pub id: String,
    pub msg_type: String,
    pub sender: String,
    pub recipient: String,
    pub correlation_id: String,
    pub content: Value,
    pub sent_at: DateTime<Utc>,
}

impl AgentMessage {
    /// Construct a fresh message with a new id and correlation id, stamped `now()`.
    #[must_use]
    pub fn new(msg_type: impl Into<String>, sender: impl Into<String>, recipient: impl Into<String>, content: Value) -> Self {
        Self::with_correlation(msg_type, sender, recipient, content, Uuid::new_v4().to_string())
    }

    /// Construct a message that replies within an existing correlation group
    /// (e.g. a retry, or a response to a prior request).
    #[must_use]
    pub fn with_correlation(
        msg_type: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        content: Value,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            msg_type: msg_type.into(),
            sender: sender.into(),
            recipient: recipient.into(),
            correlation_id: correlation_id.into(),
            content,
            sent_at: Utc::now(),
        }
    }
}
