//! Persistent conversation records and user profiles.
//!
//! A `ConversationRecord` is one append-only row of the channel log:
//! everything the agent saw or said, keyed by (protocol, channel,
//! timestamp). A `UserProfile` is the last-write-wins description of one
//! person the agent has met.

use crate::message::Role;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Moderation status attached to a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Moderation {
    /// Not yet reviewed
    #[default]
    Unknown,
    /// Reviewed and allowed
    Approved,
    /// Reviewed and blocked
    Banned,
}

impl Moderation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Moderation::Unknown => "unknown",
            Moderation::Approved => "approved",
            Moderation::Banned => "banned",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "approved" => Moderation::Approved,
            "banned" => Moderation::Banned,
            _ => Moderation::Unknown,
        }
    }
}

/// One row of the append-only channel log. Never mutated after append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Chat protocol the record came from (e.g., "discord", "nostr", "console")
    pub protocol: String,

    /// Platform channel identifier
    pub channel: String,

    /// Platform user identifier of the author
    pub uid: String,

    /// Author display name
    pub author: String,

    /// Who spoke
    pub role: Role,

    /// The text content
    pub content: String,

    /// Milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Moderation status
    #[serde(default)]
    pub moderation: Moderation,
}

impl ConversationRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        protocol: impl Into<String>,
        channel: impl Into<String>,
        uid: impl Into<String>,
        author: impl Into<String>,
        role: Role,
        content: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            channel: channel.into(),
            uid: uid.into(),
            author: author.into(),
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
            moderation: Moderation::Unknown,
        }
    }

    /// Override the timestamp (useful for imports and tests).
    pub fn at(mut self, timestamp_ms: i64) -> Self {
        self.timestamp = timestamp_ms;
        self
    }
}

/// Last-write-wins description of a user, keyed by (protocol, uid).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Chat protocol the profile belongs to
    pub protocol: String,

    /// Platform user identifier
    pub uid: String,

    /// Free-text description of the user
    pub description: String,

    /// Display name, indexed lower-cased for approximate lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl UserProfile {
    pub fn new(
        protocol: impl Into<String>,
        uid: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            uid: uid.into(),
            description: description.into(),
            display_name: None,
        }
    }

    /// Attach a display name for the secondary index.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_stamped() {
        let rec = ConversationRecord::new("discord", "20", "7", "telamohn", Role::User, "hi");
        assert!(rec.timestamp > 0);
        assert_eq!(rec.moderation, Moderation::Unknown);
    }

    #[test]
    fn record_timestamp_override() {
        let rec =
            ConversationRecord::new("discord", "20", "7", "telamohn", Role::User, "hi").at(42);
        assert_eq!(rec.timestamp, 42);
    }

    #[test]
    fn moderation_parse_roundtrip() {
        for m in [Moderation::Unknown, Moderation::Approved, Moderation::Banned] {
            assert_eq!(Moderation::parse(m.as_str()), m);
        }
        assert_eq!(Moderation::parse("garbage"), Moderation::Unknown);
    }

    #[test]
    fn profile_builder() {
        let p = UserProfile::new("discord", "42", "likes tea").named("Amy");
        assert_eq!(p.display_name.as_deref(), Some("Amy"));
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("likes tea"));
    }
}
