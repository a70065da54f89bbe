use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::migration::{CURRENT_VERSION, LEGACY_VERSION};
use super::short_id;
use crate::providers::Message as ApiMessage;

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the user
    User,
    /// Response returned by the remote model
    Assistant,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single stored turn
///
/// Assistant content is always the clean form: inline `[N]` markers may
/// remain, a rendered reference block never does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    /// Who produced the turn
    pub role: Role,
    /// Turn text
    pub content: String,
    /// When the turn was appended
    pub timestamp: DateTime<Utc>,
}

/// Metadata captured when a conversation starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Model used for the first turn
    pub model: String,
    /// Raw text of the first user turn
    pub initial_query: String,
    /// Creation instant, never changes
    pub created_at: DateTime<Utc>,
    /// Bumped on every append
    pub updated_at: DateTime<Utc>,
}

/// A persisted conversation
///
/// Serialized as one JSON object per file, keyed by `id`. Turns are only
/// ever appended through [`Conversation::add_message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Schema version of the persisted record
    #[serde(default = "legacy_version")]
    pub version: u32,
    /// Canonical identifier, `YYYYMMDD-HHMMSS.mmm` of the creation instant
    pub id: String,
    /// Compact base-62 display identifier
    #[serde(rename = "shortId", alias = "short_id", default)]
    pub short_id: String,
    /// Turns in conversation order
    #[serde(default)]
    pub messages: Vec<SessionMessage>,
    /// Creation metadata
    pub metadata: SessionMetadata,
}

fn legacy_version() -> u32 {
    LEGACY_VERSION
}

/// Listing projection of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Canonical identifier
    pub id: String,
    /// Short identifier
    pub short_id: String,
    /// Creation instant
    pub created_at: DateTime<Utc>,
    /// First user turn
    pub initial_query: String,
    /// Number of stored turns
    pub message_count: usize,
}

/// Format the canonical id for an instant (millisecond precision, local time)
///
/// # Examples
///
/// ```
/// use chrono::{Local, TimeZone};
/// use pplx::storage::generate_session_id;
///
/// let t = Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap();
/// assert_eq!(generate_session_id(t.into()), "20240115-103045.000");
/// ```
pub fn generate_session_id(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y%m%d-%H%M%S%.3f")
        .to_string()
}

impl Conversation {
    /// Create a conversation stamped with the current instant
    pub fn new(model: impl Into<String>, initial_query: impl Into<String>) -> Self {
        Self::with_created_at(model, initial_query, Utc::now())
    }

    /// Create a conversation with an explicit creation instant
    pub fn with_created_at(
        model: impl Into<String>,
        initial_query: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            version: CURRENT_VERSION,
            id: generate_session_id(created_at),
            short_id: short_id::encode(created_at.timestamp_millis()),
            messages: Vec::new(),
            metadata: SessionMetadata {
                model: model.into(),
                initial_query: initial_query.into(),
                created_at,
                updated_at: created_at,
            },
        }
    }

    /// Append a turn and bump `updated_at`
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        let now = Utc::now();
        self.messages.push(SessionMessage {
            role,
            content: content.into(),
            timestamp: now,
        });
        self.metadata.updated_at = now.max(self.metadata.created_at);
    }

    /// The last `n` turns in original order
    pub fn last_messages(&self, n: usize) -> &[SessionMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Project to a listing summary
    pub fn to_summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            short_id: self.short_id.clone(),
            created_at: self.metadata.created_at,
            initial_query: self.metadata.initial_query.clone(),
            message_count: self.messages.len(),
        }
    }

    /// All turns as wire messages, content unchanged
    pub fn to_api_messages(&self) -> Vec<ApiMessage> {
        self.messages
            .iter()
            .map(|m| ApiMessage::new(m.role.as_str(), m.content.clone()))
            .collect()
    }
}
