//! Live channel wire protocol.
//!
//! The platform broadcasts newly posted comments over a per-video
//! WebSocket endpoint. Frames are JSON objects tagged by a `type` field;
//! the same shape is used inbound and outbound.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WireError;

/// All messages exchanged over the live channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LiveMessage {
    /// A comment notification: someone posted on the video this channel
    /// is scoped to.
    Comment(CommentPush),
}

/// Payload of a comment notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentPush {
    /// Display name of the commenter.
    pub user: String,
    /// Comment body.
    pub text: String,
    /// RFC 3339 timestamp. Kept as a string on the wire: the server
    /// forwards this field verbatim, so it may be empty or malformed.
    #[serde(default)]
    pub timestamp: String,
}

impl CommentPush {
    pub fn new(user: impl Into<String>, text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
            timestamp: at.to_rfc3339(),
        }
    }

    /// Parse the wire timestamp, falling back to `fallback` when the
    /// field is empty or unparseable.
    pub fn timestamp_or(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(fallback)
    }
}

impl LiveMessage {
    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(WireError::from)
    }

    /// Deserialize from a JSON text frame. Frames with an unknown `type`
    /// (or a malformed body) surface as an error the caller can ignore.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        serde_json::from_str(text).map_err(WireError::from)
    }
}
