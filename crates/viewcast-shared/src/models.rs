//! Domain model structs exchanged with the platform API.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a UI layer or logged as structured data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::CommentPush;
use crate::types::{CommentId, VideoId};

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A single comment on a video.
///
/// Comments come from three places: the history fetch (persisted records
/// with server ids), live channel pushes, and optimistic local entries
/// created at submit time. Insertion order is display order, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    /// Display name of the commenter.
    pub user: String,
    pub text: String,
    /// Used only for relative-time display.
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Build a locally-identified comment from a live push. The wire
    /// timestamp wins when it parses; `received_at` otherwise.
    pub fn from_push(push: &CommentPush, received_at: DateTime<Utc>) -> Self {
        Self {
            id: CommentId::new_local(),
            user: push.user.clone(),
            text: push.text.clone(),
            created_at: push.timestamp_or(received_at),
        }
    }

    /// Build the provisional entry rendered optimistically at submit time.
    pub fn provisional(user: impl Into<String>, text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: CommentId::new_local(),
            user: user.into(),
            text: text.into(),
            created_at: at,
        }
    }
}

/// Human-readable age of a comment, bucketed the way the platform UI
/// renders it: "just now", minutes, hours, then the calendar date.
pub fn relative_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - created_at).num_seconds();
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        format!("{} minutes ago", secs / 60)
    } else if secs < 86_400 {
        format!("{} hours ago", secs / 3600)
    } else {
        created_at.format("%Y-%m-%d").to_string()
    }
}

// ---------------------------------------------------------------------------
// Video catalog
// ---------------------------------------------------------------------------

/// A catalog entry returned by the video listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoSummary {
    pub id: VideoId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Thumbnail path relative to the media host.
    #[serde(default)]
    pub thumbnail: String,
    /// Pre-formatted duration string, e.g. `"5:30"`.
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub views: u64,
}

/// The record returned when a video upload is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoRecord {
    pub id: VideoId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Server-side storage path of the uploaded file.
    pub file_path: String,
    pub uploaded_by: String,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Response of the login / register endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub token: String,
}

impl AuthSession {
    /// Convert into the explicit identity handed to sessions.
    pub fn into_identity(self) -> crate::types::Identity {
        crate::types::Identity::new(self.username, crate::types::AuthToken::new(self.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_comment_deserializes_from_rest_record() {
        let json = r#"{"id": 1, "user": "user1", "text": "Great video!", "timestamp": "2025-10-17T10:30:00Z"}"#;
        let comment: Comment = serde_json::from_str(json).unwrap();
        assert_eq!(comment.id, CommentId::Server(1));
        assert_eq!(comment.user, "user1");
        assert_eq!(comment.text, "Great video!");
    }

    #[test]
    fn test_from_push_prefers_wire_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 10, 17, 10, 30, 0).unwrap();
        let push = CommentPush::new("bob", "yo", at);
        let comment = Comment::from_push(&push, Utc::now());
        assert_eq!(comment.created_at, at);
        assert!(!comment.id.is_persisted());
    }

    #[test]
    fn test_relative_age_buckets() {
        let now = Utc.with_ymd_and_hms(2025, 10, 17, 12, 0, 0).unwrap();
        let case = |secs: i64| relative_age(now - chrono::Duration::seconds(secs), now);

        assert_eq!(case(5), "just now");
        assert_eq!(case(59), "just now");
        assert_eq!(case(60), "1 minutes ago");
        assert_eq!(case(150), "2 minutes ago");
        assert_eq!(case(7200), "2 hours ago");
        assert_eq!(case(2 * 86_400), "2025-10-15");
    }

    #[test]
    fn test_auth_session_into_identity() {
        let session: AuthSession = serde_json::from_str(
            r#"{"user_id": 7, "username": "alice", "token": "tok123"}"#,
        )
        .unwrap();
        let identity = session.into_identity();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.token.as_str(), "tok123");
    }

    #[test]
    fn test_video_summary_tolerates_sparse_records() {
        let v: VideoSummary = serde_json::from_str(r#"{"id": 3, "title": "t"}"#).unwrap();
        assert_eq!(v.id, VideoId(3));
        assert_eq!(v.views, 0);
    }
}
