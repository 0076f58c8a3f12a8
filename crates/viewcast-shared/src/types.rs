use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a video in the platform catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct VideoId(pub u64);

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a comment.
///
/// Persisted records carry a server-assigned numeric id; comments that
/// arrived over the live channel (or were rendered optimistically before
/// the create response) carry a client-generated UUID. The two spaces are
/// never implicitly equated: a provisional entry is only promoted to a
/// server id when the create response for that exact entry arrives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum CommentId {
    /// Server-assigned id of a persisted comment.
    Server(i64),
    /// Client-generated id of a live-pushed or provisional comment.
    Local(Uuid),
}

impl CommentId {
    /// Mint a fresh client-side id.
    pub fn new_local() -> Self {
        Self::Local(Uuid::new_v4())
    }

    /// `true` for comments that have a persisted server record.
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Server(_))
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Server(id) => write!(f, "{id}"),
            Self::Local(id) => write!(f, "local:{id}"),
        }
    }
}

/// Bearer credential for the REST API (`Authorization: Token <...>`).
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Token {}", self.0)
    }
}

// Tokens must not leak into logs.
impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthToken([redacted])")
    }
}

/// Who is acting.
///
/// Passed explicitly into every session instead of being read from some
/// ambient credential store at call time.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Display name, also the author attached to outbound pushes.
    pub username: String,
    /// Bearer credential for authenticated REST calls.
    pub token: AuthToken,
}

impl Identity {
    pub fn new(username: impl Into<String>, token: AuthToken) -> Self {
        Self { username: username.into(), token }
    }
}

/// Lifecycle of the live channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Dialing the WebSocket endpoint (initial connect or reconnect).
    Connecting,
    /// Connected; pushes flow and publishes are delivered.
    Open,
    /// Explicitly torn down. Terminal.
    Closed,
    /// Reconnect attempts exhausted. Terminal.
    Errored,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_id_untagged_serde() {
        // Server ids travel as bare numbers, matching the REST payloads.
        let id: CommentId = serde_json::from_str("42").unwrap();
        assert_eq!(id, CommentId::Server(42));
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
    }

    #[test]
    fn test_local_ids_are_unique() {
        assert_ne!(CommentId::new_local(), CommentId::new_local());
        assert!(!CommentId::new_local().is_persisted());
    }

    #[test]
    fn test_auth_token_debug_redacted() {
        let token = AuthToken::new("super-secret");
        assert!(!format!("{token:?}").contains("super-secret"));
        assert_eq!(token.header_value(), "Token super-secret");
    }
}
