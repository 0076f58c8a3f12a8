//! Events emitted by a comment stream session.

use viewcast_shared::models::Comment;
use viewcast_shared::types::{CommentId, ConnectionState, VideoId};

/// What happened inside a [`CommentStream`](crate::CommentStream).
///
/// Consumers (a UI layer, a bot, a test) receive these over an mpsc
/// channel. Failures arrive as [`Error`](Self::Error) with a
/// user-presentable message; they are never fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentStreamEvent {
    /// The history fetch resolved and was merged in front of any pushes
    /// that arrived earlier.
    HistoryLoaded { video_id: VideoId, count: usize },

    /// A comment was appended: a live push, an optimistic entry made at
    /// submit time, or a create response with no provisional entry to
    /// replace.
    CommentAdded(Comment),

    /// The create response arrived and the provisional entry keyed by
    /// `local_id` was replaced in place by the persisted record.
    CommentConfirmed { local_id: CommentId, comment: Comment },

    /// A delete succeeded and the entry was removed.
    CommentDeleted(CommentId),

    /// The live channel changed state.
    ConnectionChanged(ConnectionState),

    /// A failure, already reduced to a user-visible message.
    Error(String),
}
