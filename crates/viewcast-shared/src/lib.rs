//! # viewcast-shared
//!
//! Domain models and wire protocol shared between the viewcast crates:
//! comment and video records, typed identifiers, the live channel message
//! format, and the shared error types.

pub mod constants;
pub mod error;
pub mod models;
pub mod protocol;
pub mod types;

pub use error::WireError;
pub use models::{AuthSession, Comment, VideoRecord, VideoSummary};
pub use protocol::{CommentPush, LiveMessage};
pub use types::{AuthToken, CommentId, ConnectionState, Identity, VideoId};
