//! # viewcast-net
//!
//! The live comment channel: a supervised WebSocket connection run in a
//! dedicated tokio task. External code communicates with it through typed
//! command and notification channels, keeping the networking layer fully
//! asynchronous and decoupled from session state.

pub mod backoff;
pub mod error;
pub mod live;

pub use backoff::Backoff;
pub use error::LiveError;
pub use live::{spawn_live_channel, LiveCommand, LiveConfig, LiveNotification};
