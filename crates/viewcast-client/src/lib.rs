//! # viewcast-client
//!
//! Async client for the viewcast video streaming platform.
//!
//! This crate provides:
//! - **[`ApiClient`]** — thin REST client: auth, video catalog, streamed
//!   upload with progress reporting, and comment persistence
//! - **[`CommentStream`]** — a live comment session for one video: merges
//!   the REST-fetched history with WebSocket pushes, submits comments
//!   optimistically over both channels, and supervises the live
//!   connection through reconnects
//!
//! Credentials are passed in explicitly as an [`Identity`]; nothing is
//! read from ambient global state.
//!
//! [`Identity`]: viewcast_shared::Identity

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod stream;

pub use api::{ApiClient, UploadProgress, UploadRequest};
pub use config::ClientConfig;
pub use error::{ApiError, StreamError};
pub use events::CommentStreamEvent;
pub use stream::{CommentStream, CommentStreamHandle};
