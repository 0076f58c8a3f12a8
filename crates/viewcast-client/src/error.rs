use thiserror::Error;

/// Errors from the REST API client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, TLS, ...).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status. `message` comes from
    /// the `{"error": ...}` payload when one is present.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The request was rejected locally before anything was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Local file access failed (upload source).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the comment stream handle.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Empty or whitespace-only drafts are never submitted: no channel
    /// emission, no persistence call.
    #[error("Comment text must not be empty")]
    EmptyDraft,

    /// The session task has been closed.
    #[error("Comment stream session is closed")]
    SessionClosed,

    /// The live channel could not be set up.
    #[error(transparent)]
    Live(#[from] viewcast_net::LiveError),
}
