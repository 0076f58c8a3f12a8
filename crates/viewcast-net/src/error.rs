use thiserror::Error;

/// Errors surfaced when setting up the live channel.
///
/// Transport failures after the task is running never surface as errors;
/// they drive the reconnect supervisor and are reported through
/// [`LiveNotification::StateChanged`](crate::LiveNotification).
#[derive(Error, Debug)]
pub enum LiveError {
    #[error("Invalid live channel URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Live channel URL '{url}' must use a ws:// or wss:// scheme")]
    NotWebSocket { url: String },
}
